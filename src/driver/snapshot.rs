//! Read-only driver over a saved HTML page.
//!
//! Lets the collection half of the pipeline run against a results page that
//! was saved from a browser after every result was loaded. Lookups use the
//! same CSS selectors as the live driver; `src` and `href` resolve against the
//! page's original URL the way a browser resolves them.
//!
//! A snapshot never re-renders, so handles never go stale. Interactions that
//! need a live page (navigation, clicks, typing) fail with
//! [`DriverError::Unsupported`].

use super::{DriverError, DriverResult, Element, Page};
use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use std::path::Path;
use std::rc::Rc;
use tracing::info;
use url::Url;

fn parse_selector(selector: &str) -> DriverResult<Selector> {
    Selector::parse(selector)
        .map_err(|e| DriverError::Browser(format!("invalid selector '{selector}': {e}")))
}

/// Whitespace-collapsed text content, like a browser's rendered text.
fn rendered_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone)]
pub struct SnapshotPage {
    document: Rc<Html>,
    base: Rc<Url>,
}

impl SnapshotPage {
    pub fn parse(html: &str, base_url: &str) -> Result<Self, Box<dyn Error>> {
        let base = Url::parse(base_url)?;
        Ok(SnapshotPage {
            document: Rc::new(Html::parse_document(html)),
            base: Rc::new(base),
        })
    }

    pub async fn load(path: &Path, base_url: &str) -> Result<Self, Box<dyn Error>> {
        let html = tokio::fs::read_to_string(path).await?;
        info!(path = %path.display(), bytes = html.len(), "Loaded page snapshot");
        Self::parse(&html, base_url)
    }

    fn wrap(&self, element: ElementRef<'_>) -> SnapshotElement {
        SnapshotElement {
            document: Rc::clone(&self.document),
            base: Rc::clone(&self.base),
            node: element.id(),
        }
    }
}

impl Page for SnapshotPage {
    type Element = SnapshotElement;

    async fn goto(&self, _url: &str) -> DriverResult<()> {
        Err(DriverError::Unsupported { operation: "goto" })
    }

    async fn find_element(&self, selector: &str) -> DriverResult<SnapshotElement> {
        let parsed = parse_selector(selector)?;
        self.document
            .select(&parsed)
            .next()
            .map(|element| self.wrap(element))
            .ok_or_else(|| DriverError::not_found(selector))
    }

    async fn find_elements(&self, selector: &str) -> DriverResult<Vec<SnapshotElement>> {
        let parsed = parse_selector(selector)?;
        Ok(self
            .document
            .select(&parsed)
            .map(|element| self.wrap(element))
            .collect())
    }

    async fn is_visible(&self, selector: &str) -> DriverResult<bool> {
        self.contains_element(selector).await
    }

    async fn contains_text(&self, text: &str) -> DriverResult<bool> {
        let needle = text.to_lowercase();
        Ok(rendered_text(self.document.root_element())
            .to_lowercase()
            .contains(&needle))
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotElement {
    document: Rc<Html>,
    base: Rc<Url>,
    node: NodeId,
}

impl SnapshotElement {
    fn element(&self) -> DriverResult<ElementRef<'_>> {
        self.document
            .tree
            .get(self.node)
            .and_then(ElementRef::wrap)
            .ok_or(DriverError::StaleReference)
    }

    fn child(&self, element: ElementRef<'_>) -> SnapshotElement {
        SnapshotElement {
            document: Rc::clone(&self.document),
            base: Rc::clone(&self.base),
            node: element.id(),
        }
    }
}

impl Element for SnapshotElement {
    async fn find_element(&self, selector: &str) -> DriverResult<SnapshotElement> {
        let parsed = parse_selector(selector)?;
        self.element()?
            .select(&parsed)
            .next()
            .map(|element| self.child(element))
            .ok_or_else(|| DriverError::not_found(selector))
    }

    async fn find_elements(&self, selector: &str) -> DriverResult<Vec<SnapshotElement>> {
        let parsed = parse_selector(selector)?;
        Ok(self
            .element()?
            .select(&parsed)
            .map(|element| self.child(element))
            .collect())
    }

    async fn text(&self) -> DriverResult<String> {
        Ok(rendered_text(self.element()?))
    }

    /// URL-valued properties come back absolute, everything else verbatim.
    async fn property(&self, name: &str) -> DriverResult<Option<String>> {
        let Some(raw) = self.element()?.value().attr(name) else {
            return Ok(None);
        };
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        if matches!(name, "src" | "href") {
            return Ok(self.base.join(raw).ok().map(String::from));
        }
        Ok(Some(raw.to_string()))
    }

    async fn scroll_into_view(&self) -> DriverResult<()> {
        Ok(())
    }

    async fn click(&self) -> DriverResult<()> {
        Err(DriverError::Unsupported { operation: "click" })
    }

    async fn type_text(&self, _text: &str) -> DriverResult<()> {
        Err(DriverError::Unsupported {
            operation: "type_text",
        })
    }

    async fn is_attached(&self) -> DriverResult<bool> {
        self.element().map(|_| true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::{CollectOptions, collect_articles};
    use crate::extract::extract_article;
    use crate::scrapers::nyt::{ITEM_SELECTORS, RESULT_ITEMS, SHOW_MORE};
    use std::time::Duration;

    const BASE: &str = "https://www.nytimes.com/search?query=brazil";

    fn result(slug: &str, title: &str, summary: &str) -> String {
        format!(
            r#"<li data-testid="search-bodega-result">
                <div>
                  <span data-testid="todays-date">Oct. 3</span>
                  <div>
                    <a href="/2026/10/03/world/{slug}.html?searchResultPosition=1">
                      <p>World</p>
                      <h4>{title}</h4>
                      <p>{summary}</p>
                      <p>By A Reporter</p>
                    </a>
                  </div>
                  <figure>
                    <img src="https://static01.nyt.com/images/2026/10/03/{slug}-mediumSquareAt3X.jpg?quality=75&amp;auto=webp" alt="">
                  </figure>
                </div>
              </li>"#
        )
    }

    fn results_page(items: &[String]) -> String {
        format!(
            r#"<!DOCTYPE html><html><body>
                <p>Showing {count} results for:</p>
                <ol data-testid="search-results">{items}</ol>
              </body></html>"#,
            count = items.len(),
            items = items.join("\n")
        )
    }

    #[tokio::test]
    async fn test_extracts_saved_result_item() {
        let html = results_page(&[result(
            "brazil-election",
            "Brazil   Heads to\n the Polls",
            "Voters in Brazil weigh $2 billion in promises.",
        )]);
        let page = SnapshotPage::parse(&html, BASE).unwrap();

        let item = page.find_element(RESULT_ITEMS).await.unwrap();
        let record = extract_article(&item, "brazil", &ITEM_SELECTORS).await.unwrap();

        assert_eq!(record.date, "Oct. 3");
        assert_eq!(record.title, "Brazil Heads to the Polls");
        assert_eq!(record.description, "Voters in Brazil weigh $2 billion in promises.");
        assert_eq!(
            record.url,
            "https://www.nytimes.com/2026/10/03/world/brazil-election.html"
        );
        assert_eq!(
            record.picture_ref,
            "https://static01.nyt.com/images/2026/10/03/brazil-election-mediumSquareAt3X.jpg"
        );
        assert_eq!(record.phrase_occurrences, 2);
        assert!(record.has_money_mention);
    }

    #[tokio::test]
    async fn test_collects_saved_results_page() {
        let html = results_page(&[
            result("one", "First", "Nothing here"),
            result("two", "Second", "Nor here"),
            result("one", "First again", "Same link as the first"),
        ]);
        let page = SnapshotPage::parse(&html, BASE).unwrap();
        let options = CollectOptions {
            item_timeout: Duration::from_millis(100),
            completeness_sweep: true,
        };

        let (set, report) = collect_articles(&page, &ITEM_SELECTORS, "first", &options)
            .await
            .unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.resnapshots, 0);
        assert_eq!(set.records()[0].title, "First");
        assert_eq!(set.records()[1].title, "Second");
    }

    #[tokio::test]
    async fn test_presence_and_text_checks() {
        let page = SnapshotPage::parse(&results_page(&[]), BASE).unwrap();
        assert!(!page.is_visible(SHOW_MORE).await.unwrap());
        assert!(page.contains_text("showing 0 results").await.unwrap());
    }

    #[tokio::test]
    async fn test_interactions_are_unsupported() {
        let html = results_page(&[result("one", "First", "Nothing")]);
        let page = SnapshotPage::parse(&html, BASE).unwrap();
        assert!(matches!(
            page.goto("https://example.com").await,
            Err(DriverError::Unsupported { .. })
        ));
        let item = page.find_element(RESULT_ITEMS).await.unwrap();
        assert!(matches!(
            item.click().await,
            Err(DriverError::Unsupported { .. })
        ));
        assert!(item.is_attached().await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_attribute_is_none() {
        let page = SnapshotPage::parse(&results_page(&[result("one", "First", "x")]), BASE).unwrap();
        let heading = page.find_element("h4").await.unwrap();
        assert_eq!(heading.property("href").await.unwrap(), None);
    }
}
