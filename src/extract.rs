//! Field extraction for a single rendered search result.
//!
//! A result item is a small subtree: a date label, a heading, two or more
//! paragraphs (section tag first, summary second), an image and a link.
//! [`extract_article`] reads all of them through the [`Element`] capability
//! and derives the two signals stored on every record:
//!
//! - how often the search phrase occurs in title and description
//! - whether either of them mentions an amount of money
//!
//! Nothing is built until every read has succeeded, so an item that goes
//! stale halfway through never produces a partial record.

use crate::driver::{DriverError, DriverResult, Element};
use crate::models::ArticleRecord;
use crate::utils::strip_query;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{instrument, trace};

/// A `$` amount (`$5`, `$1,200.50`) or an integer followed by a currency word.
static MONEY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\$(?:[1-9]\d{0,2}(?:,\d{3})*|[1-9]\d*|0)(?:\.\d{2})?|\d+\s+(?:dollars|usd|dollar)\b",
    )
    .expect("currency pattern compiles")
});

/// CSS selectors locating a result list and the parts of one result item.
#[derive(Debug, Clone, Copy)]
pub struct ItemSelectors {
    /// Every result item on the page.
    pub item: &'static str,
    pub date: &'static str,
    pub title: &'static str,
    /// Paragraph blocks; the second one is the description.
    pub paragraph: &'static str,
    pub image: &'static str,
    pub link: &'static str,
}

/// Non-overlapping, case-insensitive occurrences of `phrase` in `text`.
///
/// An empty phrase counts as zero occurrences.
pub fn count_phrase(text: &str, phrase: &str) -> usize {
    if phrase.is_empty() {
        return 0;
    }
    text.to_lowercase().matches(&phrase.to_lowercase()).count()
}

/// Does `text` mention an amount of money?
///
/// # Arguments
///
/// * `text` - Title or description of a result item
///
/// # Returns
///
/// `true` for a dollar amount such as `$5` or `$1,200.50`, or for an integer
/// followed by `dollars`, `dollar` or `USD` (any case).
pub fn mentions_money(text: &str) -> bool {
    MONEY_PATTERN.is_match(text)
}

/// Read one result item into an [`ArticleRecord`].
///
/// # Errors
///
/// - [`DriverError::NotFound`] / [`DriverError::MissingProperty`] when a part of
///   the item is absent
/// - [`DriverError::StaleReference`] when the item was re-rendered while being read
#[instrument(level = "debug", skip_all)]
pub async fn extract_article<E: Element>(
    item: &E,
    search_phrase: &str,
    selectors: &ItemSelectors,
) -> DriverResult<ArticleRecord> {
    let date = item.find_element(selectors.date).await?.text().await?;
    let title = item.find_element(selectors.title).await?.text().await?;

    let paragraphs = item.find_elements(selectors.paragraph).await?;
    let description = match paragraphs.get(1) {
        Some(paragraph) => paragraph.text().await?,
        None => {
            return Err(DriverError::NotFound {
                selector: format!("{} (second match)", selectors.paragraph),
            });
        }
    };

    let picture_url = required_property(item, selectors.image, "src").await?;
    let url = required_property(item, selectors.link, "href").await?;

    let phrase_occurrences =
        count_phrase(&title, search_phrase) + count_phrase(&description, search_phrase);
    let has_money_mention = mentions_money(&title) || mentions_money(&description);
    trace!(%url, phrase_occurrences, has_money_mention, "Extracted result item");

    Ok(ArticleRecord {
        date,
        title,
        description,
        picture_ref: strip_query(&picture_url).to_string(),
        url: strip_query(&url).to_string(),
        phrase_occurrences,
        has_money_mention,
    })
}

async fn required_property<E: Element>(
    item: &E,
    selector: &str,
    property: &str,
) -> DriverResult<String> {
    item.find_element(selector)
        .await?
        .property(property)
        .await?
        .ok_or_else(|| DriverError::MissingProperty {
            property: property.to_string(),
        })
}
