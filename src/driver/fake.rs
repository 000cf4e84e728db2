//! Scripted in-memory page for tests.
//!
//! Understands the news site's selectors and models the behaviours the
//! pipeline has to survive: result items that go stale when the list
//! re-renders, a "show more" control whose clicks load items, get
//! intercepted or find the control gone, and a section dropdown.

use super::{DriverError, DriverResult, Element, Page};
use crate::scrapers::nyt;
use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct FakeItem {
    pub date: String,
    pub title: String,
    pub paragraphs: Vec<String>,
    pub image: Option<String>,
    pub link: Option<String>,
}

impl FakeItem {
    pub fn article(title: &str, link: &str) -> Self {
        let slug = link.trim_end_matches('/').rsplit('/').next().unwrap_or("item");
        FakeItem {
            date: "Oct. 3".to_string(),
            title: title.to_string(),
            paragraphs: vec!["World".to_string(), format!("About {title}")],
            image: Some(format!("https://static.x.test/images/{slug}.jpg?quality=75")),
            link: Some(link.to_string()),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.paragraphs = vec!["World".to_string(), description.to_string()];
        self
    }

    pub fn with_paragraphs(mut self, paragraphs: &[&str]) -> Self {
        self.paragraphs = paragraphs.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_image(mut self, src: &str) -> Self {
        self.image = Some(src.to_string());
        self
    }

    pub fn without_image(mut self) -> Self {
        self.image = None;
        self
    }

    pub fn without_link(mut self) -> Self {
        self.link = None;
        self
    }
}

/// Outcome of one click on the "show more" control.
#[derive(Debug, Clone)]
pub enum ShowMore {
    Loads(Vec<FakeItem>),
    Intercepted,
    /// The control re-rendered between lookup and click.
    Stale,
    Vanishes,
}

#[derive(Debug, Default)]
struct State {
    items: Vec<FakeItem>,
    generation: u64,
    stale_on_title: HashSet<usize>,
    prepend_on_rerender: Option<FakeItem>,
    show_more: VecDeque<ShowMore>,
    snapshots: usize,
    failing_resnapshots: usize,
    page_text: String,
    labels: Vec<String>,
    hidden: HashSet<String>,
    visited: Vec<String>,
    clicked: Vec<String>,
    typed: Vec<(String, String)>,
}

impl State {
    fn rerender(&mut self) {
        self.generation += 1;
        if let Some(item) = self.prepend_on_rerender.take() {
            self.items.insert(0, item);
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Part {
    Date,
    Title,
    Paragraph(usize),
    Image,
    Link,
}

#[derive(Debug, Clone)]
enum Target {
    Item(usize),
    Part(usize, Part),
    ShowMore,
    Label(usize),
    Control(String),
}

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    state: Rc<RefCell<State>>,
}

pub struct FakeElement {
    state: Rc<RefCell<State>>,
    target: Target,
    generation: u64,
}

impl FakePage {
    pub fn with_items(items: Vec<FakeItem>) -> Self {
        let page = FakePage::default();
        {
            let mut state = page.state.borrow_mut();
            state.items = items;
            state.hidden.insert(nyt::COOKIE_ACCEPT.to_string());
            state.hidden.insert(nyt::RESPONSE_SNACKBAR.to_string());
        }
        page
    }

    pub fn with_page_text(self, text: &str) -> Self {
        self.state.borrow_mut().page_text = text.to_string();
        self
    }

    pub fn with_section_labels(self, labels: &[&str]) -> Self {
        self.state.borrow_mut().labels = labels.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn script_show_more(&self, outcomes: Vec<ShowMore>) {
        self.state.borrow_mut().show_more = outcomes.into();
    }

    /// Re-render the page the next time item `index`'s title is read.
    pub fn invalidate_when_title_read(&self, index: usize) {
        self.state.borrow_mut().stale_on_title.insert(index);
    }

    /// Insert `item` at the top of the list on the next re-render.
    pub fn on_rerender_prepend(&self, item: FakeItem) {
        self.state.borrow_mut().prepend_on_rerender = Some(item);
    }

    pub fn rerender(&self) {
        self.state.borrow_mut().rerender();
    }

    /// Make the next `n` re-reads of the result list (after the first read) fail as stale.
    pub fn fail_resnapshots(&self, n: usize) {
        self.state.borrow_mut().failing_resnapshots = n;
    }

    /// How many times the result list was read.
    pub fn snapshots(&self) -> usize {
        self.state.borrow().snapshots
    }

    pub fn visited(&self) -> Vec<String> {
        self.state.borrow().visited.clone()
    }

    pub fn clicked(&self) -> Vec<String> {
        self.state.borrow().clicked.clone()
    }

    pub fn typed(&self) -> Vec<(String, String)> {
        self.state.borrow().typed.clone()
    }

    fn element(&self, target: Target) -> FakeElement {
        FakeElement {
            state: Rc::clone(&self.state),
            generation: self.state.borrow().generation,
            target,
        }
    }
}

impl Page for FakePage {
    type Element = FakeElement;

    async fn goto(&self, url: &str) -> DriverResult<()> {
        self.state.borrow_mut().visited.push(url.to_string());
        Ok(())
    }

    async fn find_element(&self, selector: &str) -> DriverResult<FakeElement> {
        if selector == nyt::SHOW_MORE {
            let mut state = self.state.borrow_mut();
            if matches!(state.show_more.front(), Some(ShowMore::Vanishes)) {
                state.show_more.pop_front();
                return Err(DriverError::not_found(selector));
            }
        }
        self.find_elements(selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::not_found(selector))
    }

    async fn find_elements(&self, selector: &str) -> DriverResult<Vec<FakeElement>> {
        let targets = {
            let mut state = self.state.borrow_mut();
            if selector == nyt::RESULT_ITEMS {
                state.snapshots += 1;
                if state.snapshots > 1 && state.failing_resnapshots > 0 {
                    state.failing_resnapshots -= 1;
                    return Err(DriverError::StaleReference);
                }
                (0..state.items.len()).map(Target::Item).collect()
            } else if selector == nyt::SHOW_MORE {
                if state.show_more.is_empty() {
                    vec![]
                } else {
                    vec![Target::ShowMore]
                }
            } else if selector == nyt::SECTION_LABELS {
                (0..state.labels.len()).map(Target::Label).collect()
            } else {
                vec![Target::Control(selector.to_string())]
            }
        };
        Ok(targets.into_iter().map(|t| self.element(t)).collect())
    }

    async fn is_visible(&self, selector: &str) -> DriverResult<bool> {
        Ok(!self.state.borrow().hidden.contains(selector))
    }

    async fn contains_text(&self, text: &str) -> DriverResult<bool> {
        let state = self.state.borrow();
        Ok(state.page_text.to_lowercase().contains(&text.to_lowercase()))
    }
}

impl FakeElement {
    fn check_live(&self) -> DriverResult<()> {
        match self.target {
            Target::Item(_) | Target::Part(..)
                if self.generation != self.state.borrow().generation =>
            {
                Err(DriverError::StaleReference)
            }
            _ => Ok(()),
        }
    }

    fn child(&self, target: Target) -> FakeElement {
        FakeElement {
            state: Rc::clone(&self.state),
            target,
            generation: self.generation,
        }
    }

    fn item(&self, index: usize) -> DriverResult<FakeItem> {
        self.state
            .borrow()
            .items
            .get(index)
            .cloned()
            .ok_or(DriverError::StaleReference)
    }
}

impl Element for FakeElement {
    async fn find_element(&self, selector: &str) -> DriverResult<FakeElement> {
        self.find_elements(selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::not_found(selector))
    }

    async fn find_elements(&self, selector: &str) -> DriverResult<Vec<FakeElement>> {
        self.check_live()?;
        let Target::Item(index) = self.target else {
            return Ok(vec![]);
        };
        let item = self.item(index)?;
        let fields = nyt::ITEM_SELECTORS;
        let parts = if selector == fields.date {
            vec![Part::Date]
        } else if selector == fields.title {
            vec![Part::Title]
        } else if selector == fields.paragraph {
            (0..item.paragraphs.len()).map(Part::Paragraph).collect()
        } else if selector == fields.image && item.image.is_some() {
            vec![Part::Image]
        } else if selector == fields.link && item.link.is_some() {
            vec![Part::Link]
        } else {
            vec![]
        };
        Ok(parts
            .into_iter()
            .map(|part| self.child(Target::Part(index, part)))
            .collect())
    }

    async fn text(&self) -> DriverResult<String> {
        self.check_live()?;
        match &self.target {
            Target::Part(index, part) => {
                if matches!(part, Part::Title) {
                    let mut state = self.state.borrow_mut();
                    if state.stale_on_title.remove(index) {
                        state.rerender();
                        return Err(DriverError::StaleReference);
                    }
                }
                let item = self.item(*index)?;
                Ok(match part {
                    Part::Date => item.date,
                    Part::Title => item.title,
                    Part::Paragraph(n) => item.paragraphs[*n].clone(),
                    Part::Image | Part::Link => String::new(),
                })
            }
            Target::Label(n) => Ok(self.state.borrow().labels[*n].clone()),
            _ => Ok(String::new()),
        }
    }

    async fn property(&self, name: &str) -> DriverResult<Option<String>> {
        self.check_live()?;
        match self.target {
            Target::Part(index, Part::Image) if name == "src" => Ok(self.item(index)?.image),
            Target::Part(index, Part::Link) if name == "href" => Ok(self.item(index)?.link),
            _ => Ok(None),
        }
    }

    async fn scroll_into_view(&self) -> DriverResult<()> {
        self.check_live()
    }

    async fn click(&self) -> DriverResult<()> {
        self.check_live()?;
        let mut state = self.state.borrow_mut();
        match &self.target {
            Target::ShowMore => match state.show_more.pop_front() {
                Some(ShowMore::Loads(items)) => {
                    state.items.extend(items);
                    Ok(())
                }
                Some(ShowMore::Intercepted) => Err(DriverError::ClickIntercepted),
                Some(ShowMore::Stale) => Err(DriverError::StaleReference),
                Some(ShowMore::Vanishes) | None => Err(DriverError::not_found(nyt::SHOW_MORE)),
            },
            Target::Label(n) => {
                let label = state.labels[*n].clone();
                state.clicked.push(label);
                Ok(())
            }
            Target::Control(selector) => {
                let selector = selector.clone();
                state.clicked.push(selector);
                Ok(())
            }
            Target::Item(_) | Target::Part(..) => Ok(()),
        }
    }

    async fn type_text(&self, text: &str) -> DriverResult<()> {
        if let Target::Control(selector) = &self.target {
            self.state
                .borrow_mut()
                .typed
                .push((selector.clone(), text.to_string()));
        }
        Ok(())
    }

    async fn is_attached(&self) -> DriverResult<bool> {
        self.check_live()?;
        Ok(true)
    }
}
