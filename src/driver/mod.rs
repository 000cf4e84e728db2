//! Browser-control capability used by the harvesting pipeline.
//!
//! The pipeline never talks to a browser library directly. It works against
//! two small traits:
//!
//! - [`Page`]: document-level operations (navigation, element lookup,
//!   presence and visibility checks, closing)
//! - [`Element`]: operations on one located element (sub-element lookup,
//!   text and property reads, click, scroll, typing, attachment check)
//!
//! # Implementations
//!
//! | Module | Backend | Use |
//! |--------|---------|-----|
//! | [`chromium`] | chromiumoxide (CDP) | live runs against the real site |
//! | [`snapshot`] | scraper over a saved HTML page | offline replay of a results page |
//!
//! # Errors
//!
//! Every operation returns a [`DriverError`]. The variants are the error
//! taxonomy the pipeline reasons about: a stale handle and a missing element
//! are different conditions and the collection loop only recovers from the
//! former.

use std::time::Duration;
use thiserror::Error;

pub mod chromium;
pub mod snapshot;
pub mod wait;

#[cfg(test)]
pub mod fake;

/// Failure of a browser interaction.
#[derive(Debug, Error)]
pub enum DriverError {
    /// No element matched the selector.
    #[error("no element matches selector '{selector}'")]
    NotFound { selector: String },

    /// The handle points at a node the page has since re-rendered away.
    #[error("element reference is stale (the page re-rendered it)")]
    StaleReference,

    /// Another element sits on top of the click target.
    #[error("click was intercepted by an overlapping element")]
    ClickIntercepted,

    /// The element exists but the requested property is empty.
    #[error("element has no '{property}' property")]
    MissingProperty { property: String },

    /// A bounded wait ran out.
    #[error("timed out after {after:?} waiting for {what}")]
    Timeout { what: String, after: Duration },

    /// The backend cannot perform this kind of interaction.
    #[error("operation '{operation}' is not supported by this driver")]
    Unsupported { operation: &'static str },

    /// Any other browser failure.
    #[error("browser error: {0}")]
    Browser(String),
}

impl DriverError {
    pub fn not_found(selector: &str) -> Self {
        DriverError::NotFound {
            selector: selector.to_string(),
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, DriverError::StaleReference)
    }
}

pub type DriverResult<T> = Result<T, DriverError>;

/// One rendered page in a browser (or a stand-in for one).
#[allow(async_fn_in_trait)]
pub trait Page {
    type Element: Element;

    /// Navigate to `url` and wait for the navigation to settle.
    async fn goto(&self, url: &str) -> DriverResult<()>;

    /// First element matching `selector`, or [`DriverError::NotFound`].
    async fn find_element(&self, selector: &str) -> DriverResult<Self::Element>;

    /// All elements matching `selector`, in document order. Empty when none match.
    async fn find_elements(&self, selector: &str) -> DriverResult<Vec<Self::Element>>;

    /// Presence check: does any element match `selector` right now?
    async fn contains_element(&self, selector: &str) -> DriverResult<bool> {
        Ok(!self.find_elements(selector).await?.is_empty())
    }

    /// Is the first element matching `selector` rendered and visible?
    async fn is_visible(&self, selector: &str) -> DriverResult<bool>;

    /// Does the page's visible text contain `text` (case-insensitive)?
    async fn contains_text(&self, text: &str) -> DriverResult<bool>;
}

/// A handle to one element of a [`Page`].
///
/// Handles can go stale: once the page re-renders the node, every operation
/// on the old handle fails with [`DriverError::StaleReference`].
#[allow(async_fn_in_trait)]
pub trait Element: Sized {
    async fn find_element(&self, selector: &str) -> DriverResult<Self>;

    async fn find_elements(&self, selector: &str) -> DriverResult<Vec<Self>>;

    /// Rendered text, trimmed.
    async fn text(&self) -> DriverResult<String>;

    /// A resolved DOM property such as `src` or `href`; `None` when unset or empty.
    async fn property(&self, name: &str) -> DriverResult<Option<String>>;

    async fn scroll_into_view(&self) -> DriverResult<()>;

    async fn click(&self) -> DriverResult<()>;

    /// Clear the element's value and type `text` into it.
    async fn type_text(&self, text: &str) -> DriverResult<()>;

    /// Is the node still part of the document?
    async fn is_attached(&self) -> DriverResult<bool>;
}
