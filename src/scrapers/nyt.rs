//! New York Times search flow.
//!
//! Drives the site's own search UI: accept the cookie banner, open the search
//! box, submit the phrase, pick a section from the filter dropdown and narrow
//! the date range. The result list it leaves behind is then expanded and read
//! by the generic pipeline using [`SHOW_MORE`] and [`ITEM_SELECTORS`].

use crate::driver::wait::{
    wait_until_not_visible, wait_until_page_contains, wait_until_visible,
};
use crate::driver::{DriverError, DriverResult, Element, Page};
use crate::extract::ItemSelectors;
use crate::utils::DateSpan;
use crate::work_item::SearchParams;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

pub const SITE_URL: &str = "https://www.nytimes.com/";

pub const COOKIE_ACCEPT: &str = r#"button[data-testid="GDPR-accept"]"#;
pub const RESPONSE_SNACKBAR: &str = r#"div[data-testid="response-snackbar"]"#;

pub const SEARCH_BUTTON: &str = r#"button[data-test-id="search-button"]"#;
pub const SEARCH_INPUT: &str = r#"input[data-testid="search-input"]"#;
pub const SEARCH_SUBMIT: &str = r#"button[data-test-id="search-submit"]"#;

pub const SECTION_TOGGLE: &str =
    r#"div[data-testid="section"] button[data-testid="search-multiselect-button"]"#;
pub const SECTION_LABELS: &str = r#"div[data-testid="section"] ul[data-testid="multi-select-dropdown-list"] li label[data-testid="DropdownLabel"]"#;

pub const DATE_TOGGLE: &str = r#"button[data-testid="search-date-dropdown-a"]"#;
pub const SPECIFIC_DATES: &str = r#"button[value="Specific Dates"]"#;
pub const START_DATE: &str = r#"input[data-testid="DateRange-startDate"]"#;
pub const END_DATE: &str = r#"input[data-testid="DateRange-endDate"]"#;

pub const SHOW_MORE: &str = r#"button[data-testid="search-show-more-button"]"#;
pub const RESULT_ITEMS: &str =
    r#"ol[data-testid="search-results"] li[data-testid="search-bodega-result"]"#;

pub const ITEM_SELECTORS: ItemSelectors = ItemSelectors {
    item: RESULT_ITEMS,
    date: r#"span[data-testid="todays-date"]"#,
    title: "h4",
    paragraph: "p",
    image: "img",
    link: "a",
};

/// Run the search UI until the filtered result list is on screen.
#[instrument(level = "info", skip(page, params), fields(search_phrase = %params.search_phrase))]
pub async fn prepare_search<P: Page>(
    page: &P,
    site_url: &str,
    params: &SearchParams,
    span: &DateSpan,
    timeout: Duration,
) -> Result<(), Box<dyn Error>> {
    info!(%site_url, "Opening site");
    page.goto(site_url).await?;

    accept_cookies(page, timeout).await?;
    search_for(page, &params.search_phrase).await?;
    select_section(page, &params.news_category).await?;
    set_date_span(page, span).await?;

    wait_until_page_contains(page, &params.search_phrase, timeout).await?;
    info!("Search results are showing");
    Ok(())
}

/// Dismiss the GDPR banner if the site shows one.
///
/// The banner is best-effort: not appearing, or still fading out after the
/// wait, is not an error.
pub async fn accept_cookies<P: Page>(page: &P, timeout: Duration) -> DriverResult<()> {
    match wait_until_visible(page, COOKIE_ACCEPT, timeout).await {
        Ok(()) => {}
        Err(DriverError::Timeout { .. }) => {
            debug!("No cookie banner shown");
            return Ok(());
        }
        Err(e) => return Err(e),
    }

    click(page, COOKIE_ACCEPT).await?;

    for selector in [COOKIE_ACCEPT, RESPONSE_SNACKBAR] {
        match wait_until_not_visible(page, selector, timeout).await {
            Ok(()) => {}
            Err(DriverError::Timeout { .. }) => {
                warn!(selector, "Cookie banner still closing; continuing");
                return Ok(());
            }
            Err(e) => return Err(e),
        }
    }
    debug!("Accepted cookies");
    Ok(())
}

/// Open the search box, type `phrase` and submit it.
///
/// # Arguments
///
/// * `page` - Page showing the site's header
/// * `phrase` - Text typed into the search input, as given
///
/// # Errors
///
/// Any driver failure while clicking or typing.
pub async fn search_for<P: Page>(page: &P, phrase: &str) -> DriverResult<()> {
    click(page, SEARCH_BUTTON).await?;
    page.find_element(SEARCH_INPUT).await?.type_text(phrase).await?;
    click(page, SEARCH_SUBMIT).await?;
    debug!(phrase, "Submitted search");
    Ok(())
}

/// Pick the section filter whose label matches `category`.
///
/// Labels carry result counts and whitespace ("Business\n1,234"); both
/// sides are compared after [`normalize_label`].
///
/// # Errors
///
/// Fails when no label matches, listing the labels that were available.
pub async fn select_section<P: Page>(page: &P, category: &str) -> Result<(), Box<dyn Error>> {
    click(page, SECTION_TOGGLE).await?;

    let wanted = normalize_label(category);
    let labels = page.find_elements(SECTION_LABELS).await?;
    let mut available = Vec::with_capacity(labels.len());
    for label in labels {
        let name = normalize_label(&label.text().await?);
        if name == wanted {
            label.click().await?;
            info!(section = %name, "Selected section");
            return Ok(());
        }
        available.push(name);
    }

    Err(format!(
        "news category '{category}' not found among sections [{}]",
        available.join(", ")
    )
    .into())
}

/// Narrow the results to `span` through the "Specific Dates" filter.
///
/// Both dates are typed as `MM/DD/YYYY`, then the dropdown is closed to apply them.
pub async fn set_date_span<P: Page>(page: &P, span: &DateSpan) -> DriverResult<()> {
    click(page, DATE_TOGGLE).await?;
    click(page, SPECIFIC_DATES).await?;
    page.find_element(START_DATE)
        .await?
        .type_text(&span.start_input())
        .await?;
    page.find_element(END_DATE)
        .await?
        .type_text(&span.end_input())
        .await?;
    click(page, DATE_TOGGLE).await?;
    debug!(start = %span.start, end = %span.end, "Set date span");
    Ok(())
}

/// Keep ASCII letters and periods, lowercased.
pub fn normalize_label(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphabetic() || *c == '.')
        .collect::<String>()
        .to_lowercase()
}

async fn click<P: Page>(page: &P, selector: &str) -> DriverResult<()> {
    page.find_element(selector).await?.click().await
}
