//! Expands a search result list by clicking its "show more" control until it is gone.
//!
//! The loop has a single exit: the control is no longer on the page. Two
//! conditions are retried in place because the page resolves them on its own:
//! the click landing on an overlay, and the control being re-rendered between
//! lookup and click. Those retries are capped by `max_contended_attempts`
//! consecutive failures; a successful click resets the count.

use crate::driver::{DriverError, DriverResult, Element, Page};
use tracing::{debug, info, instrument, warn};

/// Click the `show_more` control until the page stops offering it.
///
/// Returns the number of successful clicks.
///
/// # Errors
///
/// - [`DriverError::ClickIntercepted`] / [`DriverError::StaleReference`] once
///   `max_contended_attempts` consecutive clicks were contended
/// - any other driver failure, unchanged
#[instrument(level = "info", skip(page))]
pub async fn load_all_results<P: Page>(
    page: &P,
    show_more: &str,
    max_contended_attempts: u32,
) -> DriverResult<usize> {
    let mut clicks = 0usize;
    let mut contended = 0u32;

    while page.contains_element(show_more).await? {
        let button = match page.find_element(show_more).await {
            Ok(button) => button,
            Err(DriverError::NotFound { .. }) => {
                debug!("Show-more control vanished before it could be clicked");
                break;
            }
            Err(e) => return Err(e),
        };

        let attempt = async {
            button.scroll_into_view().await?;
            button.click().await
        }
        .await;

        match attempt {
            Ok(()) => {
                clicks += 1;
                contended = 0;
                debug!(clicks, "Loaded another page of results");
            }
            Err(e @ (DriverError::ClickIntercepted | DriverError::StaleReference)) => {
                contended += 1;
                if contended >= max_contended_attempts {
                    warn!(contended, error = %e, "Show-more click kept failing; giving up");
                    return Err(e);
                }
                debug!(contended, error = %e, "Show-more click contended; retrying");
            }
            Err(DriverError::NotFound { .. }) => {
                debug!("Show-more control vanished during click");
                break;
            }
            Err(e) => return Err(e),
        }
    }

    info!(clicks, "Result list fully expanded");
    Ok(clicks)
}
