//! Bounded polling waits built on the [`Page`] and [`Element`] primitives.
//!
//! Every wait polls at a fixed interval and gives up with
//! [`DriverError::Timeout`] once its bound is exceeded. Errors other than
//! "not yet" (for example a stale handle) are returned immediately so the
//! caller can decide whether they are recoverable.

use super::{DriverError, DriverResult, Element, Page};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::trace;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

async fn poll_until<F, Fut>(what: &str, timeout: Duration, mut check: F) -> DriverResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = DriverResult<bool>>,
{
    let start = Instant::now();
    loop {
        if check().await? {
            trace!(what, elapsed_ms = start.elapsed().as_millis() as u64, "Wait satisfied");
            return Ok(());
        }
        if start.elapsed() >= timeout {
            return Err(DriverError::Timeout {
                what: what.to_string(),
                after: timeout,
            });
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

pub async fn wait_until_visible<P: Page>(
    page: &P,
    selector: &str,
    timeout: Duration,
) -> DriverResult<()> {
    let what = format!("'{selector}' to become visible");
    poll_until(&what, timeout, || page.is_visible(selector)).await
}

pub async fn wait_until_not_visible<P: Page>(
    page: &P,
    selector: &str,
    timeout: Duration,
) -> DriverResult<()> {
    let what = format!("'{selector}' to disappear");
    poll_until(&what, timeout, || async {
        page.is_visible(selector).await.map(|visible| !visible)
    }).await
}

pub async fn wait_until_page_contains<P: Page>(
    page: &P,
    text: &str,
    timeout: Duration,
) -> DriverResult<()> {
    let what = format!("page to contain '{text}'");
    poll_until(&what, timeout, || page.contains_text(text)).await
}

/// Wait until `element` is part of the document.
///
/// A handle the backend already knows to be dead fails with
/// [`DriverError::StaleReference`] on the first poll rather than timing out.
pub async fn wait_until_attached<E: Element>(element: &E, timeout: Duration) -> DriverResult<()> {
    poll_until("result item to be attached", timeout, || element.is_attached()).await
}
