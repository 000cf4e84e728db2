//! Collection loop over the fully expanded result list.
//!
//! Walks the item handles by index and extracts each one into the
//! [`ResultSet`]. When a handle goes stale the page has re-rendered, possibly
//! renumbering the list, so the whole list is re-read and the same index is
//! tried again. The index means "next unprocessed position", not a specific
//! item: an item that shifts forward is revisited (harmless, the set ignores
//! the duplicate URL), one that shifts backward can be skipped. The optional
//! completeness sweep re-walks the final list to pick those up.

use crate::driver::wait::wait_until_attached;
use crate::driver::{DriverResult, Page};
use crate::extract::{ItemSelectors, extract_article};
use crate::models::ResultSet;
use crate::utils::truncate_for_log;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Clone, Copy)]
pub struct CollectOptions {
    /// Bound on waiting for one item to be attached before reading it.
    pub item_timeout: Duration,
    /// Walk the final list once more if any re-snapshot happened.
    pub completeness_sweep: bool,
}

/// What happened during a collection run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CollectReport {
    /// Items read successfully during the main walk.
    pub visited: usize,
    /// Of those, how many repeated an already collected URL.
    pub duplicates: usize,
    /// Times the result list was re-read after a stale handle.
    pub resnapshots: usize,
    /// Records added by the completeness sweep.
    pub swept: usize,
}

/// Extract every result item on `page` into a deduplicated, ordered set.
///
/// # Errors
///
/// Any driver failure other than a stale handle: a missing sub-element, a
/// timed-out wait, or a broken browser connection.
#[instrument(level = "info", skip_all, fields(search_phrase = %search_phrase))]
pub async fn collect_articles<P: Page>(
    page: &P,
    selectors: &ItemSelectors,
    search_phrase: &str,
    options: &CollectOptions,
) -> DriverResult<(ResultSet, CollectReport)> {
    let mut set = ResultSet::new();
    let mut report = CollectReport::default();

    walk(page, selectors, search_phrase, options.item_timeout, &mut set, &mut report).await?;

    if options.completeness_sweep && report.resnapshots > 0 {
        let before = set.len();
        let mut sweep = CollectReport::default();
        walk(page, selectors, search_phrase, options.item_timeout, &mut set, &mut sweep).await?;
        report.resnapshots += sweep.resnapshots;
        report.swept = set.len() - before;
        info!(swept = report.swept, "Completeness sweep finished");
    }

    info!(
        collected = set.len(),
        visited = report.visited,
        duplicates = report.duplicates,
        resnapshots = report.resnapshots,
        "Collected search results"
    );
    Ok((set, report))
}

async fn walk<P: Page>(
    page: &P,
    selectors: &ItemSelectors,
    search_phrase: &str,
    item_timeout: Duration,
    set: &mut ResultSet,
    report: &mut CollectReport,
) -> DriverResult<()> {
    let mut items = read_list(page, selectors.item).await?;
    debug!(count = items.len(), "Read result list");

    let mut index = 0;
    while index < items.len() {
        let item = &items[index];
        let attempt = async {
            wait_until_attached(item, item_timeout).await?;
            extract_article(item, search_phrase, selectors).await
        }
        .await;

        match attempt {
            Ok(record) => {
                report.visited += 1;
                let url = record.url.clone();
                let title = truncate_for_log(&record.title, 80);
                if set.insert(record) {
                    debug!(index, %url, %title, "Collected article");
                } else {
                    report.duplicates += 1;
                    debug!(index, %url, "Skipping duplicate article");
                }
                index += 1;
            }
            Err(e) if e.is_stale() => {
                report.resnapshots += 1;
                warn!(index, "Result item went stale; re-reading the result list");
                items = read_list(page, selectors.item).await?;
                debug!(count = items.len(), "Re-read result list");
            }
            Err(e) => {
                error!(index, error = %e, "Failed to read result item");
                return Err(e);
            }
        }
    }
    Ok(())
}

/// Read the item list, reading again for as long as the list itself re-renders mid-read.
async fn read_list<P: Page>(page: &P, selector: &str) -> DriverResult<Vec<P::Element>> {
    loop {
        match page.find_elements(selector).await {
            Err(e) if e.is_stale() => debug!("Result list re-rendered while being read; reading again"),
            other => return other,
        }
    }
}
