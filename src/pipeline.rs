//! End-to-end harvesting run.
//!
//! A live run goes through five stages, strictly one after another:
//!
//! 1. **Search**: open the site, dismiss the cookie banner, search, filter by
//!    section and date span
//! 2. **Pagination**: click "show more" until every result is loaded
//! 3. **Collection**: extract every result item, deduplicated by URL
//! 4. **Images**: download each article's picture
//! 5. **Sink**: append one row per article to the spreadsheet
//!
//! A replay run starts at stage 3 on a saved page. Any stage failing ends the
//! run; the browser is closed either way.

use crate::cli::Cli;
use crate::collect::{CollectOptions, CollectReport, collect_articles};
use crate::driver::Page;
use crate::driver::chromium::{BrowserSession, LaunchOptions};
use crate::driver::snapshot::SnapshotPage;
use crate::images::{ByteFetcher, HttpFetcher, download_images};
use crate::outputs::table::append_rows;
use crate::pagination::load_all_results;
use crate::scrapers::nyt;
use crate::utils::DateSpan;
use crate::work_item::SearchParams;
use chrono::NaiveDate;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Everything a run needs besides the search parameters.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub site_url: String,
    pub output: PathBuf,
    pub image_dir: PathBuf,
    pub wait_timeout: Duration,
    pub max_click_attempts: u32,
    pub completeness_sweep: bool,
    pub launch: LaunchOptions,
}

impl RunSettings {
    pub fn from_cli(cli: &Cli) -> Self {
        RunSettings {
            site_url: cli.site_url.clone(),
            output: cli.output.clone(),
            image_dir: cli.image_dir.clone(),
            wait_timeout: Duration::from_secs(cli.wait_timeout_secs),
            max_click_attempts: cli.max_click_attempts,
            completeness_sweep: cli.completeness_sweep,
            launch: LaunchOptions {
                headless: !cli.headful,
                chrome_path: cli.chrome_path.clone(),
                ..LaunchOptions::default()
            },
        }
    }

    fn collect_options(&self) -> CollectOptions {
        CollectOptions {
            item_timeout: self.wait_timeout,
            completeness_sweep: self.completeness_sweep,
        }
    }
}

/// Counters of one finished run, logged by `main`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Successful "show more" clicks.
    pub clicks: usize,
    /// Distinct articles collected.
    pub collected: usize,
    /// Images downloaded and stored.
    pub images: usize,
    /// Rows appended to the spreadsheet, header excluded.
    pub rows_written: usize,
    /// Details of the collection walk.
    pub report: CollectReport,
}

/// Drive a real browser through the whole pipeline.
pub async fn run_live(
    params: &SearchParams,
    settings: &RunSettings,
    today: NaiveDate,
) -> Result<RunSummary, Box<dyn Error>> {
    let fetcher = HttpFetcher::new()?;
    let session = BrowserSession::launch(&settings.launch).await?;

    let result = live_pipeline(session.page(), params, settings, &fetcher, today).await;

    session.close().await;
    result
}

/// Harvest a saved results page without a browser.
pub async fn run_replay(
    path: &Path,
    base_url: Option<&str>,
    params: &SearchParams,
    settings: &RunSettings,
) -> Result<RunSummary, Box<dyn Error>> {
    let base_url = base_url.unwrap_or(&settings.site_url);
    let page = SnapshotPage::load(path, base_url).await?;
    let fetcher = HttpFetcher::new()?;
    collect_and_persist(&page, params, settings, &fetcher).await
}

#[instrument(level = "info", skip_all, fields(search_phrase = %params.search_phrase, category = %params.news_category))]
pub async fn live_pipeline<P: Page, F: ByteFetcher>(
    page: &P,
    params: &SearchParams,
    settings: &RunSettings,
    fetcher: &F,
    today: NaiveDate,
) -> Result<RunSummary, Box<dyn Error>> {
    let span = DateSpan::covering_months(today, params.number_of_months);
    info!(start = %span.start, end = %span.end, months = params.number_of_months, "Searching date span");

    nyt::prepare_search(page, &settings.site_url, params, &span, settings.wait_timeout).await?;
    let clicks = load_all_results(page, nyt::SHOW_MORE, settings.max_click_attempts).await?;

    let summary = collect_and_persist(page, params, settings, fetcher).await?;
    Ok(RunSummary { clicks, ..summary })
}

/// Collect the results on `page`, fetch their images and append them to the spreadsheet.
pub async fn collect_and_persist<P: Page, F: ByteFetcher>(
    page: &P,
    params: &SearchParams,
    settings: &RunSettings,
    fetcher: &F,
) -> Result<RunSummary, Box<dyn Error>> {
    let (set, report) = collect_articles(
        page,
        &nyt::ITEM_SELECTORS,
        &params.search_phrase,
        &settings.collect_options(),
    )
    .await?;
    if set.is_empty() {
        warn!("Search returned no articles");
    }

    let mut records = set.into_records();
    let images = download_images(&mut records, fetcher, &settings.image_dir).await?;
    let rows_written = append_rows(&settings.output, &records).await?;

    info!(
        collected = records.len(),
        images,
        rows_written,
        output = %settings.output.display(),
        "Run finished"
    );
    Ok(RunSummary {
        clicks: 0,
        collected: records.len(),
        images,
        rows_written,
        report,
    })
}
