//! Command-line interface definitions for the search harvester.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! The three search parameters can also come from a work-item file or from
//! environment variables; flags win over the file.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the harvester.
///
/// # Examples
///
/// ```sh
/// # Parameters from a work-item file
/// awful_search_harvest --work-item ./work-item.yaml
///
/// # Parameters from flags, images into ./images
/// awful_search_harvest -s "climate" -c "Science" -n 3 -i ./images
///
/// # Re-read a saved results page without a browser
/// awful_search_harvest -s "climate" -c "Science" --replay ./results.html
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Work-item file (YAML or JSON) with search_phrase, news_category and number_of_months
    #[arg(short, long)]
    pub work_item: Option<PathBuf>,

    /// Phrase to search for (overrides the work item)
    #[arg(short, long, env = "SEARCH_PHRASE")]
    pub search_phrase: Option<String>,

    /// Section to filter results by (overrides the work item)
    #[arg(short = 'c', long, env = "NEWS_CATEGORY")]
    pub news_category: Option<String>,

    /// Number of months to cover, including the current one (overrides the work item)
    #[arg(short, long, env = "NUMBER_OF_MONTHS", allow_negative_numbers = true)]
    pub number_of_months: Option<i64>,

    /// Spreadsheet the rows are appended to
    #[arg(short, long, default_value = "./result.csv")]
    pub output: PathBuf,

    /// Directory downloaded article images are stored in
    #[arg(short, long, default_value = ".")]
    pub image_dir: PathBuf,

    /// Site home page the search starts from
    #[arg(long, default_value = crate::scrapers::nyt::SITE_URL)]
    pub site_url: String,

    /// Upper bound for each wait on the page, in seconds
    #[arg(long, default_value_t = 5)]
    pub wait_timeout_secs: u64,

    /// Consecutive contended "show more" clicks tolerated before giving up
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_click_attempts: u32,

    /// Re-walk the final result list when items went stale during collection
    #[arg(long)]
    pub completeness_sweep: bool,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headful: bool,

    /// Chrome/Chromium executable (auto-detected when omitted)
    #[arg(long, env = "CHROME_PATH")]
    pub chrome_path: Option<PathBuf>,

    /// Saved search-results HTML page to harvest instead of driving a browser
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Base URL relative links in the replayed page resolve against
    #[arg(long, requires = "replay")]
    pub replay_base_url: Option<String>,
}
