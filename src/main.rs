//! # Awful Search Harvest
//!
//! Drives a browser through a news site's search and stores every matching
//! article as a spreadsheet row.
//!
//! ## Features
//!
//! - Searches the New York Times for a phrase, filtered by section and by a
//!   date span covering the last N months
//! - Expands the result list completely through its "show more" control
//! - Survives result items that the page re-renders while they are read
//! - Counts phrase occurrences and detects money mentions per article
//! - Downloads each article's picture and appends rows to a CSV spreadsheet
//! - Replays a saved results page without launching a browser
//!
//! ## Usage
//!
//! ```sh
//! awful_search_harvest -s "climate" -c "Science" -n 3 -o ./result.csv -i ./images
//! ```
//!
//! ## Architecture
//!
//! The application follows a sequential pipeline:
//! 1. **Search**: open the site and apply phrase, section and date filters
//! 2. **Pagination**: load every result page
//! 3. **Collection**: extract and deduplicate the result items
//! 4. **Images**: download each article's picture
//! 5. **Output**: append the rows to the spreadsheet

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod collect;
mod driver;
mod extract;
mod images;
mod models;
mod outputs;
mod pagination;
mod pipeline;
mod scrapers;
mod utils;
mod work_item;

use cli::Cli;
use pipeline::{RunSettings, run_live, run_replay};
use utils::ensure_writable_dir;
use work_item::{SearchParams, WorkItem};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("search_harvest starting up");

    let args = Cli::parse();
    debug!(?args.work_item, ?args.output, ?args.image_dir, "Parsed CLI arguments");

    let item = match &args.work_item {
        Some(path) => WorkItem::load(path).await?,
        None => WorkItem::default(),
    };
    let params = SearchParams::resolve(item, &args)?;
    info!(
        search_phrase = %params.search_phrase,
        news_category = %params.news_category,
        number_of_months = params.number_of_months,
        "Resolved search parameters"
    );

    // Fail before launching a browser if images cannot be stored
    if let Err(e) = ensure_writable_dir(&args.image_dir).await {
        error!(
            path = %args.image_dir.display(),
            error = %e,
            "Image directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let settings = RunSettings::from_cli(&args);
    let outcome = match &args.replay {
        Some(path) => run_replay(path, args.replay_base_url.as_deref(), &params, &settings).await,
        None => run_live(&params, &settings, Local::now().date_naive()).await,
    };

    let summary = match outcome {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, "Harvest failed");
            return Err(e);
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        clicks = summary.clicks,
        collected = summary.collected,
        duplicates = summary.report.duplicates,
        resnapshots = summary.report.resnapshots,
        swept = summary.report.swept,
        rows_written = summary.rows_written,
        "Execution complete"
    );

    Ok(())
}
