//! Utility functions for URL normalization, date spans, logging and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Query-string stripping and file-name derivation for remote URLs
//! - Search date span computation from a month count
//! - String truncation for log fields
//! - File system validation for output directories

use chrono::{Datelike, Months, NaiveDate};
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Drop everything from the first `?` on.
///
/// Result items link to articles and images with tracking parameters
/// attached; the part before the query string is what identifies them.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(strip_query("https://example.com/a/b.jpg?width=100"), "https://example.com/a/b.jpg");
/// ```
pub fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

/// Final path segment of a URL, used as the local file name for a download.
///
/// Returns `None` when the URL ends with `/` and therefore names no file.
pub fn file_name_from_url(url: &str) -> Option<&str> {
    strip_query(url)
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
}

/// Inclusive date range handed to the site's date filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateSpan {
    /// Span ending `today` and starting on the first day of the month
    /// `number_of_months - 1` months back.
    ///
    /// Both `0` and `1` mean "this month only".
    pub fn covering_months(today: NaiveDate, number_of_months: u32) -> Self {
        let months_back = number_of_months.saturating_sub(1);
        let start = today
            .checked_sub_months(Months::new(months_back))
            .and_then(|d| d.with_day(1))
            .unwrap_or(NaiveDate::MIN);
        DateSpan { start, end: today }
    }

    /// Start date in the site's `MM/DD/YYYY` input format.
    pub fn start_input(&self) -> String {
        self.start.format("%m/%d/%Y").to_string()
    }

    pub fn end_input(&self) -> String {
        self.end.format("%m/%d/%Y").to_string()
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` bytes (backed off to a character
/// boundary) with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a probe file. Run before the browser is
/// launched so a bad image directory fails the run early.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}
