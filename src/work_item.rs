//! Search parameters: work-item file merged with command-line overrides.
//!
//! A work item is a small YAML (or JSON) document:
//!
//! ```yaml
//! search_phrase: Brazil
//! news_category: Sports
//! number_of_months: 2
//! ```
//!
//! Any of the three keys may be missing from the file when the matching flag
//! or environment variable supplies it. `number_of_months` may be written as
//! a number or a string, since work items are often produced by tools that
//! quote everything.

use crate::cli::Cli;
use serde::Deserialize;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{debug, instrument};

#[derive(Debug, Default, Deserialize)]
pub struct WorkItem {
    pub search_phrase: Option<String>,
    pub news_category: Option<String>,
    pub number_of_months: Option<MonthCount>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MonthCount {
    Number(i64),
    Text(String),
}

impl MonthCount {
    fn value(&self) -> Result<i64, Box<dyn Error>> {
        match self {
            MonthCount::Number(n) => Ok(*n),
            MonthCount::Text(s) => s
                .trim()
                .parse()
                .map_err(|e| format!("number_of_months '{s}' is not an integer: {e}").into()),
        }
    }
}

impl WorkItem {
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let raw = fs::read_to_string(path).await?;
        let item = Self::parse(&raw)?;
        debug!(?item, "Loaded work item");
        Ok(item)
    }

    pub fn parse(raw: &str) -> Result<Self, Box<dyn Error>> {
        Ok(serde_yaml::from_str(raw)?)
    }
}

/// The three inputs of a run, validated and normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    /// Lower-cased, otherwise as given (surrounding spaces are part of the phrase). Never blank.
    pub search_phrase: String,
    pub news_category: String,
    /// Months to cover including the current one; negatives clamp to 0.
    pub number_of_months: u32,
}

impl SearchParams {
    /// Merge `item` with the overrides in `cli`.
    ///
    /// # Errors
    ///
    /// Fails when the phrase or category is missing or blank after merging,
    /// or when a textual month count is not an integer.
    pub fn resolve(item: WorkItem, cli: &Cli) -> Result<Self, Box<dyn Error>> {
        let search_phrase = cli
            .search_phrase
            .clone()
            .or(item.search_phrase)
            .map(|s| s.to_lowercase())
            .filter(|s| !s.trim().is_empty())
            .ok_or("no search phrase given (work item `search_phrase`, --search-phrase or SEARCH_PHRASE)")?;

        let news_category = cli
            .news_category
            .clone()
            .or(item.news_category)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or("no news category given (work item `news_category`, --news-category or NEWS_CATEGORY)")?;

        let months = match (cli.number_of_months, item.number_of_months) {
            (Some(n), _) => n,
            (None, Some(count)) => count.value()?,
            (None, None) => 0,
        };
        let number_of_months = months.clamp(0, i64::from(u32::MAX)) as u32;

        Ok(SearchParams {
            search_phrase,
            news_category,
            number_of_months,
        })
    }
}
