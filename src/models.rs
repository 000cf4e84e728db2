//! Data models for harvested search results.
//!
//! This module defines the core data structures used throughout the application:
//! - [`ArticleRecord`]: One article as read from a rendered search result
//! - [`ResultSet`]: The ordered, URL-keyed collection a run accumulates
//! - [`PersistedRow`]: The shape written to the spreadsheet sink

use serde::Serialize;
use std::collections::HashSet;

/// One search result article.
///
/// Built once, the first time its `url` is seen. Only `picture_ref` changes
/// afterwards: it starts as the remote image URL and is rewritten to the
/// local file name once the image has been downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    /// Date label exactly as the site renders it.
    pub date: String,
    pub title: String,
    pub description: String,
    /// Remote image URL, then local file name after post-processing.
    pub picture_ref: String,
    /// Article URL without query string. Identity key of the record.
    pub url: String,
    /// Occurrences of the search phrase in title and description.
    pub phrase_occurrences: usize,
    /// Whether title or description mentions an amount of money.
    pub has_money_mention: bool,
}

/// Articles keyed by `url`, in first-seen order.
#[derive(Debug, Default)]
pub struct ResultSet {
    records: Vec<ArticleRecord>,
    seen: HashSet<String>,
}

impl ResultSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `record` unless its `url` is already present.
    ///
    /// Returns `false` for a duplicate; the duplicate is dropped, never merged.
    pub fn insert(&mut self, record: ArticleRecord) -> bool {
        if self.contains(&record.url) {
            return false;
        }
        self.seen.insert(record.url.clone());
        self.records.push(record);
        true
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Number of distinct articles.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[cfg(test)]
    pub fn records(&self) -> &[ArticleRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ArticleRecord> {
        self.records
    }
}

/// A spreadsheet row: the record without its identity key.
#[derive(Debug, Serialize)]
pub struct PersistedRow<'a> {
    pub date: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub picture_file_name: &'a str,
    pub phrase_occurrences: usize,
    pub has_money_mention: bool,
}

impl PersistedRow<'_> {
    pub const HEADER: [&'static str; 6] = [
        "date",
        "title",
        "description",
        "picture_file_name",
        "phrase_occurrences",
        "has_money_mention",
    ];
}

impl<'a> From<&'a ArticleRecord> for PersistedRow<'a> {
    fn from(record: &'a ArticleRecord) -> Self {
        PersistedRow {
            date: &record.date,
            title: &record.title,
            description: &record.description,
            picture_file_name: &record.picture_ref,
            phrase_occurrences: record.phrase_occurrences,
            has_money_mention: record.has_money_mention,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_record(url: &str, title: &str) -> ArticleRecord {
    ArticleRecord {
        date: "Oct. 3".to_string(),
        title: title.to_string(),
        description: format!("About {title}"),
        picture_ref: format!("{url}.jpg"),
        url: url.to_string(),
        phrase_occurrences: 0,
        has_money_mention: false,
    }
}
