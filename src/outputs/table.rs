//! Append-only CSV spreadsheet output.
//!
//! A new (or empty) file starts with a header row naming the columns of
//! [`PersistedRow`]; an existing file only gets rows appended below its
//! current content. A file whose last line lacks a terminator gets one
//! before the new rows.

use crate::models::{ArticleRecord, PersistedRow};
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{info, instrument};

/// Append one row per record to the spreadsheet at `path`.
///
/// Returns the number of rows written (header excluded).
#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = records.len()))]
pub async fn append_rows(path: &Path, records: &[ArticleRecord]) -> Result<usize, Box<dyn Error>> {
    let has_content = match fs::metadata(path).await {
        Ok(meta) => meta.len() > 0,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => return Err(e.into()),
    };

    let mut encoded = encode_rows(records, !has_content)?;
    if has_content && !ends_with_newline(path).await? {
        encoded.insert(0, b'\n');
    }

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(&encoded).await?;
    file.flush().await?;

    info!(new_file = !has_content, "Appended rows to spreadsheet");
    Ok(records.len())
}

async fn ends_with_newline(path: &Path) -> std::io::Result<bool> {
    let mut file = fs::File::open(path).await?;
    file.seek(std::io::SeekFrom::End(-1)).await?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last).await?;
    Ok(last[0] == b'\n')
}

fn encode_rows(records: &[ArticleRecord], with_header: bool) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    if with_header {
        writer.write_record(PersistedRow::HEADER)?;
    }
    for record in records {
        writer.serialize(PersistedRow::from(record))?;
    }
    Ok(writer.into_inner().map_err(|e| e.to_string())?)
}
