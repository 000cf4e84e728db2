//! Image post-processing: download each article's picture and point the record at the local file.
//!
//! Runs strictly one article at a time in collection order. A failed download
//! aborts the run; there is no partial result.

use crate::models::ArticleRecord;
use crate::utils::file_name_from_url;
use reqwest::Client;
use std::error::Error;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::fs;
use tracing::{debug, error, info, instrument};

/// Something that can turn a URL into bytes.
#[allow(async_fn_in_trait)]
pub trait ByteFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, Box<dyn Error>>;
}

/// [`ByteFetcher`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { client })
    }
}

impl ByteFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, Box<dyn Error>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Download every record's picture into `image_dir` and rewrite `picture_ref`
/// to the stored file name.
///
/// Returns the number of images stored.
///
/// # Errors
///
/// Fails on the first URL without a file name, failed fetch or failed write.
/// Records before the failing one keep their rewritten `picture_ref`; the
/// failing one and those after it are left untouched.
#[instrument(level = "info", skip_all, fields(count = records.len(), image_dir = %image_dir.display()))]
pub async fn download_images<F: ByteFetcher>(
    records: &mut [ArticleRecord],
    fetcher: &F,
    image_dir: &Path,
) -> Result<usize, Box<dyn Error>> {
    let t0 = Instant::now();
    for record in records.iter_mut() {
        let file_name = file_name_from_url(&record.picture_ref)
            .ok_or_else(|| format!("image URL '{}' has no file name", record.picture_ref))?
            .to_string();

        let bytes = match fetcher.fetch(&record.picture_ref).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(url = %record.picture_ref, error = %e, "Image download failed");
                return Err(e);
            }
        };
        fs::write(image_dir.join(&file_name), &bytes).await?;
        debug!(url = %record.picture_ref, %file_name, bytes = bytes.len(), "Stored image");

        record.picture_ref = file_name;
    }

    info!(
        stored = records.len(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Downloaded article images"
    );
    Ok(records.len())
}
