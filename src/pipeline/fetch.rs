//! Archive fetch: download the origin archive and read its version marker.
//!
//! The origin publishes no content hash or version number; the
//! `Last-Modified` response header is the only version marker there is.
//! It is parsed *before* the body is consumed, so a response without a
//! usable marker fails fast without buffering megabytes of archive.

use crate::error::IngestError;
use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, info};

/// A fetched source archive and its origin-asserted publication time.
#[derive(Debug, Clone)]
pub struct FetchedArchive {
    /// Raw archive bytes.
    pub bytes: Bytes,
    /// Publication timestamp from the origin's `Last-Modified` header.
    pub published_at: DateTime<Utc>,
}

impl FetchedArchive {
    /// The version marker used in publication-record keys.
    pub fn version(&self) -> String {
        self.published_at
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Fetches the archive and records its publication timestamp.
///
/// # Errors
///
/// * [`IngestError::Fetch`] — transport failure or non-success status.
/// * [`IngestError::Timestamp`] — `Last-Modified` absent or unparseable.
pub async fn fetch_archive(
    client: &reqwest::Client,
    url: &str,
) -> Result<FetchedArchive, IngestError> {
    info!("fetching {url}");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| IngestError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    if !response.status().is_success() {
        return Err(IngestError::Fetch {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }
    debug!("headers: {:?}", response.headers());

    let published_at = last_modified_time(&response)?;
    info!("last modified time: {published_at}");

    let bytes = response.bytes().await.map_err(|e| IngestError::Fetch {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    info!("fetched {} bytes", bytes.len());

    Ok(FetchedArchive {
        bytes,
        published_at,
    })
}

/// Parses the `Last-Modified` header into the run's version timestamp.
fn last_modified_time(response: &reqwest::Response) -> Result<DateTime<Utc>, IngestError> {
    let header = response
        .headers()
        .get(reqwest::header::LAST_MODIFIED)
        .ok_or_else(|| IngestError::Timestamp {
            header: String::new(),
            reason: "header missing".to_string(),
        })?;

    let value = header.to_str().map_err(|e| IngestError::Timestamp {
        header: format!("{header:?}"),
        reason: e.to_string(),
    })?;

    let parsed = DateTime::parse_from_rfc2822(value).map_err(|e| IngestError::Timestamp {
        header: value.to_string(),
        reason: e.to_string(),
    })?;
    Ok(parsed.with_timezone(&Utc))
}
