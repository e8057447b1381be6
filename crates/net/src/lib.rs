#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for hafiz
//!
//! This crate handles all HTTP operations: resumable archive downloads with
//! progress, cancellation and stall detection, plus small text fetches for
//! remote catalogs. Transport failures are reported, never retried here;
//! the caller decides whether to try again.

mod client;
mod download;

pub use client::{NetClient, NetConfig};
pub use download::{DownloadConfig, DownloadOutcome, DownloadRequest, Downloader};

use hafiz_errors::{Error, NetworkError};
use hafiz_events::{EventEmitter, EventSender};
use url::Url;

/// Fetch text content from a URL
///
/// # Errors
///
/// Returns an error if the HTTP request fails, the server returns an error status,
/// or the response body cannot be decoded as text.
pub async fn fetch_text(client: &NetClient, url: &str, tx: &EventSender) -> Result<String, Error> {
    tx.emit_debug(format!("Fetching text from {url}"));

    let response = client.get(url).await?;

    if !response.status().is_success() {
        return Err(NetworkError::HttpError {
            status: response.status().as_u16(),
            message: response.status().to_string(),
        }
        .into());
    }

    response
        .text()
        .await
        .map_err(|e| NetworkError::DownloadFailed(e.to_string()).into())
}

/// Parse and validate a URL
///
/// # Errors
///
/// Returns an error if the URL string is malformed or invalid according to RFC 3986.
pub fn parse_url(url: &str) -> Result<Url, Error> {
    Url::parse(url).map_err(|e| NetworkError::InvalidUrl(e.to_string()).into())
}

/// Whether a catalog or config location names a remote resource
#[must_use]
pub fn is_remote(location: &str) -> bool {
    parse_url(location).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}
