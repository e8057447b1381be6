//! Network-related error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum NetworkError {
    #[error("connection timeout to {url}")]
    Timeout { url: String },

    #[error("download stalled: no data from {url} for {seconds}s")]
    Stalled { url: String, seconds: u64 },

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("transfer truncated: received {received} of {expected} bytes from {url}")]
    Truncated {
        url: String,
        received: u64,
        expected: u64,
    },

    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("unsupported protocol: {protocol}")]
    UnsupportedProtocol { protocol: String },

    #[error("HTTP error {status}: {message}")]
    HttpError { status: u16, message: String },

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("file size {size} exceeds limit {limit}")]
    FileSizeExceeded { size: u64, limit: u64 },

    #[error("download already in progress: {path}")]
    Locked { path: String },

    #[error("network unavailable")]
    NetworkUnavailable,
}

impl UserFacingError for NetworkError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Timeout { .. } | Self::Stalled { .. } | Self::Truncated { .. } => {
                Some("Check your internet connection and retry the download.")
            }
            Self::NetworkUnavailable | Self::ConnectionRefused(_) => {
                Some("Connect to the internet, then retry.")
            }
            Self::ChecksumMismatch { .. } => {
                Some("The downloaded archive was damaged in transit; retry the download.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::InvalidUrl(_) | Self::UnsupportedProtocol { .. } | Self::FileSizeExceeded { .. }
        )
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Timeout { .. } => "network.timeout",
            Self::Stalled { .. } => "network.stalled",
            Self::DownloadFailed(_) => "network.download_failed",
            Self::Truncated { .. } => "network.truncated",
            Self::ConnectionRefused(_) => "network.connection_refused",
            Self::InvalidUrl(_) => "network.invalid_url",
            Self::UnsupportedProtocol { .. } => "network.unsupported_protocol",
            Self::HttpError { .. } => "network.http_error",
            Self::ChecksumMismatch { .. } => "network.checksum_mismatch",
            Self::FileSizeExceeded { .. } => "network.file_size_exceeded",
            Self::Locked { .. } => "network.locked",
            Self::NetworkUnavailable => "network.unavailable",
        };
        Some(code)
    }
}
