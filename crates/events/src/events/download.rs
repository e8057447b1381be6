use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::FailureContext;

/// Download-specific events for the event system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DownloadEvent {
    /// Response headers received, body about to stream
    Started {
        url: String,
        package: Option<String>,
        total_size: Option<u64>,
        /// Bytes already on disk from an earlier attempt
        resume_offset: u64,
    },

    /// Rate-limited progress update
    Progress {
        url: String,
        package: Option<String>,
        bytes_downloaded: u64,
        total_bytes: Option<u64>,
    },

    /// A partial file exists and a range request is being made
    Resuming {
        url: String,
        package: Option<String>,
        resume_offset: u64,
    },

    /// The server answered a range request with the full body
    RangeIgnored {
        url: String,
        package: Option<String>,
        discarded_bytes: u64,
    },

    /// Server-announced size differs from the catalog's declared size
    SizeMismatch {
        url: String,
        package: Option<String>,
        declared: u64,
        announced: u64,
    },

    Completed {
        url: String,
        package: Option<String>,
        final_size: u64,
        total_time: Duration,
        hash: String,
    },

    Failed {
        url: String,
        package: Option<String>,
        bytes_downloaded: u64,
        failure: FailureContext,
    },
}

impl DownloadEvent {
    #[must_use]
    pub fn package(&self) -> Option<&str> {
        match self {
            Self::Started { package, .. }
            | Self::Progress { package, .. }
            | Self::Resuming { package, .. }
            | Self::RangeIgnored { package, .. }
            | Self::SizeMismatch { package, .. }
            | Self::Completed { package, .. }
            | Self::Failed { package, .. } => package.as_deref(),
        }
    }
}
