//! Configuration structures for archive downloads

use hafiz_config::NetworkConfig;
use hafiz_hash::Hash;
use hafiz_types::TransferState;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for archive downloads
#[derive(Clone, Debug)]
pub struct DownloadConfig {
    /// Maximum file size allowed, 0 disables the check (default: 2GB)
    pub max_file_size: u64,
    /// Longest wait for the next body chunk (default: 30s)
    pub stall_timeout: Duration,
    /// Minimum spacing between progress reports (default: 50ms)
    pub progress_interval: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self::from(&NetworkConfig::default())
    }
}

impl From<&NetworkConfig> for DownloadConfig {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            max_file_size: config.max_file_size,
            stall_timeout: Duration::from_secs(config.stall_timeout),
            progress_interval: Duration::from_millis(config.progress_interval_ms),
        }
    }
}

impl DownloadConfig {
    pub(super) fn size_limit(&self) -> Option<u64> {
        (self.max_file_size > 0).then_some(self.max_file_size)
    }
}

/// One archive to fetch
#[derive(Clone, Debug)]
pub struct DownloadRequest {
    pub url: String,
    /// Temp file the body is streamed into
    pub dest_path: PathBuf,
    /// Package the archive belongs to, for events
    pub package: Option<String>,
    pub expected_hash: Option<Hash>,
    /// Catalog size; informational only
    pub declared_size: Option<u64>,
}

impl DownloadRequest {
    #[must_use]
    pub fn new(url: impl Into<String>, dest_path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            dest_path: dest_path.into(),
            package: None,
            expected_hash: None,
            declared_size: None,
        }
    }

    #[must_use]
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    #[must_use]
    pub fn with_expected_hash(mut self, hash: Option<Hash>) -> Self {
        self.expected_hash = hash;
        self
    }

    #[must_use]
    pub fn with_declared_size(mut self, size: u64) -> Self {
        self.declared_size = (size > 0).then_some(size);
        self
    }
}

/// Result of a completed download
#[derive(Clone, Debug)]
pub struct DownloadOutcome {
    pub state: TransferState,
    /// BLAKE3 digest of the whole file
    pub hash: Hash,
    pub duration: Duration,
    /// Bytes reused from an earlier partial file
    pub resumed_from: u64,
}
