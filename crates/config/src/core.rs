//! Configuration sections shared across crates

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    pub content_root: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout")]
    pub timeout: u64, // seconds, whole transfer
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64, // seconds
    #[serde(default = "default_stall_timeout")]
    pub stall_timeout: u64, // seconds without a chunk
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Largest archive accepted, in bytes (0 disables the limit)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            stall_timeout: default_stall_timeout(),
            progress_interval_ms: default_progress_interval_ms(),
            user_agent: default_user_agent(),
            max_file_size: default_max_file_size(),
        }
    }
}

/// Installer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallConfig {
    /// Packages installed at once by `install_many`
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Largest single archive entry accepted, in bytes
    #[serde(default = "default_max_entry_size")]
    pub max_entry_size: u64,
    /// Leftover staging, download and trash entries older than this are swept
    #[serde(default = "default_stale_after_hours")]
    pub stale_after_hours: u64,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            max_entry_size: default_max_entry_size(),
            stale_after_hours: default_stale_after_hours(),
        }
    }
}

// Default value functions for serde
fn default_timeout() -> u64 {
    1800 // 30 minutes
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_stall_timeout() -> u64 {
    30
}

fn default_progress_interval_ms() -> u64 {
    50
}

fn default_user_agent() -> String {
    format!("hafiz/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_file_size() -> u64 {
    2 * 1024 * 1024 * 1024 // 2 GiB
}

fn default_max_concurrent() -> usize {
    2
}

fn default_max_entry_size() -> u64 {
    512 * 1024 * 1024
}

fn default_stale_after_hours() -> u64 {
    24
}
