//! Resumable streaming downloads of package archives
//!
//! A download writes one temp file, guarded by a `.lock` sibling, and hands
//! back the final [`hafiz_types::TransferState`]. Deleting the temp file
//! after a failure is left to the caller.

mod config;
mod core;
mod resume;
mod stream;
mod validation;

pub use config::{DownloadConfig, DownloadOutcome, DownloadRequest};
pub use core::Downloader;
