//! Archive decoding error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ArchiveError {
    #[error("corrupt archive: {message}")]
    Corrupt { message: String },

    #[error("unsupported archive feature: {message}")]
    Unsupported { message: String },

    #[error("unsafe entry path: {path}")]
    UnsafePath { path: String },

    #[error("entry {path} is {size} bytes, limit is {limit}")]
    EntryTooLarge { path: String, size: u64, limit: u64 },

    #[error("archive is missing declared entries: {}", missing.join(", "))]
    MissingEntries { missing: Vec<String> },
}

impl UserFacingError for ArchiveError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        Some("The downloaded archive is unusable; download it again.")
    }

    // A bad artifact is re-downloaded by the caller, never re-decoded.
    fn is_retryable(&self) -> bool {
        true
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Corrupt { .. } => "archive.corrupt",
            Self::Unsupported { .. } => "archive.unsupported",
            Self::UnsafePath { .. } => "archive.unsafe_path",
            Self::EntryTooLarge { .. } => "archive.entry_too_large",
            Self::MissingEntries { .. } => "archive.missing_entries",
        };
        Some(code)
    }
}
