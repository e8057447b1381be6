//! Installation system error types

use std::borrow::Cow;

use crate::{ErrorKind, UserFacingError};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum InstallError {
    #[error("an install of {package} is already in progress")]
    AlreadyInProgress { package: String },

    #[error("filesystem operation failed: {operation} on {path}: {message}")]
    FilesystemError {
        operation: String,
        path: String,
        message: String,
    },

    #[error("atomic operation failed: {message}")]
    AtomicOperationFailed { message: String },

    #[error("invalid install state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("task execution failed: {message}")]
    TaskError { message: String },
}

impl InstallError {
    /// Create a filesystem error from an `io::Error` for a named operation.
    #[must_use]
    pub fn filesystem(operation: &str, path: &std::path::Path, err: &std::io::Error) -> Self {
        Self::FilesystemError {
            operation: operation.to_string(),
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    /// Coarse classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyInProgress { .. } => ErrorKind::AlreadyInProgress,
            Self::FilesystemError { .. } | Self::AtomicOperationFailed { .. } => {
                ErrorKind::Filesystem
            }
            Self::InvalidTransition { .. } | Self::TaskError { .. } => ErrorKind::Internal,
        }
    }
}

impl UserFacingError for InstallError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::AlreadyInProgress { .. } => {
                Some("Wait for the running download of this package to finish.")
            }
            Self::FilesystemError { .. } | Self::AtomicOperationFailed { .. } => {
                Some("Check free space and permissions of the content directory, then retry.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::AlreadyInProgress { .. } => "install.already_in_progress",
            Self::FilesystemError { .. } => "install.filesystem",
            Self::AtomicOperationFailed { .. } => "install.atomic_operation_failed",
            Self::InvalidTransition { .. } => "install.invalid_transition",
            Self::TaskError { .. } => "install.task_error",
        };
        Some(code)
    }
}
