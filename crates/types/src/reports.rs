//! Terminal results of install attempts

use crate::{InstallPhase, PackageId};
use hafiz_errors::{Error, ErrorKind, UserFacingError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of an install attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallStatus {
    Success,
    Failed,
}

/// Why an install attempt failed, and where
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallFailure {
    pub kind: ErrorKind,
    /// Phase the machine was in when the error surfaced
    pub phase: InstallPhase,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl InstallFailure {
    #[must_use]
    pub fn from_error(err: &Error, phase: InstallPhase) -> Self {
        Self {
            kind: err.kind(),
            phase,
            message: err.user_message().into_owned(),
            hint: err.user_hint().map(str::to_string),
        }
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

/// Terminal value returned by every install call.
///
/// Cancellation is a failure with [`ErrorKind::Cancelled`]; its
/// [`phase`](Self::phase) reports [`InstallPhase::Cancelled`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallResult {
    pub package_id: PackageId,
    pub status: InstallStatus,
    /// `<content_root>/<id>` after a successful commit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_root: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<InstallFailure>,
    /// Archive bytes on disk when the attempt ended, failed or not,
    /// including a resumed prefix
    #[serde(default)]
    pub bytes_downloaded: u64,
    #[serde(default)]
    pub duration_ms: u64,
}

impl InstallResult {
    #[must_use]
    pub fn success(package_id: PackageId, installed_root: PathBuf) -> Self {
        Self {
            package_id,
            status: InstallStatus::Success,
            installed_root: Some(installed_root),
            error: None,
            bytes_downloaded: 0,
            duration_ms: 0,
        }
    }

    #[must_use]
    pub fn failed(package_id: PackageId, failure: InstallFailure) -> Self {
        Self {
            package_id,
            status: InstallStatus::Failed,
            installed_root: None,
            error: Some(failure),
            bytes_downloaded: 0,
            duration_ms: 0,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == InstallStatus::Success
    }

    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|failure| failure.kind)
    }

    /// Final phase of the attempt
    #[must_use]
    pub fn phase(&self) -> InstallPhase {
        match (&self.status, &self.error) {
            (InstallStatus::Success, _) => InstallPhase::Installed,
            (InstallStatus::Failed, Some(failure)) if failure.kind == ErrorKind::Cancelled => {
                InstallPhase::Cancelled
            }
            (InstallStatus::Failed, Some(failure))
                if failure.kind == ErrorKind::AlreadyInProgress =>
            {
                InstallPhase::Idle
            }
            (InstallStatus::Failed, _) => InstallPhase::Failed,
        }
    }

    #[must_use]
    pub fn with_stats(mut self, bytes_downloaded: u64, duration_ms: u64) -> Self {
        self.bytes_downloaded = bytes_downloaded;
        self.duration_ms = duration_ms;
        self
    }
}
