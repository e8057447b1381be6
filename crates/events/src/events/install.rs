use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use hafiz_types::{InstallPhase, StagingPass};

use super::FailureContext;

/// Installation domain events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InstallEvent {
    /// Install attempt accepted for a package
    Started {
        package: String,
        url: String,
        target: PathBuf,
    },

    /// State machine moved to a new phase
    PhaseChanged {
        package: String,
        from: InstallPhase,
        to: InstallPhase,
    },

    StagingPassStarted {
        package: String,
        pass: StagingPass,
        staging_path: PathBuf,
    },

    StagingPassCompleted {
        package: String,
        pass: StagingPass,
        entries: usize,
        bytes_written: u64,
    },

    /// Staged tree renamed into the content namespace
    Committed {
        package: String,
        installed_root: PathBuf,
        replaced_existing: bool,
    },

    Completed {
        package: String,
        installed_root: PathBuf,
        duration: Duration,
    },

    Failed {
        package: String,
        phase: InstallPhase,
        failure: FailureContext,
    },

    Cancelled {
        package: String,
        phase: InstallPhase,
    },

    /// Another attempt for the same package was already in flight
    Rejected {
        package: String,
    },

    /// Best-effort removal of a temp file or staging tree did not succeed
    CleanupFailed {
        package: String,
        path: PathBuf,
        error: String,
    },

    Uninstalled {
        package: String,
        existed: bool,
    },
}

impl InstallEvent {
    #[must_use]
    pub fn package(&self) -> &str {
        match self {
            Self::Started { package, .. }
            | Self::PhaseChanged { package, .. }
            | Self::StagingPassStarted { package, .. }
            | Self::StagingPassCompleted { package, .. }
            | Self::Committed { package, .. }
            | Self::Completed { package, .. }
            | Self::Failed { package, .. }
            | Self::Cancelled { package, .. }
            | Self::Rejected { package }
            | Self::CleanupFailed { package, .. }
            | Self::Uninstalled { package, .. } => package,
        }
    }
}
