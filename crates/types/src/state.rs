//! Install state machine phases

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of a single install attempt.
///
/// ```text
/// Idle -> Downloading -> Extracting -> Committing -> Installed
///            |   \          |   \          |
///            |    Cancelled |    Cancelled |
///            +--> Failed <--+--------------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallPhase {
    Idle,
    Downloading,
    Extracting,
    Committing,
    Installed,
    Failed,
    Cancelled,
}

impl InstallPhase {
    /// Whether the machine may move from `self` to `next`
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        use InstallPhase::{
            Cancelled, Committing, Downloading, Extracting, Failed, Idle, Installed,
        };
        matches!(
            (self, next),
            (Idle, Downloading)
                | (Downloading, Extracting | Failed | Cancelled)
                | (Extracting, Committing | Failed | Cancelled)
                | (Committing, Installed | Failed)
        )
    }

    /// Terminal phases end an attempt
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Installed | Self::Failed | Self::Cancelled)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Downloading => "downloading",
            Self::Extracting => "extracting",
            Self::Committing => "committing",
            Self::Installed => "installed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for InstallPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two ordered passes over an archive while staging.
///
/// Every implied directory exists before the first file byte is written,
/// so archives that list files ahead of their directories still extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StagingPass {
    Directories,
    Files,
}

impl fmt::Display for StagingPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directories => f.write_str("directories"),
            Self::Files => f.write_str("files"),
        }
    }
}
