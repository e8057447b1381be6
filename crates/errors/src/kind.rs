//! Coarse error classification surfaced in install results

use std::fmt;

/// The category a failure belongs to.
///
/// Callers (the UI layer) branch on this rather than on the detailed
/// domain errors: every kind except `AlreadyInProgress` and `Config` offers
/// a retry affordance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ErrorKind {
    /// Transfer could not complete
    Network,
    /// Archive unreadable, corrupt, or missing declared entries
    Decode,
    /// Staging or commit I/O failure
    Filesystem,
    /// Caller-initiated cancellation
    Cancelled,
    /// Another attempt for the same package is in flight
    AlreadyInProgress,
    /// Configuration or catalog problem
    Config,
    /// Bug or broken invariant
    Internal,
}

impl ErrorKind {
    /// Stable identifier used in JSON output and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Decode => "decode",
            Self::Filesystem => "filesystem",
            Self::Cancelled => "cancelled",
            Self::AlreadyInProgress => "already_in_progress",
            Self::Config => "config",
            Self::Internal => "internal",
        }
    }

    /// Whether re-invoking the same install may succeed.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Network | Self::Decode | Self::Filesystem | Self::Cancelled
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
