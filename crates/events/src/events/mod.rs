use serde::{Deserialize, Serialize};

use hafiz_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    /// Stable error code, when the error has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Construct a new failure context.
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod download;
pub mod general;
pub mod install;

pub use download::*;
pub use general::*;
pub use install::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// Events not tied to a package
    General(GeneralEvent),

    /// Transfer events (start, progress, resume, completion)
    Download(DownloadEvent),

    /// Install state machine events (phases, staging, commit, cleanup)
    Install(InstallEvent),
}

impl AppEvent {
    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::Download(DownloadEvent::Failed { .. })
            | Self::Install(InstallEvent::Failed { .. }) => Level::ERROR,

            Self::Download(
                DownloadEvent::RangeIgnored { .. } | DownloadEvent::SizeMismatch { .. },
            )
            | Self::Install(
                InstallEvent::CleanupFailed { .. }
                | InstallEvent::Rejected { .. }
                | InstallEvent::Cancelled { .. },
            ) => Level::WARN,

            Self::General(GeneralEvent::DebugLog { .. })
            | Self::Install(
                InstallEvent::PhaseChanged { .. } | InstallEvent::StagingPassCompleted { .. },
            ) => Level::DEBUG,

            Self::Download(DownloadEvent::Progress { .. }) => Level::TRACE,

            _ => Level::INFO,
        }
    }

    /// Get the log target for this event (for structured logging)
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::General(_) => "hafiz::events::general",
            Self::Download(_) => "hafiz::events::download",
            Self::Install(_) => "hafiz::events::install",
        }
    }

    /// Package the event concerns, if any
    #[must_use]
    pub fn package(&self) -> Option<&str> {
        match self {
            Self::General(_) => None,
            Self::Download(event) => event.package(),
            Self::Install(event) => Some(event.package()),
        }
    }
}
