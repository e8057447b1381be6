#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for async communication in hafiz
//!
//! Library crates never print. They report what happens through domain
//! events sent over an unbounded channel; the CLI decides how to render or
//! log them. Download progress additionally flows through a
//! [`ProgressSink`] handed to each install call.
//!
//! ## Architecture
//!
//! - **Domain-driven events**: `General`, `Download` and `Install` domains
//! - **Unified `EventEmitter` trait**: one API for raw senders and for
//!   structs that carry an optional sender
//! - **Tracing integration**: every event knows its log level and target

pub mod events;
pub mod sink;

pub use events::{AppEvent, DownloadEvent, FailureContext, GeneralEvent, InstallEvent};
pub use sink::{format_bytes, format_progress, NoProgress, ProgressSink};

use hafiz_errors::UserFacingError;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Type alias for event sender
pub type EventSender = UnboundedSender<AppEvent>;

/// Type alias for event receiver
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<AppEvent>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events throughout hafiz
///
/// Implemented by the raw [`EventSender`] and by any component that
/// optionally holds one. Send errors are ignored: a dropped receiver just
/// means nobody is listening.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Emit an event through this emitter
    fn emit(&self, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            let _ = sender.send(event);
        }
    }

    /// Emit a debug log event
    fn emit_debug(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::debug(message)));
    }

    /// Emit a download started event
    fn emit_download_started(
        &self,
        url: impl Into<String>,
        package: Option<String>,
        total_size: Option<u64>,
        resume_offset: u64,
    ) {
        self.emit(AppEvent::Download(DownloadEvent::Started {
            url: url.into(),
            package,
            total_size,
            resume_offset,
        }));
    }

    /// Emit a download progress event
    fn emit_download_progress(
        &self,
        url: impl Into<String>,
        package: Option<String>,
        bytes_downloaded: u64,
        total_bytes: Option<u64>,
    ) {
        self.emit(AppEvent::Download(DownloadEvent::Progress {
            url: url.into(),
            package,
            bytes_downloaded,
            total_bytes,
        }));
    }

    /// Emit a download completed event
    fn emit_download_completed(
        &self,
        url: impl Into<String>,
        package: Option<String>,
        final_size: u64,
        total_time: Duration,
        hash: impl Into<String>,
    ) {
        self.emit(AppEvent::Download(DownloadEvent::Completed {
            url: url.into(),
            package,
            final_size,
            total_time,
            hash: hash.into(),
        }));
    }

    /// Emit a download failed event from any user-facing error
    fn emit_download_failed<E: UserFacingError + ?Sized>(
        &self,
        url: impl Into<String>,
        package: Option<String>,
        bytes_downloaded: u64,
        error: &E,
    ) {
        self.emit(AppEvent::Download(DownloadEvent::Failed {
            url: url.into(),
            package,
            bytes_downloaded,
            failure: FailureContext::from_error(error),
        }));
    }
}

/// Implementation of `EventEmitter` for the raw `EventSender`
impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}

impl EventEmitter for Option<EventSender> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.as_ref()
    }
}
