//! Structured logging integration for events
//!
//! Converts domain events into tracing records with structured fields, at
//! the level each event declares for itself.

use hafiz_events::{AppEvent, DownloadEvent, GeneralEvent, InstallEvent};
use tracing::{debug, error, info, trace, warn};

/// Initialize the global subscriber.
///
/// `RUST_LOG` wins when set. Otherwise the filter is `info,hafiz=info`, or
/// debug for the hafiz crates with `--debug`. `--json` switches the
/// formatter to JSON lines on stderr so stdout stays machine-readable.
pub fn init_tracing(json_mode: bool, debug_enabled: bool) {
    let default_filter = if debug_enabled {
        "info,hafiz=debug,hafiz_install=debug,hafiz_net=debug,hafiz_store=debug"
    } else {
        "info,hafiz=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    if json_mode {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(debug_enabled)
            .with_env_filter(filter)
            .init();
    }
}

/// Log an event at its own level with structured fields
pub fn log_event_with_tracing(event: &AppEvent) {
    let target = event.log_target();
    match event {
        AppEvent::Download(download_event) => match download_event {
            DownloadEvent::Started {
                url,
                package,
                total_size,
                resume_offset,
            } => {
                info!(
                    source = target,
                    url = %url,
                    package = ?package,
                    total_bytes = ?total_size,
                    resume_offset,
                    "Download started"
                );
            }
            DownloadEvent::Progress {
                package,
                bytes_downloaded,
                total_bytes,
                ..
            } => {
                trace!(
                    source = target,
                    package = ?package,
                    bytes_downloaded,
                    total_bytes = ?total_bytes,
                    "Download progress"
                );
            }
            DownloadEvent::Resuming {
                url,
                package,
                resume_offset,
            } => {
                info!(
                    source = target,
                    url = %url,
                    package = ?package,
                    resume_offset,
                    "Resuming download"
                );
            }
            DownloadEvent::RangeIgnored {
                url,
                package,
                discarded_bytes,
            } => {
                warn!(
                    source = target,
                    url = %url,
                    package = ?package,
                    discarded_bytes,
                    "Server ignored range request, restarting"
                );
            }
            DownloadEvent::SizeMismatch {
                url,
                package,
                declared,
                announced,
            } => {
                warn!(
                    source = target,
                    url = %url,
                    package = ?package,
                    declared,
                    announced,
                    "Announced size differs from catalog"
                );
            }
            DownloadEvent::Completed {
                url,
                package,
                final_size,
                total_time,
                hash,
            } => {
                info!(
                    source = target,
                    url = %url,
                    package = ?package,
                    bytes_downloaded = final_size,
                    duration_ms = total_time.as_millis(),
                    hash = %hash,
                    "Download completed"
                );
            }
            DownloadEvent::Failed {
                url,
                package,
                bytes_downloaded,
                failure,
            } => {
                error!(
                    source = target,
                    url = %url,
                    package = ?package,
                    bytes_downloaded,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Download failed"
                );
            }
        },

        AppEvent::Install(install_event) => match install_event {
            InstallEvent::Started {
                package,
                url,
                target: install_target,
            } => {
                info!(
                    source = target,
                    package = %package,
                    url = %url,
                    target = %install_target.display(),
                    "Package installation started"
                );
            }
            InstallEvent::PhaseChanged { package, from, to } => {
                debug!(
                    source = target,
                    package = %package,
                    from = %from,
                    to = %to,
                    "Install phase changed"
                );
            }
            InstallEvent::StagingPassStarted {
                package,
                pass,
                staging_path,
            } => {
                info!(
                    source = target,
                    package = %package,
                    pass = %pass,
                    staging = %staging_path.display(),
                    "Staging pass started"
                );
            }
            InstallEvent::StagingPassCompleted {
                package,
                pass,
                entries,
                bytes_written,
            } => {
                debug!(
                    source = target,
                    package = %package,
                    pass = %pass,
                    entries,
                    bytes_written,
                    "Staging pass completed"
                );
            }
            InstallEvent::Committed {
                package,
                installed_root,
                replaced_existing,
            } => {
                info!(
                    source = target,
                    package = %package,
                    installed_root = %installed_root.display(),
                    replaced_existing,
                    "Package committed"
                );
            }
            InstallEvent::Completed {
                package,
                installed_root,
                duration,
            } => {
                info!(
                    source = target,
                    package = %package,
                    installed_root = %installed_root.display(),
                    duration_ms = duration.as_millis(),
                    "Package installation completed"
                );
            }
            InstallEvent::Failed {
                package,
                phase,
                failure,
            } => {
                error!(
                    source = target,
                    package = %package,
                    phase = %phase,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Package installation failed"
                );
            }
            InstallEvent::Cancelled { package, phase } => {
                warn!(
                    source = target,
                    package = %package,
                    phase = %phase,
                    "Package installation cancelled"
                );
            }
            InstallEvent::Rejected { package } => {
                warn!(
                    source = target,
                    package = %package,
                    "Another operation is already running for this package"
                );
            }
            InstallEvent::CleanupFailed {
                package,
                path,
                error,
            } => {
                warn!(
                    source = target,
                    package = %package,
                    path = %path.display(),
                    error = %error,
                    "Cleanup failed"
                );
            }
            InstallEvent::Uninstalled { package, existed } => {
                info!(
                    source = target,
                    package = %package,
                    existed,
                    "Package uninstalled"
                );
            }
        },

        AppEvent::General(GeneralEvent::DebugLog { message, context }) => {
            debug!(source = target, message = %message, context = ?context, "Debug log");
        }
    }
}
