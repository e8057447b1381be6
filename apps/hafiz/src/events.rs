//! Event handling and progress display

use crate::logging::log_event_with_tracing;
use console::{style, Term};
use hafiz_events::{format_bytes, format_progress, AppEvent, DownloadEvent, InstallEvent};

/// Renders events on stderr while a command runs
pub struct EventHandler {
    term: Term,
    colors: bool,
    /// Route every event through tracing
    structured: bool,
    /// Suppress human-readable lines
    quiet: bool,
    /// A progress line is on screen and must be cleared before printing
    progress_visible: bool,
}

impl EventHandler {
    pub fn new(json_mode: bool, colors: bool, debug: bool) -> Self {
        Self {
            term: Term::stderr(),
            colors,
            structured: json_mode || debug,
            quiet: json_mode,
            progress_visible: false,
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, event: &AppEvent) {
        if self.structured {
            log_event_with_tracing(event);
        }
        if self.quiet {
            return;
        }

        match event {
            AppEvent::Download(download) => self.handle_download(download),
            AppEvent::Install(install) => self.handle_install(install),
            AppEvent::General(_) => {}
        }
    }

    /// Clear any transient progress line
    pub fn finish(&mut self) {
        self.clear_progress();
    }

    fn handle_download(&mut self, event: &DownloadEvent) {
        let name = event.package().unwrap_or("archive");
        match event {
            DownloadEvent::Started {
                total_size,
                resume_offset,
                ..
            } => {
                let size = total_size.map_or_else(|| "unknown size".to_string(), format_bytes);
                if *resume_offset > 0 {
                    self.show_status(&format!(
                        "Downloading {name} ({size}, resuming at {})",
                        format_bytes(*resume_offset)
                    ));
                } else {
                    self.show_status(&format!("Downloading {name} ({size})"));
                }
            }
            DownloadEvent::Progress {
                bytes_downloaded,
                total_bytes,
                ..
            } => {
                let line = format!("  {name}: {}", format_progress(*bytes_downloaded, *total_bytes));
                let _ = self.term.clear_line();
                let _ = self.term.write_str(&line);
                self.progress_visible = true;
            }
            DownloadEvent::RangeIgnored { discarded_bytes, .. } => {
                self.show_warning(&format!(
                    "{name}: server ignored resume, discarded {}",
                    format_bytes(*discarded_bytes)
                ));
            }
            DownloadEvent::SizeMismatch {
                declared,
                announced,
                ..
            } => {
                self.show_warning(&format!(
                    "{name}: server announced {}, catalog says {}",
                    format_bytes(*announced),
                    format_bytes(*declared)
                ));
            }
            DownloadEvent::Completed {
                final_size,
                total_time,
                ..
            } => {
                self.show_status(&format!(
                    "Downloaded {name} ({}) in {:.1}s",
                    format_bytes(*final_size),
                    total_time.as_secs_f64()
                ));
            }
            DownloadEvent::Resuming { .. } | DownloadEvent::Failed { .. } => {}
        }
    }

    fn handle_install(&mut self, event: &InstallEvent) {
        match event {
            InstallEvent::Started { package, .. } => {
                self.show_status(&format!("Installing {package}"));
            }
            InstallEvent::Completed {
                package,
                installed_root,
                ..
            } => {
                let mark = self.paint_ok("✓");
                self.show_status(&format!(
                    "{mark} Installed {package} → {}",
                    installed_root.display()
                ));
            }
            InstallEvent::Failed {
                package,
                phase,
                failure,
            } => {
                let mut line = format!("{package} failed while {phase}: {}", failure.message);
                if let Some(hint) = &failure.hint {
                    line.push_str(&format!("\n  Hint: {hint}"));
                }
                self.show_error(&line);
            }
            InstallEvent::Cancelled { package, phase } => {
                self.show_warning(&format!("{package} cancelled while {phase}"));
            }
            InstallEvent::Rejected { package } => {
                self.show_warning(&format!("{package} is busy with another operation"));
            }
            InstallEvent::CleanupFailed {
                package,
                path,
                error,
            } => {
                self.show_warning(&format!(
                    "{package}: could not remove {}: {error}",
                    path.display()
                ));
            }
            InstallEvent::Uninstalled { package, existed } => {
                if *existed {
                    self.show_status(&format!("Removed {package}"));
                } else {
                    self.show_status(&format!("{package} was not installed"));
                }
            }
            InstallEvent::PhaseChanged { .. }
            | InstallEvent::StagingPassStarted { .. }
            | InstallEvent::StagingPassCompleted { .. }
            | InstallEvent::Committed { .. } => {}
        }
    }

    fn clear_progress(&mut self) {
        if self.progress_visible {
            let _ = self.term.clear_line();
            self.progress_visible = false;
        }
    }

    fn show_status(&mut self, message: &str) {
        self.clear_progress();
        let _ = self.term.write_line(message);
    }

    fn show_warning(&mut self, message: &str) {
        let prefix = if self.colors {
            style("warning:").yellow().bold().to_string()
        } else {
            "warning:".to_string()
        };
        self.show_status(&format!("{prefix} {message}"));
    }

    fn show_error(&mut self, message: &str) {
        let prefix = if self.colors {
            style("error:").red().bold().to_string()
        } else {
            "error:".to_string()
        };
        self.show_status(&format!("{prefix} {message}"));
    }

    fn paint_ok(&self, text: &str) -> String {
        if self.colors {
            style(text).green().to_string()
        } else {
            text.to_string()
        }
    }
}
