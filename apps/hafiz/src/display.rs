//! Output rendering and formatting

use console::{style, Term};
use hafiz_events::format_bytes;
use hafiz_types::{InstallResult, PackageId};
use serde::Serialize;
use std::io;
use std::path::PathBuf;

/// Install state of one catalog package
#[derive(Debug, Clone, Serialize)]
pub struct PackageStatus {
    pub package: PackageId,
    pub installed: bool,
    /// Phase name while an operation is running in this process
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_flight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    pub declared_size_bytes: u64,
    pub source_url: String,
}

/// An installed package namespace
#[derive(Debug, Clone, Serialize)]
pub struct InstalledPackage {
    pub package: PackageId,
    pub path: PathBuf,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UninstallOutcome {
    pub package: PackageId,
    pub removed: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanReport {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<CleanFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Result of a command, rendered once it finishes
#[derive(Debug, Clone)]
pub enum OperationResult {
    Installed(Vec<InstallResult>),
    Uninstalled(Vec<UninstallOutcome>),
    Status(Vec<PackageStatus>),
    List(Vec<InstalledPackage>),
    Path(PathBuf),
    Cleaned(CleanReport),
}

impl OperationResult {
    /// Serialize the payload as pretty JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        match self {
            Self::Installed(results) => serde_json::to_string_pretty(results),
            Self::Uninstalled(outcomes) => serde_json::to_string_pretty(outcomes),
            Self::Status(statuses) => serde_json::to_string_pretty(statuses),
            Self::List(packages) => serde_json::to_string_pretty(packages),
            Self::Path(path) => serde_json::to_string_pretty(&serde_json::json!({ "path": path })),
            Self::Cleaned(report) => serde_json::to_string_pretty(report),
        }
    }
}

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    json_output: bool,
    colors: bool,
    term: Term,
}

impl OutputRenderer {
    pub fn new(json_output: bool, colors: bool) -> Self {
        Self {
            json_output,
            colors,
            term: Term::stdout(),
        }
    }

    /// Render operation result
    pub fn render_result(&self, result: &OperationResult) -> io::Result<()> {
        if self.json_output {
            let json = result.to_json().map_err(io::Error::other)?;
            self.term.write_line(&json)
        } else {
            self.render_text(result)
        }
    }

    fn render_text(&self, result: &OperationResult) -> io::Result<()> {
        match result {
            OperationResult::Installed(results) => self.render_install_results(results),
            OperationResult::Uninstalled(outcomes) => self.render_uninstalled(outcomes),
            OperationResult::Status(statuses) => self.render_status(statuses),
            OperationResult::List(packages) => self.render_list(packages),
            OperationResult::Path(path) => self.term.write_line(&path.display().to_string()),
            OperationResult::Cleaned(report) => self.render_clean(report),
        }
    }

    fn render_install_results(&self, results: &[InstallResult]) -> io::Result<()> {
        for result in results {
            match (&result.installed_root, &result.error) {
                (Some(root), _) => self.term.write_line(&format!(
                    "{} {:<16} {} ({} in {} ms)",
                    self.ok("installed"),
                    result.package_id.as_str(),
                    root.display(),
                    format_bytes(result.bytes_downloaded),
                    result.duration_ms
                ))?,
                (None, Some(failure)) => self.term.write_line(&format!(
                    "{} {:<16} [{} during {}] {}",
                    self.bad("failed"),
                    result.package_id.as_str(),
                    failure.kind.as_str(),
                    failure.phase,
                    failure.message
                ))?,
                (None, None) => {}
            }
        }
        Ok(())
    }

    fn render_uninstalled(&self, outcomes: &[UninstallOutcome]) -> io::Result<()> {
        for outcome in outcomes {
            let label = if outcome.removed {
                self.ok("removed")
            } else {
                self.dim("absent")
            };
            self.term.write_line(&format!("{label} {}", outcome.package))?;
        }
        Ok(())
    }

    fn render_status(&self, statuses: &[PackageStatus]) -> io::Result<()> {
        if statuses.is_empty() {
            return self.term.write_line("Catalog is empty.");
        }
        self.term.write_line(&format!(
            "{:<16} {:<14} {:>10}  {}",
            "PACKAGE", "STATE", "SIZE", "SOURCE"
        ))?;
        for status in statuses {
            let state = match (&status.in_flight, status.installed) {
                (Some(phase), _) => phase.clone(),
                (None, true) => "installed".to_string(),
                (None, false) => "not installed".to_string(),
            };
            let size = status
                .size_bytes
                .unwrap_or(status.declared_size_bytes);
            self.term.write_line(&format!(
                "{:<16} {:<14} {:>10}  {}",
                status.package.as_str(),
                state,
                format_bytes(size),
                status.source_url
            ))?;
        }
        Ok(())
    }

    fn render_list(&self, packages: &[InstalledPackage]) -> io::Result<()> {
        if packages.is_empty() {
            return self.term.write_line("No packages installed.");
        }
        for package in packages {
            self.term.write_line(&format!(
                "{:<16} {:>10}  {}",
                package.package.as_str(),
                format_bytes(package.size_bytes),
                package.path.display()
            ))?;
        }
        Ok(())
    }

    fn render_clean(&self, report: &CleanReport) -> io::Result<()> {
        if report.removed.is_empty() && report.failed.is_empty() {
            return self.term.write_line("Nothing to clean.");
        }
        for path in &report.removed {
            self.term
                .write_line(&format!("{} {}", self.ok("removed"), path.display()))?;
        }
        for failure in &report.failed {
            self.term.write_line(&format!(
                "{} {}: {}",
                self.bad("failed"),
                failure.path.display(),
                failure.error
            ))?;
        }
        Ok(())
    }

    fn ok(&self, text: &str) -> String {
        if self.colors {
            style(text).green().to_string()
        } else {
            text.to_string()
        }
    }

    fn bad(&self, text: &str) -> String {
        if self.colors {
            style(text).red().bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.colors {
            style(text).dim().to_string()
        } else {
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_json_is_plain_array() {
        let result = OperationResult::List(vec![InstalledPackage {
            package: PackageId::new("quran").unwrap(),
            path: PathBuf::from("/data/content/quran"),
            size_bytes: 2_453_000,
        }]);
        let value: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(value[0]["package"], "quran");
        assert_eq!(value[0]["size_bytes"], 2_453_000);
    }

    #[test]
    fn test_status_json_skips_absent_fields() {
        let result = OperationResult::Status(vec![PackageStatus {
            package: PackageId::new("duas").unwrap(),
            installed: false,
            in_flight: None,
            size_bytes: None,
            declared_size_bytes: 1024,
            source_url: "https://cdn.example.com/duas.zip".into(),
        }]);
        let json = result.to_json().unwrap();
        assert!(!json.contains("size_bytes\": null"));
        assert!(!json.contains("in_flight"));
        assert!(json.contains("\"installed\": false"));
    }
}
