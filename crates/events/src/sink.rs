//! Progress sinks and human-readable progress formatting

/// Receives byte-level download progress.
///
/// Called with the bytes written so far (including a resumed prefix) and
/// the total size when the server announced it. Calls are non-decreasing
/// in `written` and stop once the download returns.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, written: u64, total: Option<u64>);
}

impl<F> ProgressSink for F
where
    F: Fn(u64, Option<u64>) + Send + Sync,
{
    fn on_progress(&self, written: u64, total: Option<u64>) {
        self(written, total);
    }
}

/// Sink that discards every update
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _written: u64, _total: Option<u64>) {}
}

const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

fn unit_for(bytes: u64) -> usize {
    let mut size = bytes;
    let mut unit_index = 0;
    while size >= 1024 && unit_index < UNITS.len() - 1 {
        size /= 1024;
        unit_index += 1;
    }
    unit_index
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn format_in_unit(bytes: u64, unit_index: usize) -> String {
    if unit_index == 0 {
        return format!("{bytes} B");
    }
    let value = bytes as f64 / 1024f64.powi(unit_index as i32);
    format!("{value:.1} {}", UNITS[unit_index])
}

/// Format byte size in human readable format
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    format_in_unit(bytes, unit_for(bytes))
}

/// Render a progress line such as `42% (1.0 MB / 2.3 MB)`.
///
/// Both sizes share the unit of the total. Without a total only the
/// written size is shown.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn format_progress(written: u64, total: Option<u64>) -> String {
    match total {
        Some(total) if total > 0 => {
            let unit = unit_for(total);
            let percent = (u128::from(written.min(total)) * 100 / u128::from(total)) as u64;
            format!(
                "{percent}% ({} / {})",
                format_in_unit(written, unit),
                format_in_unit(total, unit)
            )
        }
        _ => format_bytes(written),
    }
}
