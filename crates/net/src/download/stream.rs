//! Low-level streaming download mechanics

use super::config::DownloadConfig;
use fs2::FileExt;
use futures::StreamExt;
use hafiz_errors::{Error, NetworkError};
use hafiz_hash::{Hash, StreamingHasher};
use hafiz_types::TransferState;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// RAII guard for the download lock file.
///
/// Holds an exclusive advisory lock on `<dest>.lock`. The kernel drops the
/// lock when the owning process exits, so a file left behind by a killed
/// process does not block the next attempt.
pub(super) struct LockGuard {
    path: PathBuf,
    file: std::fs::File,
}

impl LockGuard {
    /// Claim `<dest>.lock`, failing if another writer holds it
    pub(super) async fn acquire(dest_path: &Path) -> Result<Self, Error> {
        let lock_path = dest_path.with_extension("lock");
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .await
            .map_err(|e| Error::io_with_path(&e, &lock_path))?
            .into_std()
            .await;

        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => Ok(Self {
                path: lock_path,
                file,
            }),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                Err(NetworkError::Locked {
                    path: dest_path.display().to_string(),
                }
                .into())
            }
            Err(e) => Err(Error::io_with_path(&e, &lock_path)),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        // Remove while still locked; the handle closes after this
        let _ = std::fs::remove_file(&self.path);
        let _ = FileExt::unlock(&self.file);
    }
}

/// Rate limiter for progress reports.
///
/// Reports only when the written count changed, at most once per interval,
/// and always lets the final count through.
#[derive(Debug)]
pub(super) struct ProgressThrottle {
    interval: Duration,
    last_at: Option<Instant>,
    last_written: Option<u64>,
}

impl ProgressThrottle {
    pub(super) fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_at: None,
            last_written: None,
        }
    }

    pub(super) fn should_report(&mut self, written: u64) -> bool {
        if self.last_written == Some(written) {
            return false;
        }
        let due = self
            .last_at
            .is_none_or(|at| at.elapsed() >= self.interval);
        if due {
            self.last_at = Some(Instant::now());
            self.last_written = Some(written);
        }
        due
    }

    pub(super) fn finish(&mut self, written: u64) -> bool {
        if self.last_written == Some(written) {
            return false;
        }
        self.last_written = Some(written);
        true
    }
}

/// Open the temp file, appending to a kept prefix or starting empty
pub(super) async fn open_destination(dest_path: &Path, append: bool) -> Result<File, Error> {
    let mut options = OpenOptions::new();
    options.create(true).write(true);
    if append {
        options.append(true);
    } else {
        options.truncate(true);
    }
    options
        .open(dest_path)
        .await
        .map_err(|e| Error::io_with_path(&e, dest_path))
}

/// Per-transfer inputs to [`stream_body`]
pub(super) struct StreamParams<'a> {
    pub url: &'a str,
    pub config: &'a DownloadConfig,
    pub cancel: &'a CancellationToken,
}

/// Stream a response body into `file`, hashing and reporting as it goes.
///
/// Each chunk read races the cancellation token and the stall timer. The
/// response is dropped on every early return, which releases the
/// connection.
pub(super) async fn stream_body(
    response: reqwest::Response,
    file: &mut File,
    hasher: &mut StreamingHasher,
    state: &mut TransferState,
    params: &StreamParams<'_>,
    mut report: impl FnMut(u64, Option<u64>),
) -> Result<(), Error> {
    let mut stream = response.bytes_stream();
    let mut throttle = ProgressThrottle::new(params.config.progress_interval);
    let stall = params.config.stall_timeout;

    loop {
        if params.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let next = tokio::select! {
            biased;
            () = params.cancel.cancelled() => return Err(Error::Cancelled),
            next = tokio::time::timeout(stall, stream.next()) => next,
        };

        let chunk = match next {
            Ok(Some(Ok(chunk))) => chunk,
            Ok(Some(Err(e))) => return Err(body_error(&e, params.url, state)),
            Ok(None) => break,
            Err(_) => {
                return Err(NetworkError::Stalled {
                    url: params.url.to_string(),
                    seconds: stall.as_secs(),
                }
                .into());
            }
        };

        let len = chunk.len() as u64;
        if let Some(limit) = params.config.size_limit() {
            let size = state.written_bytes + len;
            if size > limit {
                return Err(NetworkError::FileSizeExceeded { size, limit }.into());
            }
        }

        hasher.update(&chunk);
        file.write_all(&chunk)
            .await
            .map_err(|e| Error::io_with_path(&e, &state.temp_path))?;
        state.advance(len);

        if throttle.should_report(state.written_bytes) {
            report(state.written_bytes, state.total_bytes);
        }
    }

    file.flush()
        .await
        .map_err(|e| Error::io_with_path(&e, &state.temp_path))?;

    if let Some(expected) = state.total_bytes {
        if state.written_bytes < expected {
            return Err(truncated(params.url, state.written_bytes, expected));
        }
    }

    if throttle.finish(state.written_bytes) {
        report(state.written_bytes, state.total_bytes);
    }
    Ok(())
}

fn truncated(url: &str, received: u64, expected: u64) -> Error {
    NetworkError::Truncated {
        url: url.to_string(),
        received,
        expected,
    }
    .into()
}

/// Classify an error raised while reading the body
fn body_error(error: &reqwest::Error, url: &str, state: &TransferState) -> Error {
    if error.is_timeout() {
        return NetworkError::Timeout {
            url: url.to_string(),
        }
        .into();
    }
    match state.total_bytes {
        Some(expected) if state.written_bytes < expected => {
            truncated(url, state.written_bytes, expected)
        }
        _ => NetworkError::DownloadFailed(error.to_string()).into(),
    }
}

/// Verify download hash matches expected, deleting the file on mismatch
pub(super) fn verify_hash(
    final_hash: &Hash,
    expected_hash: Option<&Hash>,
    dest_path: &Path,
) -> Result<(), Error> {
    if let Some(expected) = expected_hash {
        if final_hash != expected {
            let _ = std::fs::remove_file(dest_path);
            return Err(NetworkError::ChecksumMismatch {
                expected: expected.to_hex(),
                actual: final_hash.to_hex(),
            }
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test(start_paused = true)]
    async fn test_throttle_rate_limits() {
        let mut throttle = ProgressThrottle::new(Duration::from_millis(50));
        assert!(throttle.should_report(10));
        assert!(!throttle.should_report(20));

        tokio::time::advance(Duration::from_millis(60)).await;
        assert!(!throttle.should_report(10));
        assert!(throttle.should_report(30));

        assert!(throttle.finish(40));
        assert!(!throttle.finish(40));
    }

    #[tokio::test]
    async fn test_throttle_skips_final_duplicate() {
        let mut throttle = ProgressThrottle::new(Duration::ZERO);
        assert!(throttle.should_report(100));
        assert!(!throttle.finish(100));
    }

    #[tokio::test]
    async fn test_lock_guard_excludes_second_writer() {
        let temp = tempdir().unwrap();
        let dest = temp.path().join("quran.zip.partial");

        let guard = LockGuard::acquire(&dest).await.unwrap();
        assert!(temp.path().join("quran.zip.lock").exists());
        assert!(matches!(
            LockGuard::acquire(&dest).await,
            Err(Error::Network(NetworkError::Locked { .. }))
        ));

        drop(guard);
        assert!(!temp.path().join("quran.zip.lock").exists());
        assert!(LockGuard::acquire(&dest).await.is_ok());
    }

    #[tokio::test]
    async fn test_lock_guard_reclaims_leftover_file() {
        let temp = tempdir().unwrap();
        let dest = temp.path().join("quran.zip.partial");
        std::fs::write(temp.path().join("quran.zip.lock"), b"").unwrap();

        let guard = LockGuard::acquire(&dest).await.unwrap();
        drop(guard);
        assert!(!temp.path().join("quran.zip.lock").exists());
    }

    #[tokio::test]
    async fn test_verify_hash_removes_mismatch() {
        let temp = tempdir().unwrap();
        let dest = temp.path().join("a.partial");
        std::fs::write(&dest, b"abc").unwrap();

        let actual = Hash::from_data(b"abc");
        verify_hash(&actual, None, &dest).unwrap();
        verify_hash(&actual, Some(&actual), &dest).unwrap();
        assert!(dest.exists());

        let other = Hash::from_data(b"xyz");
        assert!(matches!(
            verify_hash(&actual, Some(&other), &dest),
            Err(Error::Network(NetworkError::ChecksumMismatch { .. }))
        ));
        assert!(!dest.exists());
    }
}
