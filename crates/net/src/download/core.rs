//! Core downloader implementation

use super::config::{DownloadConfig, DownloadOutcome, DownloadRequest};
use super::resume::{discard_partial, get_resume_offset, prefix_hasher};
use super::stream::{open_destination, stream_body, verify_hash, LockGuard, StreamParams};
use super::validation::{
    announced_total, check_range_start, classify_response, validate_url, ResponsePlan,
};
use crate::client::NetClient;
use hafiz_errors::{Error, NetworkError};
use hafiz_events::{AppEvent, DownloadEvent, EventEmitter, EventSender, ProgressSink};
use hafiz_hash::StreamingHasher;
use hafiz_types::TransferState;
use reqwest::Response;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Streaming archive downloader with resume, stall detection and
/// cooperative cancellation. Never retries on its own.
#[derive(Clone, Debug)]
pub struct Downloader {
    client: NetClient,
    config: DownloadConfig,
    event_sender: Option<EventSender>,
}

impl EventEmitter for Downloader {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

impl Downloader {
    #[must_use]
    pub fn new(client: NetClient, config: DownloadConfig) -> Self {
        Self {
            client,
            config,
            event_sender: None,
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.event_sender = Some(tx);
        self
    }

    #[must_use]
    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Download `request.url` into `request.dest_path`.
    ///
    /// A non-empty file already at the destination is resumed with a range
    /// request when the server supports it. `progress` receives
    /// non-decreasing `(written, total)` pairs and is never called after
    /// this returns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] when `cancel` fires, and a
    /// [`NetworkError`] for connection failures, non-2xx statuses, stalls,
    /// truncated bodies, oversize files and checksum mismatches. The temp
    /// file is left in place except after a checksum mismatch.
    pub async fn download(
        &self,
        request: &DownloadRequest,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<DownloadOutcome, Error> {
        let mut state = TransferState::new(request.dest_path.clone());
        self.download_into(request, progress, cancel, &mut state)
            .await
    }

    /// Like [`Downloader::download`], but records the transfer in a
    /// caller-owned `state` that stays readable when the download fails.
    ///
    /// # Errors
    ///
    /// Same as [`Downloader::download`].
    pub async fn download_into(
        &self,
        request: &DownloadRequest,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
        state: &mut TransferState,
    ) -> Result<DownloadOutcome, Error> {
        let start = Instant::now();
        let result = self.run(request, progress, cancel, state, start).await;

        if let Err(e) = &result {
            if !e.is_cancelled() {
                tracing::debug!(url = %request.url, error = %e, written = state.written_bytes, "download failed");
                self.emit_download_failed(
                    &request.url,
                    request.package.clone(),
                    state.written_bytes,
                    e,
                );
            }
        }
        result
    }

    async fn run(
        &self,
        request: &DownloadRequest,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
        state: &mut TransferState,
        start: Instant,
    ) -> Result<DownloadOutcome, Error> {
        let url = validate_url(&request.url)?.to_string();
        let dest = &request.dest_path;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io_with_path(&e, parent))?;
        }
        let _lock = LockGuard::acquire(dest).await?;

        let mut offset = get_resume_offset(dest).await;
        if offset > 0 {
            self.emit(AppEvent::Download(DownloadEvent::Resuming {
                url: url.clone(),
                package: request.package.clone(),
                resume_offset: offset,
            }));
        }

        let mut response = self.send(&url, offset, cancel).await?;
        let mut plan = classify_response(response.status(), offset)?;

        if plan == ResponsePlan::Unsatisfiable {
            // One plain request after dropping the partial file
            self.range_ignored(request, &url, offset);
            discard_partial(dest).await?;
            offset = 0;
            drop(response);
            response = self.send(&url, 0, cancel).await?;
            plan = classify_response(response.status(), 0)?;
        }

        if plan == ResponsePlan::Fresh && offset > 0 {
            self.range_ignored(request, &url, offset);
            offset = 0;
        }

        let mut hasher = StreamingHasher::new();
        if plan == ResponsePlan::Append {
            check_range_start(&response, offset)?;
            match prefix_hasher(dest, offset).await? {
                Some(seeded) => hasher = seeded,
                None => {
                    return Err(NetworkError::DownloadFailed(format!(
                        "partial file {} changed during resume",
                        dest.display()
                    ))
                    .into());
                }
            }
        }

        state.total_bytes = announced_total(&response, plan, offset);
        state.written_bytes = offset;
        state.resumable = plan == ResponsePlan::Append;
        self.check_sizes(request, &url, state.total_bytes)?;

        self.emit_download_started(
            &url,
            request.package.clone(),
            state.total_bytes,
            offset,
        );

        let mut file = open_destination(dest, plan == ResponsePlan::Append).await?;
        let params = StreamParams {
            url: &url,
            config: &self.config,
            cancel,
        };
        stream_body(
            response,
            &mut file,
            &mut hasher,
            state,
            &params,
            |written, total| {
                progress.on_progress(written, total);
                self.emit_download_progress(&url, request.package.clone(), written, total);
            },
        )
        .await?;
        drop(file);

        let hash = hasher.finalize();
        verify_hash(&hash, request.expected_hash.as_ref(), dest)?;

        let duration = start.elapsed();
        self.emit_download_completed(
            &url,
            request.package.clone(),
            state.written_bytes,
            duration,
            hash.to_hex(),
        );
        tracing::debug!(
            url = %url,
            bytes = state.written_bytes,
            resumed_from = offset,
            elapsed_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            "download completed"
        );

        Ok(DownloadOutcome {
            state: state.clone(),
            hash,
            duration,
            resumed_from: offset,
        })
    }

    /// Send a GET, with a range header when resuming, racing cancellation
    async fn send(
        &self,
        url: &str,
        offset: u64,
        cancel: &CancellationToken,
    ) -> Result<Response, Error> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let range = format!("bytes={offset}-");
        let request = async {
            if offset > 0 {
                self.client
                    .get_with_headers(url, &[("Range", range.as_str())])
                    .await
            } else {
                self.client.get(url).await
            }
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(Error::Cancelled),
            response = request => response,
        }
    }

    fn range_ignored(&self, request: &DownloadRequest, url: &str, discarded_bytes: u64) {
        tracing::debug!(url = %url, discarded_bytes, "server ignored range request, restarting");
        self.emit(AppEvent::Download(DownloadEvent::RangeIgnored {
            url: url.to_string(),
            package: request.package.clone(),
            discarded_bytes,
        }));
    }

    /// Compare the announced size against the limit and the declared size
    fn check_sizes(
        &self,
        request: &DownloadRequest,
        url: &str,
        total: Option<u64>,
    ) -> Result<(), Error> {
        let Some(total) = total else {
            return Ok(());
        };

        if let Some(limit) = self.config.size_limit() {
            if total > limit {
                return Err(NetworkError::FileSizeExceeded { size: total, limit }.into());
            }
        }

        if let Some(declared) = request.declared_size {
            if declared != total {
                tracing::warn!(url = %url, declared, announced = total, "archive size differs from catalog");
                self.emit(AppEvent::Download(DownloadEvent::SizeMismatch {
                    url: url.to_string(),
                    package: request.package.clone(),
                    declared,
                    announced: total,
                }));
            }
        }
        Ok(())
    }
}
