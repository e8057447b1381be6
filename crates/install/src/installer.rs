//! Main installer implementation

use crate::hooks::InstallHook;
use crate::inflight::{InFlight, InFlightGuard};
use crate::staging::{stage_pass, verify_expected_entries, StagingGuard};
use bytes::Bytes;
use hafiz_archive::DecodeOptions;
use hafiz_config::{Config, InstallConfig};
use hafiz_errors::{Error, InstallError};
use hafiz_events::{
    AppEvent, EventEmitter, EventSender, FailureContext, InstallEvent, NoProgress, ProgressSink,
};
use hafiz_net::{DownloadConfig, DownloadRequest, Downloader, NetClient, NetConfig};
use hafiz_store::ContentStore;
use hafiz_types::{
    InstallFailure, InstallPhase, InstallResult, PackageDescriptor, PackageId, StagingPass,
    TransferState,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Files an attempt created outside the final namespace
struct Attempt {
    temp_path: PathBuf,
    staging: Option<StagingGuard>,
    transfer: TransferState,
}

/// Installs, replaces and removes content packages
#[derive(Clone)]
pub struct Installer {
    store: ContentStore,
    downloader: Downloader,
    config: InstallConfig,
    inflight: InFlight,
    hooks: Vec<Arc<dyn InstallHook>>,
    event_sender: Option<EventSender>,
}

impl std::fmt::Debug for Installer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Installer")
            .field("root", &self.store.root())
            .field("config", &self.config)
            .field("hooks", &self.hooks.iter().map(|h| h.name()).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl EventEmitter for Installer {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

impl Installer {
    /// Create new installer
    #[must_use]
    pub fn new(store: ContentStore, downloader: Downloader, config: InstallConfig) -> Self {
        Self {
            store,
            downloader,
            config,
            inflight: InFlight::new(),
            hooks: Vec::new(),
            event_sender: None,
        }
    }

    /// Build an installer from application configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let client = NetClient::new(NetConfig::from(&config.network))?;
        let downloader = Downloader::new(client, DownloadConfig::from(&config.network));
        let store = ContentStore::new(config.content_root());
        Ok(Self::new(store, downloader, config.install.clone()))
    }

    /// Publish events from the installer and its downloader
    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.downloader = self.downloader.with_event_sender(tx.clone());
        self.event_sender = Some(tx);
        self
    }

    #[must_use]
    pub fn with_hook<H: InstallHook + 'static>(mut self, hook: H) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    /// Phase of an attempt currently running for `package`
    #[must_use]
    pub fn in_flight(&self, package: &PackageId) -> Option<InstallPhase> {
        self.inflight.phase(package)
    }

    /// Whether a complete install of `package` is present
    pub async fn exists(&self, package: &PackageId) -> bool {
        self.store.exists(package).await
    }

    /// Remove an installed package; absent packages are a no-op.
    /// Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyInProgress` if an install of the same id is running,
    /// or a storage error if the namespace cannot be moved aside.
    pub async fn uninstall(&self, package: &PackageId) -> Result<bool, Error> {
        let _guard = self
            .inflight
            .claim(package, self.event_sender.clone())
            .inspect_err(|_| self.rejected(package))?;

        let existed = self.store.uninstall(package).await?;
        tracing::info!(package = %package, existed, "uninstalled");
        self.emit(AppEvent::Install(InstallEvent::Uninstalled {
            package: package.to_string(),
            existed,
        }));
        Ok(existed)
    }

    /// Download, stage and commit one package.
    ///
    /// Always (re)installs; an existing install is replaced atomically.
    /// Never panics on a failed attempt: every outcome, including
    /// cancellation and rejection of a concurrent attempt, is reported in
    /// the returned [`InstallResult`].
    pub async fn install(
        &self,
        descriptor: &PackageDescriptor,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> InstallResult {
        let start = Instant::now();
        let package = descriptor.id.clone();

        let mut guard = match self.inflight.claim(&package, self.event_sender.clone()) {
            Ok(guard) => guard,
            Err(e) => {
                tracing::warn!(package = %package, "install rejected: attempt already in flight");
                self.rejected(&package);
                let failure = InstallFailure::from_error(&e, InstallPhase::Idle);
                return InstallResult::failed(package, failure);
            }
        };

        self.emit(AppEvent::Install(InstallEvent::Started {
            package: package.to_string(),
            url: descriptor.source_url.clone(),
            target: self.store.package_root(&package),
        }));

        let temp_path = self.store.download_path(&package);
        let mut attempt = Attempt {
            transfer: TransferState::new(temp_path.clone()),
            temp_path,
            staging: None,
        };

        let result = self
            .run(descriptor, progress, cancel, &mut guard, &mut attempt)
            .await;
        let elapsed = start.elapsed();
        let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(root) => {
                tracing::info!(package = %package, root = %root.display(), duration_ms, "installed");
                self.emit(AppEvent::Install(InstallEvent::Completed {
                    package: package.to_string(),
                    installed_root: root.clone(),
                    duration: elapsed,
                }));
                InstallResult::success(package, root)
                    .with_stats(attempt.transfer.written_bytes, duration_ms)
            }
            Err(e) => {
                let phase = guard.phase();
                self.abandon(&package, attempt.temp_path.as_path(), attempt.staging.take())
                    .await;
                self.finish_failed(&mut guard, &package, phase, &e);
                InstallResult::failed(package, InstallFailure::from_error(&e, phase))
                    .with_stats(attempt.transfer.written_bytes, duration_ms)
            }
        }
    }

    /// Install several packages concurrently, at most
    /// `install.max_concurrent` at a time. Results keep input order.
    pub async fn install_many(
        &self,
        descriptors: &[PackageDescriptor],
        cancel: &CancellationToken,
    ) -> Vec<InstallResult> {
        let semaphore = Semaphore::new(self.config.max_concurrent.max(1));
        let installs = descriptors.iter().map(|descriptor| {
            let semaphore = &semaphore;
            async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    let err = Error::internal("install semaphore closed");
                    return InstallResult::failed(
                        descriptor.id.clone(),
                        InstallFailure::from_error(&err, InstallPhase::Idle),
                    );
                };
                self.install(descriptor, &NoProgress, cancel).await
            }
        });
        futures::future::join_all(installs).await
    }

    async fn run(
        &self,
        descriptor: &PackageDescriptor,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
        guard: &mut InFlightGuard,
        attempt: &mut Attempt,
    ) -> Result<PathBuf, Error> {
        let package = &descriptor.id;

        guard.transition(InstallPhase::Downloading)?;
        self.store.ensure_layout().await?;
        check_cancelled(cancel)?;

        let request = DownloadRequest::new(&descriptor.source_url, &attempt.temp_path)
            .with_package(package.as_str())
            .with_expected_hash(descriptor.expected_hash.clone())
            .with_declared_size(descriptor.declared_size_bytes);
        self.downloader
            .download_into(&request, progress, cancel, &mut attempt.transfer)
            .await?;

        guard.transition(InstallPhase::Extracting)?;
        check_cancelled(cancel)?;
        for hook in &self.hooks {
            hook.before_extract(package, &attempt.temp_path)?;
        }

        let archive = Bytes::from(
            tokio::fs::read(&attempt.temp_path)
                .await
                .map_err(|e| InstallError::filesystem("read_archive", &attempt.temp_path, &e))?,
        );
        let staging = attempt
            .staging
            .insert(StagingGuard::create(self.store.staging_dir(package)).await?);
        let staging_path = staging.path()?.to_path_buf();
        let options = DecodeOptions {
            max_entry_size: self.config.max_entry_size,
            ..DecodeOptions::default()
        };

        for pass in [StagingPass::Directories, StagingPass::Files] {
            check_cancelled(cancel)?;
            self.emit(AppEvent::Install(InstallEvent::StagingPassStarted {
                package: package.to_string(),
                pass,
                staging_path: staging_path.clone(),
            }));

            let stats = stage_pass(
                archive.clone(),
                staging_path.clone(),
                pass,
                options,
                cancel.clone(),
            )
            .await?;

            tracing::debug!(package = %package, %pass, entries = stats.entries, bytes = stats.bytes_written, "staging pass completed");
            self.emit(AppEvent::Install(InstallEvent::StagingPassCompleted {
                package: package.to_string(),
                pass,
                entries: stats.entries,
                bytes_written: stats.bytes_written,
            }));
            for hook in &self.hooks {
                hook.after_pass(package, pass, &staging_path)?;
            }
        }

        if let Some(expected) = &descriptor.expected_entries {
            verify_expected_entries(&staging_path, expected)?;
        }
        // Last point at which cancellation is honoured
        check_cancelled(cancel)?;

        guard.transition(InstallPhase::Committing)?;
        for hook in &self.hooks {
            hook.before_commit(package, &staging_path)?;
        }
        let commit = self.store.commit(&staging_path, package).await?;
        staging.disarm();

        let root = self.store.package_root(package);
        self.emit(AppEvent::Install(InstallEvent::Committed {
            package: package.to_string(),
            installed_root: root.clone(),
            replaced_existing: commit.replaced_existing,
        }));
        guard.transition(InstallPhase::Installed)?;

        if let Err(e) = remove_file(&attempt.temp_path).await {
            self.cleanup_failed(package, &attempt.temp_path, &e);
        }
        Ok(root)
    }

    /// Remove everything a failed or cancelled attempt left behind.
    /// Failures are reported, never returned.
    async fn abandon(&self, package: &PackageId, temp_path: &Path, staging: Option<StagingGuard>) {
        if let Some(staging) = staging {
            if let Err((path, e)) = staging.cleanup().await {
                self.cleanup_failed(package, &path, &e);
            }
        }
        if let Err(e) = remove_file(temp_path).await {
            self.cleanup_failed(package, temp_path, &e);
        }
    }

    fn finish_failed(
        &self,
        guard: &mut InFlightGuard,
        package: &PackageId,
        phase: InstallPhase,
        error: &Error,
    ) {
        let terminal = if error.is_cancelled() {
            InstallPhase::Cancelled
        } else {
            InstallPhase::Failed
        };
        if let Err(e) = guard.transition(terminal) {
            tracing::debug!(package = %package, error = %e, "terminal phase not recorded");
        }

        if error.is_cancelled() {
            tracing::info!(package = %package, %phase, "install cancelled");
            self.emit(AppEvent::Install(InstallEvent::Cancelled {
                package: package.to_string(),
                phase,
            }));
        } else {
            tracing::warn!(package = %package, %phase, error = %error, "install failed");
            self.emit(AppEvent::Install(InstallEvent::Failed {
                package: package.to_string(),
                phase,
                failure: FailureContext::from_error(error),
            }));
        }
    }

    fn rejected(&self, package: &PackageId) {
        self.emit(AppEvent::Install(InstallEvent::Rejected {
            package: package.to_string(),
        }));
    }

    fn cleanup_failed(&self, package: &PackageId, path: &Path, error: &Error) {
        tracing::warn!(package = %package, path = %path.display(), error = %error, "cleanup failed");
        self.emit(AppEvent::Install(InstallEvent::CleanupFailed {
            package: package.to_string(),
            path: path.to_path_buf(),
            error: error.to_string(),
        }));
    }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<(), Error> {
    if cancel.is_cancelled() {
        Err(Error::Cancelled)
    } else {
        Ok(())
    }
}

async fn remove_file(path: &Path) -> Result<(), Error> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(InstallError::filesystem("remove_temp_file", path, &e).into()),
    }
}
