#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Content store for hafiz
//!
//! This crate manages the content root where each installed package lives
//! in its own namespace directory, `<root>/<package-id>/`. A namespace is
//! either absent or complete: it only ever appears through a rename of a
//! fully staged tree and disappears through a rename into the trash.
//!
//! Work areas live next to the namespaces under dot-prefixed names that no
//! package id can take:
//!
//! - `.staging/` per-attempt extraction directories
//! - `.downloads/` partial archive downloads
//! - `.trash/` trees waiting for deletion

pub mod fs;

use hafiz_errors::{Error, StorageError};
use hafiz_types::PackageId;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

pub const STAGING_DIR: &str = ".staging";
pub const DOWNLOADS_DIR: &str = ".downloads";
pub const TRASH_DIR: &str = ".trash";

/// What a commit did to the namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitOutcome {
    /// A previous install was swapped out
    pub replaced_existing: bool,
}

/// Leftovers removed by [`ContentStore::cleanup_stale`]
#[derive(Debug, Clone, Default)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Store manager for installed content packages
#[derive(Clone, Debug)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    /// Create a new store instance
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the content root and its work areas
    ///
    /// # Errors
    ///
    /// Returns an error if any directory cannot be created
    pub async fn ensure_layout(&self) -> Result<(), Error> {
        for dir in [STAGING_DIR, DOWNLOADS_DIR, TRASH_DIR] {
            fs::create_dir_all(&self.root.join(dir)).await?;
        }
        Ok(())
    }

    /// Namespace directory of a package, whether or not it exists
    #[must_use]
    pub fn package_root(&self, id: &PackageId) -> PathBuf {
        self.root.join(id.as_str())
    }

    /// Whether a package is installed
    pub async fn exists(&self, id: &PackageId) -> bool {
        fs::is_dir(&self.package_root(id)).await
    }

    /// Resolve a path inside a package namespace
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidPath`] if `relative` is absolute or
    /// would climb out of the namespace.
    pub fn path(&self, id: &PackageId, relative: &str) -> Result<PathBuf, Error> {
        let invalid = || StorageError::InvalidPath {
            path: relative.to_string(),
        };

        let mut path = self.package_root(id);
        for component in Path::new(&relative.replace('\\', "/")).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(invalid().into());
                }
            }
        }
        Ok(path)
    }

    /// Installed package ids, sorted
    ///
    /// # Errors
    ///
    /// Returns an error if the content root exists but cannot be read
    pub async fn list(&self) -> Result<Vec<PackageId>, Error> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::from_io_with_path(&e, &self.root).into()),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, &self.root))?
        {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.starts_with('.') || !fs::is_dir(&entry.path()).await {
                continue;
            }
            if let Ok(id) = PackageId::new(name) {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Disk usage of an installed package
    ///
    /// # Errors
    ///
    /// Returns an error if the package is not installed or cannot be walked
    pub async fn package_size(&self, id: &PackageId) -> Result<u64, Error> {
        fs::size(&self.package_root(id)).await
    }

    /// Fresh, unique staging directory path for one install attempt.
    /// The directory itself is not created.
    #[must_use]
    pub fn staging_dir(&self, id: &PackageId) -> PathBuf {
        self.root
            .join(STAGING_DIR)
            .join(format!("{id}-{}", Uuid::new_v4()))
    }

    /// Partial download location of a package archive
    #[must_use]
    pub fn download_path(&self, id: &PackageId) -> PathBuf {
        self.root
            .join(DOWNLOADS_DIR)
            .join(format!("{id}.zip.partial"))
    }

    fn trash_path(&self, id: &PackageId) -> PathBuf {
        self.root
            .join(TRASH_DIR)
            .join(format!("{id}-{}", Uuid::new_v4()))
    }

    /// Move a fully staged tree into the package namespace.
    ///
    /// An existing install is renamed into the trash first and deleted once
    /// the new tree is in place. If the staged tree cannot be moved in, the
    /// old tree is renamed back. Readers see either the old or the new tree,
    /// never a mix.
    ///
    /// # Errors
    ///
    /// Returns an error if a rename fails; the namespace is then unchanged.
    pub async fn commit(&self, staging: &Path, id: &PackageId) -> Result<CommitOutcome, Error> {
        let target = self.package_root(id);

        if !fs::exists(staging).await {
            return Err(StorageError::PathNotFound {
                path: staging.display().to_string(),
            }
            .into());
        }

        if !fs::exists(&target).await {
            fs::atomic_rename(staging, &target).await?;
            tracing::debug!(package = %id, target = %target.display(), "committed new install");
            return Ok(CommitOutcome {
                replaced_existing: false,
            });
        }

        let trash = self.trash_path(id);
        fs::create_dir_all(&self.root.join(TRASH_DIR)).await?;
        fs::atomic_rename(&target, &trash).await?;

        if let Err(e) = fs::atomic_rename(staging, &target).await {
            if let Err(restore) = fs::atomic_rename(&trash, &target).await {
                tracing::error!(
                    package = %id,
                    trash = %trash.display(),
                    error = %restore,
                    "failed to restore previous install"
                );
            }
            return Err(e);
        }

        if let Err(e) = fs::remove_path(&trash).await {
            tracing::warn!(package = %id, path = %trash.display(), error = %e, "failed to delete replaced install");
        }
        tracing::debug!(package = %id, target = %target.display(), "replaced existing install");
        Ok(CommitOutcome {
            replaced_existing: true,
        })
    }

    /// Remove an installed package. Absent packages are a no-op.
    ///
    /// The namespace is renamed into the trash before deletion, so it
    /// reads as absent as soon as this starts deleting.
    /// Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace cannot be moved aside
    pub async fn uninstall(&self, id: &PackageId) -> Result<bool, Error> {
        let target = self.package_root(id);
        if !fs::exists(&target).await {
            return Ok(false);
        }

        let trash = self.trash_path(id);
        fs::create_dir_all(&self.root.join(TRASH_DIR)).await?;
        fs::atomic_rename(&target, &trash).await?;

        if let Err(e) = fs::remove_path(&trash).await {
            tracing::warn!(package = %id, path = %trash.display(), error = %e, "failed to delete uninstalled tree");
        }
        Ok(true)
    }

    /// Sweep work-area leftovers older than `older_than`.
    ///
    /// Anything an interrupted process left in `.staging`, `.downloads` or
    /// `.trash` is removed. Failures are collected, not returned.
    ///
    /// # Errors
    ///
    /// Returns an error only if a work area exists but cannot be listed
    pub async fn cleanup_stale(&self, older_than: Duration) -> Result<CleanupReport, Error> {
        let mut report = CleanupReport::default();
        let now = SystemTime::now();

        for area in [STAGING_DIR, DOWNLOADS_DIR, TRASH_DIR] {
            let dir = self.root.join(area);
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StorageError::from_io_with_path(&e, &dir).into()),
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| StorageError::from_io_with_path(&e, &dir))?
            {
                let path = entry.path();
                let age = entry
                    .metadata()
                    .await
                    .ok()
                    .and_then(|m| m.modified().ok())
                    .and_then(|modified| now.duration_since(modified).ok())
                    .unwrap_or_default();
                if age < older_than {
                    continue;
                }

                match fs::remove_path(&path).await {
                    Ok(()) => report.removed.push(path),
                    Err(e) => report.failed.push((path, e.to_string())),
                }
            }
        }

        tracing::debug!(
            removed = report.removed.len(),
            failed = report.failed.len(),
            "swept stale work areas"
        );
        Ok(report)
    }
}
