//! RAII guard for automatic staging directory cleanup

use hafiz_errors::{Error, InstallError};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Owns a staging directory until it is committed or removed.
///
/// Dropping an armed guard removes the tree synchronously, so a panicking
/// or aborted install never leaves staging behind. The normal paths use
/// [`cleanup`](Self::cleanup) to observe failures, or
/// [`disarm`](Self::disarm) once the tree has been renamed away.
#[derive(Debug)]
pub struct StagingGuard {
    path: Option<PathBuf>,
}

impl StagingGuard {
    /// Create the staging directory and guard it
    ///
    /// # Errors
    ///
    /// Returns a filesystem error if the directory cannot be created
    pub async fn create(path: PathBuf) -> Result<Self, Error> {
        fs::create_dir_all(&path)
            .await
            .map_err(|e| InstallError::filesystem("create_staging_dir", &path, &e))?;
        Ok(Self { path: Some(path) })
    }

    /// Path of the guarded directory
    ///
    /// # Errors
    ///
    /// Returns an error if the guard was already disarmed
    pub fn path(&self) -> Result<&Path, Error> {
        self.path.as_deref().ok_or_else(|| {
            InstallError::AtomicOperationFailed {
                message: "staging directory already released".to_string(),
            }
            .into()
        })
    }

    /// Stop guarding: the tree now belongs to someone else
    pub fn disarm(&mut self) {
        self.path = None;
    }

    /// Remove the staging tree now.
    ///
    /// # Errors
    ///
    /// Returns the removal error with the path that could not be removed.
    pub async fn cleanup(mut self) -> Result<(), (PathBuf, Error)> {
        let Some(path) = self.path.take() else {
            return Ok(());
        };
        match fs::remove_dir_all(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                let err = InstallError::filesystem("remove_staging_dir", &path, &e).into();
                Err((path, err))
            }
        }
    }
}

impl Drop for StagingGuard {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            // Best effort cleanup - ignore errors in destructor
            let _ = std::fs::remove_dir_all(&path);
        }
    }
}
