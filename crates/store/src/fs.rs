//! Filesystem helpers with storage error mapping

use hafiz_errors::{Error, StorageError};
use std::path::Path;
use tokio::fs;

type Result<T> = std::result::Result<T, Error>;

/// Check whether a path exists
pub async fn exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

/// Check whether a path is an existing directory (symlinks not followed)
pub async fn is_dir(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .await
        .is_ok_and(|metadata| metadata.is_dir())
}

/// Create a directory and all its parents
///
/// # Errors
///
/// Returns an error if directory creation fails
pub async fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| StorageError::from_io_with_path(&e, path).into())
}

/// Remove a directory tree
///
/// # Errors
///
/// Returns an error if removal fails
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    fs::remove_dir_all(path)
        .await
        .map_err(|e| StorageError::from_io_with_path(&e, path).into())
}

/// Remove a file or directory tree; a missing path is not an error
///
/// # Errors
///
/// Returns an error if the path exists and cannot be removed
pub async fn remove_path(path: &Path) -> Result<()> {
    let metadata = match fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(StorageError::from_io_with_path(&e, path).into()),
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::from_io_with_path(&e, path).into()),
    }
}

/// Rename within one filesystem
///
/// # Errors
///
/// Returns [`StorageError::AtomicRenameFailed`] if the rename fails
pub async fn atomic_rename(src: &Path, dst: &Path) -> Result<()> {
    fs::rename(src, dst).await.map_err(|e| {
        StorageError::AtomicRenameFailed {
            message: format!("{} -> {}: {e}", src.display(), dst.display()),
        }
        .into()
    })
}

/// Total size of all regular files below `path`
///
/// # Errors
///
/// Returns an error if the tree cannot be walked
pub async fn size(path: &Path) -> Result<u64> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || walk_size(&path))
        .await
        .map_err(|e| Error::internal(format!("size task failed: {e}")))?
}

fn walk_size(path: &Path) -> Result<u64> {
    let metadata =
        std::fs::symlink_metadata(path).map_err(|e| StorageError::from_io_with_path(&e, path))?;
    if !metadata.is_dir() {
        return Ok(metadata.len());
    }

    let mut total = 0u64;
    let entries = std::fs::read_dir(path).map_err(|e| StorageError::from_io_with_path(&e, path))?;
    for entry in entries {
        let entry = entry.map_err(|e| StorageError::from_io_with_path(&e, path))?;
        total = total.saturating_add(walk_size(&entry.path())?);
    }
    Ok(total)
}
