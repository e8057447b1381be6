//! Resume support for interrupted downloads

use hafiz_errors::Error;
use hafiz_hash::StreamingHasher;
use std::path::Path;
use tokio::fs as tokio_fs;

/// Get the offset for resuming a download
///
/// Any non-empty regular file at the destination is a candidate prefix;
/// whether the server honours the range decides if it is kept.
pub(super) async fn get_resume_offset(dest_path: &Path) -> u64 {
    match tokio_fs::metadata(dest_path).await {
        Ok(metadata) if metadata.is_file() => metadata.len(),
        _ => 0,
    }
}

/// Hash the existing prefix so the final digest covers the whole file.
///
/// Returns `None` if the file is shorter than `offset`, in which case the
/// partial file changed underneath us and must not be appended to.
pub(super) async fn prefix_hasher(
    dest_path: &Path,
    offset: u64,
) -> Result<Option<StreamingHasher>, Error> {
    let mut hasher = StreamingHasher::new();
    let read = hasher.update_from_file(dest_path, offset).await?;
    Ok((read == offset).then_some(hasher))
}

/// Remove a partial file that can't be resumed
pub(super) async fn discard_partial(dest_path: &Path) -> Result<(), Error> {
    match tokio_fs::remove_file(dest_path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io_with_path(&e, dest_path)),
    }
}
