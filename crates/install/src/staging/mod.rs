//! Staging of decoded archives
//!
//! Extraction happens in two passes over two independent decodes of the
//! same bytes: every implied directory first, then every file. Pass 1
//! completes before pass 2 starts. Both run on the blocking pool.

mod guard;
mod materialize;

pub(crate) use guard::StagingGuard;
pub use materialize::PassStats;

use bytes::Bytes;
use hafiz_archive::{DecodeOptions, EntryPath};
use hafiz_errors::{ArchiveError, Error, InstallError};
use hafiz_types::StagingPass;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Run one staging pass on the blocking pool
pub(crate) async fn stage_pass(
    archive: Bytes,
    staging: PathBuf,
    pass: StagingPass,
    options: DecodeOptions,
    cancel: CancellationToken,
) -> Result<PassStats, Error> {
    tokio::task::spawn_blocking(move || {
        materialize::run_pass(archive, &staging, pass, options, &cancel)
    })
    .await
    .map_err(|e| InstallError::TaskError {
        message: format!("{pass} pass task failed: {e}"),
    })?
}

/// Check that every declared entry exists under `staging`.
///
/// # Errors
///
/// Returns [`ArchiveError::MissingEntries`] listing what is absent, in
/// sorted order.
pub fn verify_expected_entries(staging: &Path, expected: &BTreeSet<String>) -> Result<(), Error> {
    let missing: Vec<String> = expected
        .iter()
        .filter(|name| {
            EntryPath::parse(name)
                .map(|path| !path.to_path(staging).exists())
                .unwrap_or(true)
        })
        .cloned()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ArchiveError::MissingEntries { missing }.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_verify_expected_entries() {
        let temp = tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("ayah/1")).unwrap();
        std::fs::write(temp.path().join("ayah/1/1.json"), "{}").unwrap();

        let present: BTreeSet<String> = ["ayah/1/1.json", "ayah/1/", "./ayah"]
            .into_iter()
            .map(String::from)
            .collect();
        verify_expected_entries(temp.path(), &present).unwrap();

        let expected: BTreeSet<String> = ["ayah/1/1.json", "reciters.json", "../escape"]
            .into_iter()
            .map(String::from)
            .collect();
        match verify_expected_entries(temp.path(), &expected) {
            Err(Error::Archive(ArchiveError::MissingEntries { missing })) => {
                assert_eq!(missing, ["../escape", "reciters.json"]);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }
}
