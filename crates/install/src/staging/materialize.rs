//! Writing decoded archive entries into a staging tree

use bytes::Bytes;
use hafiz_archive::{decode_with_options, DecodeOptions};
use hafiz_errors::{Error, InstallError};
use hafiz_types::StagingPass;
use std::collections::HashSet;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// What one staging pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Directories created or files written
    pub entries: usize,
    pub bytes_written: u64,
}

/// Run one pass over a freshly decoded archive. Blocking.
///
/// [`StagingPass::Directories`] creates every directory any entry implies
/// and decodes names only; [`StagingPass::Files`] writes file contents
/// verbatim, creating a missing parent if needed. Cancellation is checked
/// between entries.
pub(super) fn run_pass(
    archive: Bytes,
    staging: &Path,
    pass: StagingPass,
    options: DecodeOptions,
    cancel: &CancellationToken,
) -> Result<PassStats, Error> {
    let options = DecodeOptions {
        names_only: pass == StagingPass::Directories,
        ..options
    };
    let entries = decode_with_options(archive, options)?;
    let mut stats = PassStats::default();
    let mut created: HashSet<String> = HashSet::new();

    for entry in entries {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let entry = entry?;

        match pass {
            StagingPass::Directories => {
                for dir in entry.implied_directories() {
                    if created.contains(dir) {
                        continue;
                    }
                    let path = hafiz_archive::EntryPath::parse(dir)?.to_path(staging);
                    std::fs::create_dir_all(&path)
                        .map_err(|e| InstallError::filesystem("create_dir", &path, &e))?;
                    created.insert(dir.to_string());
                    stats.entries += 1;
                }
            }
            StagingPass::Files => {
                let Some(content) = entry.content.as_deref() else {
                    continue;
                };
                let path = entry.path.to_path(staging);
                if let Some(parent) = path.parent() {
                    if !parent.is_dir() {
                        std::fs::create_dir_all(parent)
                            .map_err(|e| InstallError::filesystem("create_dir", parent, &e))?;
                    }
                }
                std::fs::write(&path, content)
                    .map_err(|e| InstallError::filesystem("write_file", &path, &e))?;
                stats.entries += 1;
                stats.bytes_written += content.len() as u64;
            }
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hafiz_errors::ArchiveError;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn archive(entries: &[(&str, Option<&[u8]>)]) -> Bytes {
        let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, content) in entries {
            match content {
                Some(data) => {
                    writer.start_file(*name, SimpleFileOptions::default()).unwrap();
                    writer.write_all(data).unwrap();
                }
                None => writer
                    .add_directory(*name, SimpleFileOptions::default())
                    .unwrap(),
            }
        }
        Bytes::from(writer.finish().unwrap().into_inner())
    }

    #[test]
    fn test_directories_pass_creates_implied_dirs_only() {
        let temp = tempdir().unwrap();
        let bytes = archive(&[
            ("ayah/1/1.json", Some(b"{}")),
            ("audio/", None),
            ("ayah/1/2.json", Some(b"[]")),
        ]);

        let stats = run_pass(
            bytes,
            temp.path(),
            StagingPass::Directories,
            DecodeOptions::default(),
            &CancellationToken::new(),
        )
        .unwrap();

        assert_eq!(stats.entries, 3);
        assert!(temp.path().join("ayah/1").is_dir());
        assert!(temp.path().join("audio").is_dir());
        assert!(!temp.path().join("ayah/1/1.json").exists());
    }

    #[test]
    fn test_files_pass_writes_verbatim() {
        let temp = tempdir().unwrap();
        let audio: &[u8] = &[0xff, 0xfb, 0x90, 0x00, 0x00];
        let bytes = archive(&[("audio/1.mp3", Some(audio)), ("readme.txt", Some(b"salam"))]);

        let stats = run_pass(
            bytes,
            temp.path(),
            StagingPass::Files,
            DecodeOptions::default(),
            &CancellationToken::new(),
        )
        .unwrap();

        assert_eq!(stats.entries, 2);
        assert_eq!(stats.bytes_written, 10);
        assert_eq!(std::fs::read(temp.path().join("audio/1.mp3")).unwrap(), audio);
        assert_eq!(
            std::fs::read_to_string(temp.path().join("readme.txt")).unwrap(),
            "salam"
        );
    }

    #[test]
    fn test_directories_pass_does_not_decompress() {
        let temp = tempdir().unwrap();
        let payload = b"bismillah ar-rahman ar-rahim";
        let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        writer.start_file("ayah/1/1.txt", stored).unwrap();
        writer.write_all(payload).unwrap();
        let mut raw = writer.finish().unwrap().into_inner();
        let at = raw.windows(payload.len()).position(|w| w == payload).unwrap();
        raw[at] ^= 0xff;
        let bytes = Bytes::from(raw);

        let stats = run_pass(
            bytes.clone(),
            temp.path(),
            StagingPass::Directories,
            DecodeOptions::default(),
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(stats.entries, 2);

        let result = run_pass(
            bytes,
            temp.path(),
            StagingPass::Files,
            DecodeOptions::default(),
            &CancellationToken::new(),
        );
        assert!(matches!(
            result,
            Err(Error::Archive(ArchiveError::Corrupt { .. }))
        ));
    }

    #[test]
    fn test_cancelled_pass_stops() {
        let temp = tempdir().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = run_pass(
            archive(&[("a.txt", Some(b"a"))]),
            temp.path(),
            StagingPass::Files,
            DecodeOptions::default(),
            &cancel,
        );
        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(!temp.path().join("a.txt").exists());
    }

    #[test]
    fn test_corrupt_archive_is_decode_error() {
        let temp = tempdir().unwrap();
        let result = run_pass(
            Bytes::from_static(b"definitely not a zip archive"),
            temp.path(),
            StagingPass::Directories,
            DecodeOptions::default(),
            &CancellationToken::new(),
        );
        assert!(matches!(
            result,
            Err(Error::Archive(ArchiveError::Corrupt { .. }))
        ));
    }
}
