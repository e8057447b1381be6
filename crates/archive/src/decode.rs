//! Lazy ZIP decoding

use crate::{ArchiveEntry, EntryPath};
use bytes::Bytes;
use hafiz_errors::ArchiveError;
use std::io::{Cursor, Read};
use zip::result::ZipError;
use zip::ZipArchive;

/// Initial buffer for an entry; the declared size is not trusted up front
const INITIAL_ENTRY_CAPACITY: u64 = 64 * 1024;

/// Limits and modes applied while decoding
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// Largest uncompressed entry accepted, in bytes
    pub max_entry_size: u64,
    /// Yield names and kinds only. File entries then carry no content and
    /// nothing is decompressed.
    pub names_only: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_entry_size: 512 * 1024 * 1024,
            names_only: false,
        }
    }
}

/// Decode a whole archive held in memory with default limits
///
/// # Errors
///
/// Returns [`ArchiveError::Corrupt`] if the bytes are not a readable ZIP
/// archive (bad signature, truncated central directory).
pub fn decode(bytes: Bytes) -> Result<ArchiveEntries, ArchiveError> {
    decode_with_options(bytes, DecodeOptions::default())
}

/// Decode a whole archive held in memory
///
/// Only the central directory is read here; entry content is decompressed
/// as the returned iterator advances.
///
/// # Errors
///
/// Returns [`ArchiveError::Corrupt`] if the bytes are not a readable ZIP
/// archive.
pub fn decode_with_options(
    bytes: Bytes,
    options: DecodeOptions,
) -> Result<ArchiveEntries, ArchiveError> {
    let archive = ZipArchive::new(Cursor::new(bytes)).map_err(map_zip_error)?;
    tracing::debug!(entries = archive.len(), "opened archive");
    Ok(ArchiveEntries {
        archive,
        index: 0,
        options,
        failed: false,
    })
}

/// Entries of one archive in archive-internal order.
///
/// Consumed by value; iteration stops after the first error.
pub struct ArchiveEntries {
    archive: ZipArchive<Cursor<Bytes>>,
    index: usize,
    options: DecodeOptions,
    failed: bool,
}

impl ArchiveEntries {
    /// Entries not yet yielded
    #[must_use]
    pub fn remaining(&self) -> usize {
        if self.failed {
            0
        } else {
            self.archive.len() - self.index
        }
    }

    fn read_entry(&mut self, index: usize) -> Result<ArchiveEntry, ArchiveError> {
        let limit = self.options.max_entry_size;
        let names_only = self.options.names_only;
        let mut file = if names_only {
            self.archive.by_index_raw(index)
        } else {
            self.archive.by_index(index)
        }
        .map_err(map_zip_error)?;

        let path = EntryPath::parse(file.name())?;
        if file.is_dir() {
            return Ok(ArchiveEntry::directory(path));
        }

        let declared = file.size();
        if declared > limit {
            return Err(ArchiveError::EntryTooLarge {
                path: path.to_string(),
                size: declared,
                limit,
            });
        }
        if names_only {
            return Ok(ArchiveEntry::file_name_only(path));
        }

        let capacity = declared.min(INITIAL_ENTRY_CAPACITY);
        let mut content = Vec::with_capacity(usize::try_from(capacity).unwrap_or(0));
        (&mut file)
            .take(limit.saturating_add(1))
            .read_to_end(&mut content)
            .map_err(|e| ArchiveError::Corrupt {
                message: format!("{path}: {e}"),
            })?;

        let actual = content.len() as u64;
        if actual > limit {
            return Err(ArchiveError::EntryTooLarge {
                path: path.to_string(),
                size: actual,
                limit,
            });
        }

        Ok(ArchiveEntry::file(path, content))
    }
}

impl Iterator for ArchiveEntries {
    type Item = Result<ArchiveEntry, ArchiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.index >= self.archive.len() {
            return None;
        }
        let index = self.index;
        self.index += 1;

        let entry = self.read_entry(index);
        if entry.is_err() {
            self.failed = true;
        }
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining()))
    }
}

impl std::iter::FusedIterator for ArchiveEntries {}

fn map_zip_error(err: ZipError) -> ArchiveError {
    match err {
        ZipError::UnsupportedArchive(message) => ArchiveError::Unsupported {
            message: message.to_string(),
        },
        other => ArchiveError::Corrupt {
            message: other.to_string(),
        },
    }
}
