//! Normalized archive entry paths

use hafiz_errors::ArchiveError;
use std::fmt;
use std::path::{Path, PathBuf};

/// Relative, '/'-separated path of an archive entry.
///
/// Always non-empty, never absolute, never contains `.` or `..` segments,
/// empty segments or backslashes. Joining it onto a directory therefore
/// cannot leave that directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryPath(String);

impl EntryPath {
    /// Normalize a raw entry name as stored in the archive.
    ///
    /// Backslashes are treated as separators, `.` and empty segments are
    /// dropped and a trailing separator is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::UnsafePath`] for absolute names, drive
    /// prefixes, `..` segments, NUL bytes or names that normalize to nothing.
    pub fn parse(raw: &str) -> Result<Self, ArchiveError> {
        let unsafe_path = || ArchiveError::UnsafePath {
            path: raw.to_string(),
        };

        if raw.contains('\0') {
            return Err(unsafe_path());
        }

        let unified = raw.replace('\\', "/");
        if unified.starts_with('/') {
            return Err(unsafe_path());
        }

        let mut segments = Vec::new();
        for segment in unified.split('/') {
            match segment {
                "" | "." => {}
                ".." => return Err(unsafe_path()),
                s => segments.push(s),
            }
        }

        // "C:foo" and friends
        if let Some(first) = segments.first() {
            let bytes = first.as_bytes();
            if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
                return Err(unsafe_path());
            }
        }

        if segments.is_empty() {
            return Err(unsafe_path());
        }

        Ok(Self(segments.join("/")))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Every ancestor directory, shortest first, plus the path itself when
    /// `is_directory` is set.
    ///
    /// `ayah/1/1.json` implies `ayah` and `ayah/1`.
    pub fn implied_directories(&self, is_directory: bool) -> impl Iterator<Item = &str> {
        let full = self.0.as_str();
        full.match_indices('/')
            .map(move |(index, _)| &full[..index])
            .chain(is_directory.then_some(full))
    }

    /// Platform path of this entry under `base`
    #[must_use]
    pub fn to_path(&self, base: &Path) -> PathBuf {
        let mut path = base.to_path_buf();
        for segment in self.segments() {
            path.push(segment);
        }
        path
    }
}

impl fmt::Display for EntryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntryPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
