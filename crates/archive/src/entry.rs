use crate::EntryPath;

/// One decoded archive member.
///
/// Whether the entry is a directory is decided once, by the decoder;
/// directories never carry content, and neither do files decoded in
/// names-only mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: EntryPath,
    pub is_directory: bool,
    pub content: Option<Vec<u8>>,
}

impl ArchiveEntry {
    #[must_use]
    pub fn directory(path: EntryPath) -> Self {
        Self {
            path,
            is_directory: true,
            content: None,
        }
    }

    #[must_use]
    pub fn file(path: EntryPath, content: Vec<u8>) -> Self {
        Self {
            path,
            is_directory: false,
            content: Some(content),
        }
    }

    /// A file whose content was not decoded
    #[must_use]
    pub fn file_name_only(path: EntryPath) -> Self {
        Self {
            path,
            is_directory: false,
            content: None,
        }
    }

    /// Directories that must exist before this entry can be written
    pub fn implied_directories(&self) -> impl Iterator<Item = &str> {
        self.path.implied_directories(self.is_directory)
    }

    /// Content length; zero for directories
    #[must_use]
    pub fn len(&self) -> usize {
        self.content.as_ref().map_or(0, Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
