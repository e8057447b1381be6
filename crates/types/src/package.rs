//! Package identity and install descriptors

use hafiz_errors::{Error, StorageError};
use hafiz_hash::Hash;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Longest accepted package id, in bytes
pub const MAX_PACKAGE_ID_LEN: usize = 128;

/// Name of one content package, also the directory name of its namespace.
///
/// Ids are restricted to ASCII alphanumerics plus `-`, `_` and `.`, and may
/// not start with a dot: dot-prefixed names under the content root belong
/// to the store's own work areas.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageId(String);

impl PackageId {
    /// Validate and wrap a package id
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty, too long, starts with a dot, or
    /// contains characters other than ASCII alphanumerics, `-`, `_`, `.`.
    pub fn new(id: impl Into<String>) -> Result<Self, Error> {
        let id = id.into();
        let reject = |reason: &str| -> Result<Self, Error> {
            Err(StorageError::InvalidPackageId {
                id: id.clone(),
                reason: reason.to_string(),
            }
            .into())
        };

        if id.is_empty() {
            return reject("empty");
        }
        if id.len() > MAX_PACKAGE_ID_LEN {
            return reject("too long");
        }
        if id.starts_with('.') {
            return reject("must not start with '.'");
        }
        if let Some(c) = id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return reject(&format!("invalid character {c:?}"));
        }

        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PackageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PackageId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for PackageId {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PackageId> for String {
    fn from(id: PackageId) -> Self {
        id.0
    }
}

/// Everything the installer needs to fetch and install one package.
///
/// Immutable once built; the caller supplies one per install request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    pub id: PackageId,
    #[serde(rename = "url")]
    pub source_url: String,
    /// Size advertised by the catalog. Informational: the server's
    /// `Content-Length` is authoritative for truncation checks.
    #[serde(rename = "size", default)]
    pub declared_size_bytes: u64,
    /// Paths (relative, '/'-separated) that must exist after extraction.
    #[serde(rename = "entries", default, skip_serializing_if = "Option::is_none")]
    pub expected_entries: Option<BTreeSet<String>>,
    /// BLAKE3 digest of the archive, checked after download when present.
    #[serde(rename = "blake3", default, skip_serializing_if = "Option::is_none")]
    pub expected_hash: Option<Hash>,
}

impl PackageDescriptor {
    #[must_use]
    pub fn new(id: PackageId, source_url: impl Into<String>, declared_size_bytes: u64) -> Self {
        Self {
            id,
            source_url: source_url.into(),
            declared_size_bytes,
            expected_entries: None,
            expected_hash: None,
        }
    }

    #[must_use]
    pub fn with_expected_entries<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected_entries = Some(entries.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_expected_hash(mut self, hash: Hash) -> Self {
        self.expected_hash = Some(hash);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_valid_ids() {
        for id in ["quran", "hadith-bukhari", "dua_v2", "tafsir.ibn-kathir"] {
            assert_eq!(PackageId::new(id).unwrap().as_str(), id);
        }
    }

    #[test]
    fn test_invalid_ids() {
        for id in ["", ".staging", "..", "a/b", "a\\b", "quran data", "ayah:1"] {
            assert!(PackageId::new(id).is_err(), "{id:?} should be rejected");
        }
        assert!(PackageId::new("a".repeat(MAX_PACKAGE_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_descriptor_from_toml() {
        let toml = r#"
            id = "quran"
            url = "https://example.com/quran_data.zip"
            size = 2453000
            entries = ["ayah", "reciters.json"]
        "#;
        let descriptor: PackageDescriptor = toml::from_str(toml).unwrap();
        assert_eq!(descriptor.id.as_str(), "quran");
        assert_eq!(descriptor.declared_size_bytes, 2_453_000);
        let entries = descriptor.expected_entries.unwrap();
        assert!(entries.contains("reciters.json"));
        assert!(descriptor.expected_hash.is_none());
    }

    #[test]
    fn test_descriptor_rejects_bad_id() {
        let json = r#"{"id": ".trash", "url": "https://example.com/x.zip"}"#;
        assert!(serde_json::from_str::<PackageDescriptor>(json).is_err());
    }

    proptest! {
        #[test]
        fn accepted_ids_never_escape(id in "[A-Za-z0-9._-]{1,40}") {
            if let Ok(pkg) = PackageId::new(id.clone()) {
                prop_assert!(!pkg.as_str().starts_with('.'));
                prop_assert!(!pkg.as_str().contains('/'));
            } else {
                prop_assert!(id.starts_with('.'));
            }
        }
    }
}
