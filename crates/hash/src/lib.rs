#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! BLAKE3 digests for downloaded content archives
//!
//! The transfer manager hashes bytes as they stream to disk so a catalog
//! checksum can be verified without a second pass over the archive.

use blake3::Hasher;
use hafiz_errors::{Error, StorageError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Size of chunks for streaming hash computation
const CHUNK_SIZE: usize = 64 * 1024; // 64KB

/// A BLAKE3 hash value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hash {
    bytes: [u8; 32],
}

impl Hash {
    /// Create a hash from raw bytes
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Get the raw bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Convert to hex string
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Parse from hex string
    ///
    /// # Errors
    /// Returns an error if the input string is not valid hexadecimal or is not exactly 64 characters (32 bytes).
    pub fn from_hex(s: &str) -> Result<Self, Error> {
        let bytes = hex::decode(s).map_err(|e| StorageError::InvalidPath {
            path: format!("invalid hex digest {s:?}: {e}"),
        })?;

        let array: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| StorageError::InvalidPath {
            path: format!("digest must be 32 bytes, got {}", b.len()),
        })?;
        Ok(Self::from_bytes(array))
    }

    /// Compute hash of a byte slice
    #[must_use]
    pub fn from_data(data: &[u8]) -> Self {
        let hash = blake3::hash(data);
        Self::from_bytes(*hash.as_bytes())
    }

    /// Compute hash of a file
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, read, or if any I/O operation fails.
    pub async fn hash_file(path: &Path) -> Result<Self, Error> {
        let mut hasher = StreamingHasher::new();
        hasher.update_from_file(path, u64::MAX).await?;
        Ok(hasher.finalize())
    }
}

/// Incremental hasher fed chunk by chunk while a download streams.
#[derive(Debug, Clone, Default)]
pub struct StreamingHasher {
    inner: Hasher,
}

impl StreamingHasher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Feed up to `limit` leading bytes of an existing file, returning how
    /// many bytes were consumed. Used to seed the digest when resuming.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or read.
    pub async fn update_from_file(&mut self, path: &Path, limit: u64) -> Result<u64, Error> {
        let mut file = File::open(path)
            .await
            .map_err(|e| Error::io_with_path(&e, path))?;
        let mut buffer = vec![0; CHUNK_SIZE];
        let mut consumed = 0u64;

        while consumed < limit {
            let want = usize::try_from((limit - consumed).min(CHUNK_SIZE as u64))
                .unwrap_or(CHUNK_SIZE);
            let n = file.read(&mut buffer[..want]).await?;
            if n == 0 {
                break;
            }
            self.inner.update(&buffer[..n]);
            consumed += n as u64;
        }

        Ok(consumed)
    }

    #[must_use]
    pub fn finalize(&self) -> Hash {
        Hash::from_bytes(*self.inner.finalize().as_bytes())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for Hash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Hash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_hash_basics() {
        let data = b"hello world";
        let hash = Hash::from_data(data);

        // Known BLAKE3 hash of "hello world"
        let expected = "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24";
        assert_eq!(hash.to_hex(), expected);
        assert_eq!(Hash::from_hex(expected).unwrap(), hash);
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(Hash::from_hex("zz").is_err());
        assert!(Hash::from_hex("abcd").is_err());
    }

    #[test]
    fn test_hash_serialization() {
        let hash = Hash::from_data(b"test");
        let json = serde_json::to_string(&hash).unwrap();
        let deserialized: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(hash, deserialized);
    }

    #[test]
    fn test_streaming_matches_one_shot() {
        let mut hasher = StreamingHasher::new();
        hasher.update(b"surah ");
        hasher.update(b"al-fatiha");
        assert_eq!(hasher.finalize(), Hash::from_data(b"surah al-fatiha"));
    }

    #[tokio::test]
    async fn test_hash_file_and_prefix() {
        use std::io::Write;
        let mut temp = NamedTempFile::new().unwrap();
        let data = b"test file content";
        temp.write_all(data).unwrap();

        let hash = Hash::hash_file(temp.path()).await.unwrap();
        assert_eq!(hash, Hash::from_data(data));

        let mut prefix = StreamingHasher::new();
        let consumed = prefix.update_from_file(temp.path(), 4).await.unwrap();
        assert_eq!(consumed, 4);
        prefix.update(&data[4..]);
        assert_eq!(prefix.finalize(), hash);
    }
}
