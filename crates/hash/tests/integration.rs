//! Integration tests for hash crate

#[cfg(test)]
mod tests {
    use hafiz_hash::*;
    use tempfile::tempdir;
    use tokio::fs;

    #[tokio::test]
    async fn test_hash_file_matches_data() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("quran_data.zip");

        let data = b"verify this content";
        fs::write(&file_path, data).await.unwrap();

        let hash = Hash::hash_file(&file_path).await.unwrap();
        assert_eq!(hash, Hash::from_data(data));
        assert_ne!(hash, Hash::from_data(b"different content"));
    }

    #[tokio::test]
    async fn test_prefix_longer_than_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.zip");
        fs::write(&file_path, b"abc").await.unwrap();

        let mut hasher = StreamingHasher::new();
        let consumed = hasher.update_from_file(&file_path, 10).await.unwrap();
        assert_eq!(consumed, 3);
        assert_eq!(hasher.finalize(), Hash::from_data(b"abc"));
    }

    #[tokio::test]
    async fn test_hash_missing_file_fails() {
        let dir = tempdir().unwrap();
        assert!(Hash::hash_file(&dir.path().join("absent.zip")).await.is_err());
    }

    #[test]
    fn test_hash_from_hex_errors() {
        // Too short
        assert!(Hash::from_hex("1234").is_err());

        // Too long
        assert!(Hash::from_hex(&"a".repeat(65)).is_err());

        // Invalid hex
        assert!(Hash::from_hex("xyz123").is_err());
    }
}
