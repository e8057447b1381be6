//! Integration tests for error types

#[cfg(test)]
mod tests {
    use hafiz_errors::*;

    #[test]
    fn test_error_conversion() {
        let net_err = NetworkError::Timeout {
            url: "https://example.com".into(),
        };
        let err: Error = net_err.into();
        assert!(matches!(err, Error::Network(_)));
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[test]
    fn test_error_display() {
        let err = StorageError::DiskFull {
            path: "/data/content".into(),
        };
        assert_eq!(err.to_string(), "disk full: /data/content");

        let err = ArchiveError::MissingEntries {
            missing: vec!["reciters.json".into(), "ayah".into()],
        };
        assert_eq!(
            err.to_string(),
            "archive is missing declared entries: reciters.json, ayah"
        );
    }

    #[test]
    fn test_kind_mapping() {
        let archive: Error = ArchiveError::Corrupt {
            message: "bad".into(),
        }
        .into();
        assert_eq!(archive.kind(), ErrorKind::Decode);

        let io: Error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope").into();
        assert_eq!(io.kind(), ErrorKind::Filesystem);

        let busy: Error = InstallError::AlreadyInProgress {
            package: "quran".into(),
        }
        .into();
        assert_eq!(busy.kind(), ErrorKind::AlreadyInProgress);
        assert!(!busy.kind().is_retryable());

        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::from(InstallError::TaskError {
            message: "staging task panicked".into(),
        })
        .is_cancelled());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let storage_err =
            StorageError::from_io_with_path(&io_err, std::path::Path::new("/content/quran"));
        assert!(matches!(storage_err, StorageError::PermissionDenied { .. }));
    }

    #[test]
    fn test_user_facing() {
        let err: Error = NetworkError::Truncated {
            url: "https://example.com/quran.zip".into(),
            received: 1_000_000,
            expected: 2_453_000,
        }
        .into();
        assert_eq!(err.user_code(), Some("network.truncated"));
        assert!(err.is_retryable());
        assert!(err.user_hint().is_some());
    }
}
