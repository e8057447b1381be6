//! Integration tests for config

#[cfg(test)]
mod tests {
    use hafiz_config::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to ensure env var tests don't run concurrently
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_VARS: &[&str] = &[
        "HAFIZ_CONTENT_ROOT",
        "HAFIZ_TIMEOUT",
        "HAFIZ_STALL_TIMEOUT",
        "HAFIZ_USER_AGENT",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[paths]
content_root = "/var/lib/hafiz/content"

[network]
timeout = 600
stall_timeout = 10

[install]
max_concurrent = 4
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(
            config.content_root(),
            std::path::PathBuf::from("/var/lib/hafiz/content")
        );
        assert_eq!(config.network.timeout, 600);
        assert_eq!(config.network.stall_timeout, 10);
        assert_eq!(config.network.progress_interval_ms, 50);
        assert_eq!(config.install.max_concurrent, 4);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let err = Config::load_from_file(std::path::Path::new("/nonexistent/hafiz.toml"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            hafiz_errors::Error::Config(hafiz_errors::ConfigError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_zero_stall_timeout_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[network]\nstall_timeout = 0").unwrap();
        assert!(Config::load_from_file(temp_file.path()).await.is_err());
    }

    #[test]
    fn test_merge_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("HAFIZ_CONTENT_ROOT", "/tmp/hafiz-content");
        std::env::set_var("HAFIZ_STALL_TIMEOUT", "5");
        std::env::set_var("HAFIZ_USER_AGENT", "tracker/2.0");

        let mut config = Config::default();
        config.merge_env().unwrap();

        assert_eq!(
            config.content_root(),
            std::path::PathBuf::from("/tmp/hafiz-content")
        );
        assert_eq!(config.network.stall_timeout, 5);
        assert_eq!(config.network.user_agent, "tracker/2.0");

        clear_env();
    }

    #[test]
    fn test_invalid_env_value() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("HAFIZ_TIMEOUT", "soon");

        let mut config = Config::default();
        assert!(config.merge_env().is_err());

        clear_env();
    }

    #[tokio::test]
    async fn test_load_catalog_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[[package]]
id = "dua"
url = "https://cdn.example.com/dua.zip"
size = 4096
        "#
        )
        .unwrap();

        let catalog = Catalog::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.iter().next().unwrap().id.as_str(), "dua");
    }
}
