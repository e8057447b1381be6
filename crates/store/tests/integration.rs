//! Integration tests for store crate

#[cfg(test)]
mod tests {
    use hafiz_store::*;
    use hafiz_types::PackageId;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio::fs;

    fn id(name: &str) -> PackageId {
        PackageId::new(name).unwrap()
    }

    async fn stage(store: &ContentStore, package: &PackageId, marker: &str) -> std::path::PathBuf {
        let staging = store.staging_dir(package);
        fs::create_dir_all(staging.join("ayah/1")).await.unwrap();
        fs::write(staging.join("ayah/1/1.json"), marker).await.unwrap();
        staging
    }

    async fn read(path: &Path) -> String {
        fs::read_to_string(path).await.unwrap()
    }

    #[tokio::test]
    async fn test_commit_new_install() {
        let temp = tempdir().unwrap();
        let store = ContentStore::new(temp.path().join("content"));
        store.ensure_layout().await.unwrap();

        let quran = id("quran");
        assert!(!store.exists(&quran).await);

        let staging = stage(&store, &quran, "v1").await;
        let outcome = store.commit(&staging, &quran).await.unwrap();

        assert!(!outcome.replaced_existing);
        assert!(store.exists(&quran).await);
        assert!(!staging.exists());
        assert_eq!(read(&store.path(&quran, "ayah/1/1.json").unwrap()).await, "v1");
    }

    #[tokio::test]
    async fn test_commit_replaces_existing() {
        let temp = tempdir().unwrap();
        let store = ContentStore::new(temp.path().to_path_buf());
        store.ensure_layout().await.unwrap();
        let quran = id("quran");

        let first = stage(&store, &quran, "v1").await;
        store.commit(&first, &quran).await.unwrap();
        fs::write(store.path(&quran, "stale.txt").unwrap(), "old").await.unwrap();

        let second = stage(&store, &quran, "v2").await;
        let outcome = store.commit(&second, &quran).await.unwrap();

        assert!(outcome.replaced_existing);
        assert_eq!(read(&store.path(&quran, "ayah/1/1.json").unwrap()).await, "v2");
        assert!(!store.path(&quran, "stale.txt").unwrap().exists());

        let mut trash = fs::read_dir(temp.path().join(TRASH_DIR)).await.unwrap();
        assert!(trash.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_commit_keeps_previous_install() {
        let temp = tempdir().unwrap();
        let store = ContentStore::new(temp.path().to_path_buf());
        store.ensure_layout().await.unwrap();
        let quran = id("quran");

        let first = stage(&store, &quran, "v1").await;
        store.commit(&first, &quran).await.unwrap();

        let missing = store.staging_dir(&quran);
        assert!(store.commit(&missing, &quran).await.is_err());
        assert_eq!(read(&store.path(&quran, "ayah/1/1.json").unwrap()).await, "v1");
    }

    #[tokio::test]
    async fn test_uninstall() {
        let temp = tempdir().unwrap();
        let store = ContentStore::new(temp.path().to_path_buf());
        store.ensure_layout().await.unwrap();
        let dua = id("dua");

        assert!(!store.uninstall(&dua).await.unwrap());

        let staging = stage(&store, &dua, "x").await;
        store.commit(&staging, &dua).await.unwrap();
        assert!(store.uninstall(&dua).await.unwrap());
        assert!(!store.exists(&dua).await);
        assert!(!store.uninstall(&dua).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_skips_work_areas() {
        let temp = tempdir().unwrap();
        let store = ContentStore::new(temp.path().to_path_buf());
        assert!(store.list().await.unwrap().is_empty());

        store.ensure_layout().await.unwrap();
        for name in ["quran", "hadith"] {
            let package = id(name);
            let staging = stage(&store, &package, name).await;
            store.commit(&staging, &package).await.unwrap();
        }
        fs::write(temp.path().join("notes.txt"), "not a package").await.unwrap();

        let ids: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(ids, ["hadith", "quran"]);
    }

    #[tokio::test]
    async fn test_cleanup_stale() {
        let temp = tempdir().unwrap();
        let store = ContentStore::new(temp.path().to_path_buf());
        store.ensure_layout().await.unwrap();
        let quran = id("quran");

        let leftover = stage(&store, &quran, "partial").await;
        fs::write(store.download_path(&quran), b"PK\x03\x04").await.unwrap();

        let kept = store.cleanup_stale(Duration::from_secs(3600)).await.unwrap();
        assert!(kept.removed.is_empty());
        assert!(leftover.exists());

        let report = store.cleanup_stale(Duration::ZERO).await.unwrap();
        assert_eq!(report.removed.len(), 2);
        assert!(report.failed.is_empty());
        assert!(!leftover.exists());
        assert!(!store.download_path(&quran).exists());
    }

    #[tokio::test]
    async fn test_package_size() {
        let temp = tempdir().unwrap();
        let store = ContentStore::new(temp.path().to_path_buf());
        store.ensure_layout().await.unwrap();
        let quran = id("quran");

        let staging = stage(&store, &quran, "12345").await;
        fs::write(staging.join("reciters.json"), "[]").await.unwrap();
        store.commit(&staging, &quran).await.unwrap();

        assert_eq!(store.package_size(&quran).await.unwrap(), 7);
    }
}
