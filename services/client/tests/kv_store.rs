//! services/client/tests/kv_store.rs

use atticus_core::ports::{KeyValueStore, PortError};
use client_lib::adapters::FileKeyValueStore;

#[tokio::test]
async fn values_survive_reopening_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("store.json");

    let store = FileKeyValueStore::new(&path);
    assert_eq!(store.get("authToken").await.unwrap(), None);
    store.set("authToken", "abc").await.unwrap();
    store.set("themeMode", "dark").await.unwrap();
    assert!(path.exists());

    let reopened = FileKeyValueStore::new(&path);
    assert_eq!(reopened.get("authToken").await.unwrap().as_deref(), Some("abc"));
    assert_eq!(reopened.get("themeMode").await.unwrap().as_deref(), Some("dark"));
}

#[tokio::test]
async fn removing_keys_leaves_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileKeyValueStore::new(dir.path().join("store.json"));
    store.set("authToken", "abc").await.unwrap();
    store.set("themeMode", "light").await.unwrap();

    store.remove("authToken").await.unwrap();
    // Removing again, or a key that never existed, is fine.
    store.remove("authToken").await.unwrap();
    store.remove("missing").await.unwrap();

    assert_eq!(store.get("authToken").await.unwrap(), None);
    assert_eq!(store.get("themeMode").await.unwrap().as_deref(), Some("light"));
}

#[tokio::test]
async fn a_corrupt_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, "{not json").unwrap();

    let store = FileKeyValueStore::new(&path);
    assert!(matches!(
        store.get("authToken").await,
        Err(PortError::Unexpected(_))
    ));
}
