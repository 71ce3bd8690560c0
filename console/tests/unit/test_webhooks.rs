//! Webhook store tests against the file-backed store

use flux_action::filesys::dir::Dir;
use flux_action::models::endpoint::{EndpointConfig, EndpointName};
use flux_action::storage::kv::{FileStore, KeyValueStore};
use flux_action::storage::webhooks::{WebhookStore, STORAGE_KEY};

fn file_store(dir: &tempfile::TempDir) -> WebhookStore<FileStore> {
    WebhookStore::new(FileStore::new(Dir::new(dir.path().join("store"))))
}

#[tokio::test]
async fn test_config_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = EndpointConfig {
        name: EndpointName::Download,
        url: "https://hooks.example.com/export".to_string(),
        method: "POST".to_string(),
        body_template: Some(r#"{"workflowId":"{{id}}"}"#.to_string()),
    };

    file_store(&dir).update_config(&config).await;

    let reopened = file_store(&dir);
    assert_eq!(reopened.get_config("download").await, Some(config));
    assert!(dir
        .path()
        .join("store")
        .join(format!("{}.json", STORAGE_KEY))
        .exists());
}

#[tokio::test]
async fn test_persisted_document_shape() {
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(&dir);
    store.update_url(EndpointName::List, "https://hooks.example.com/list").await;

    let raw = store.backend().get(STORAGE_KEY).await.unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        value["list"],
        serde_json::json!({
            "name": "list",
            "url": "https://hooks.example.com/list",
            "method": "GET",
            "bodyTemplate": null
        })
    );
    assert!(value.get("activate").is_none());
}

#[tokio::test]
async fn test_reset_twice_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(&dir);
    store.update_url(EndpointName::Activate, "https://hooks.example.com/on").await;

    store.reset_all().await;
    store.reset_all().await;

    let defaults: Vec<_> = EndpointName::ALL
        .iter()
        .map(|&name| EndpointConfig::default_for(name))
        .collect();
    assert_eq!(store.get_all_configs().await, defaults);
}

#[tokio::test]
async fn test_hand_edited_garbage_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(&dir);
    store.backend().set(STORAGE_KEY, "[1, 2, 3]").await.unwrap();

    assert_eq!(
        store.config(EndpointName::Deactivate).await,
        EndpointConfig::default_for(EndpointName::Deactivate)
    );
    assert!(store.get_config("nope").await.is_none());
}

#[tokio::test]
async fn test_unwritable_store_is_best_effort() {
    let dir = tempfile::tempdir().unwrap();
    // A regular file where the store directory should be
    let blocker = dir.path().join("store");
    std::fs::write(&blocker, "not a directory").unwrap();

    let store = WebhookStore::new(FileStore::new(Dir::new(&blocker)));
    store.update_url(EndpointName::List, "https://hooks.example.com/list").await;
    store.reset_all().await;

    assert_eq!(store.config(EndpointName::List).await.url, "");
}
