//! Key-value persistence backends

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::errors::FluxError;
use crate::filesys::dir::Dir;
use crate::filesys::file::File;

/// A string key-value medium, the local analogue of browser storage
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value for `key`, `None` when absent
    async fn get(&self, key: &str) -> Result<Option<String>, FluxError>;

    /// Write or overwrite the value for `key`
    async fn set(&self, key: &str, value: &str) -> Result<(), FluxError>;

    /// Remove `key`; removing a missing key succeeds
    async fn remove(&self, key: &str) -> Result<(), FluxError>;
}

/// In-memory store, lost when dropped
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, FluxError> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), FluxError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), FluxError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}

/// Directory-backed store: each key lives in `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: Dir,
}

impl FileStore {
    pub fn new(dir: Dir) -> Self {
        Self { dir }
    }

    fn entry(&self, key: &str) -> Result<File, FluxError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(FluxError::Storage(format!("Invalid storage key: {:?}", key)));
        }
        Ok(self.dir.file(&format!("{}.json", key)))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, FluxError> {
        self.entry(key)?.read_string_opt().await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), FluxError> {
        self.entry(key)?.write_string(value).await
    }

    async fn remove(&self, key: &str) -> Result<(), FluxError> {
        self.entry(key)?.delete().await
    }
}
