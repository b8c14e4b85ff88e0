//! File-backed store — one JSON object holding every key.
//!
//! The file is loaded into memory on creation and rewritten on every
//! mutation (save, delete). Reads are served from memory.

use async_trait::async_trait;
use promptforge_core::{KeyValueStore, StorageError};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

pub struct JsonFileStore {
    path: PathBuf,
    entries: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl JsonFileStore {
    /// Open the store at `path`.
    ///
    /// A missing file starts empty and is created on first write. A file
    /// that is not a JSON object is ignored with a warning and will be
    /// overwritten on the next write.
    pub fn new(path: PathBuf) -> Self {
        let entries = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = entries.len(), "File store loaded");
        Self {
            path,
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_disk(path: &Path) -> BTreeMap<String, Value> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return BTreeMap::new(), // not written yet
        };
        if content.trim().is_empty() {
            return BTreeMap::new();
        }

        match serde_json::from_str::<Map<String, Value>>(&content) {
            Ok(map) => map.into_iter().collect(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring corrupted store file");
                BTreeMap::new()
            }
        }
    }

    /// Write every entry to disk.
    async fn flush(&self) -> Result<(), StorageError> {
        let entries = self.entries.read().await;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StorageError::Io(format!("Failed to create store directory: {e}"))
                })?;
            }
        }

        let object: Map<String, Value> = entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let content = serde_json::to_string_pretty(&Value::Object(object)).map_err(|e| {
            StorageError::Serialization {
                key: "*".into(),
                reason: e.to_string(),
            }
        })?;

        std::fs::write(&self.path, content)
            .map_err(|e| StorageError::Io(format!("Failed to write store file: {e}")))?;

        debug!(path = %self.path.display(), count = entries.len(), "Store flushed");
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn load(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn save(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.entries.write().await.insert(key.to_string(), value);
        self.flush().await
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let deleted = self.entries.write().await.remove(key).is_some();
        if deleted {
            self.flush().await?;
        }
        Ok(deleted)
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let entries = self.entries.read().await;
        Ok(entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
