//! Key-value persistence trait.
//!
//! Sessions and settings are handed to a store as plain JSON values; the
//! store imposes no schema. Implementations live in `promptforge-store`.

use async_trait::async_trait;

use crate::error::StorageError;

/// The core KeyValueStore trait.
///
/// Implementations: in-memory (for tests and ephemeral runs), JSON file.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// The backend name (e.g., "memory", "file").
    fn name(&self) -> &str;

    /// Load the value stored under `key`.
    async fn load(&self, key: &str) -> std::result::Result<Option<serde_json::Value>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn save(&self, key: &str, value: serde_json::Value) -> std::result::Result<(), StorageError>;

    /// Remove `key`. Returns whether something was removed.
    async fn delete(&self, key: &str) -> std::result::Result<bool, StorageError>;

    /// All keys starting with `prefix`, sorted.
    async fn keys(&self, prefix: &str) -> std::result::Result<Vec<String>, StorageError>;
}
