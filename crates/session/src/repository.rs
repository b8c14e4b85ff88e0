//! Session persistence over a [`KeyValueStore`].
//!
//! Each session is stored as one JSON value under `session:<id>`.

use promptforge_core::{KeyValueStore, StorageError};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::model::{Session, SessionId};

pub const SESSION_KEY_PREFIX: &str = "session:";

#[derive(Clone)]
pub struct SessionRepository {
    store: Arc<dyn KeyValueStore>,
}

impl SessionRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn key(id: &SessionId) -> String {
        format!("{SESSION_KEY_PREFIX}{id}")
    }

    pub async fn save(&self, session: &Session) -> Result<(), StorageError> {
        let key = Self::key(session.id());
        let value = serde_json::to_value(session).map_err(|e| StorageError::Serialization {
            key: key.clone(),
            reason: e.to_string(),
        })?;
        self.store.save(&key, value).await?;
        debug!(session_id = %session.id(), backend = self.store.name(), "Session saved");
        Ok(())
    }

    pub async fn load(&self, id: &SessionId) -> Result<Option<Session>, StorageError> {
        let key = Self::key(id);
        match self.store.load(&key).await? {
            None => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| StorageError::Corrupted {
                    key,
                    reason: e.to_string(),
                }),
        }
    }

    /// Every readable session. Corrupted entries are skipped with a warning.
    pub async fn load_all(&self) -> Result<Vec<Session>, StorageError> {
        let mut sessions = Vec::new();
        for key in self.store.keys(SESSION_KEY_PREFIX).await? {
            let Some(value) = self.store.load(&key).await? else {
                continue;
            };
            match serde_json::from_value::<Session>(value) {
                Ok(session) => sessions.push(session),
                Err(e) => warn!(key = %key, error = %e, "Skipping corrupted session"),
            }
        }
        Ok(sessions)
    }

    pub async fn delete(&self, id: &SessionId) -> Result<bool, StorageError> {
        self.store.delete(&Self::key(id)).await
    }
}
