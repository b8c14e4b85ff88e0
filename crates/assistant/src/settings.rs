//! User-facing settings owned by one assistant.

use chrono::Utc;
use promptforge_config::AppConfig;
use promptforge_core::{
    CompositionMode, DomainEvent, EventBus, KeyValueStore, PreferencesPatch, StorageError,
    UserPreferences,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Store key the settings are saved under.
pub const SETTINGS_KEY: &str = "settings";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub mode: CompositionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_budget: Option<usize>,
    #[serde(default, skip_serializing_if = "UserPreferences::is_empty")]
    pub preferences: UserPreferences,
}

impl Settings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            mode: config.composition.mode,
            token_budget: config.composition.token_budget,
            preferences: config.preferences.clone(),
        }
    }
}

/// Settings plus change notification.
pub struct SettingsManager {
    settings: Settings,
    event_bus: Arc<EventBus>,
}

impl SettingsManager {
    pub fn new(settings: Settings, event_bus: Arc<EventBus>) -> Self {
        Self {
            settings,
            event_bus,
        }
    }

    /// Load saved settings, falling back to `defaults` when nothing is
    /// stored or the stored value is unreadable.
    pub async fn load(
        store: &dyn KeyValueStore,
        defaults: Settings,
        event_bus: Arc<EventBus>,
    ) -> Result<Self, StorageError> {
        let settings = match store.load(SETTINGS_KEY).await? {
            None => defaults,
            Some(value) => match serde_json::from_value::<Settings>(value) {
                Ok(saved) => saved,
                Err(e) => {
                    warn!(error = %e, "Ignoring unreadable saved settings");
                    defaults
                }
            },
        };
        Ok(Self::new(settings, event_bus))
    }

    pub async fn save(&self, store: &dyn KeyValueStore) -> Result<(), StorageError> {
        let value =
            serde_json::to_value(&self.settings).map_err(|e| StorageError::Serialization {
                key: SETTINGS_KEY.into(),
                reason: e.to_string(),
            })?;
        store.save(SETTINGS_KEY, value).await
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn mode(&self) -> CompositionMode {
        self.settings.mode
    }

    /// Switch the composition mode. Publishes `ModeChanged` when the mode
    /// actually changes; returns whether it did.
    pub fn set_mode(&mut self, mode: CompositionMode) -> bool {
        let from = self.settings.mode;
        if from == mode {
            return false;
        }
        self.settings.mode = mode;
        info!(from = %from, to = %mode, "Composition mode changed");
        self.event_bus.publish(DomainEvent::ModeChanged {
            from,
            to: mode,
            timestamp: Utc::now(),
        });
        true
    }

    /// `None` removes the budget; zero is treated as no budget.
    pub fn set_token_budget(&mut self, budget: Option<usize>) {
        self.settings.token_budget = budget.filter(|b| *b > 0);
    }

    pub fn update_preferences(&mut self, patch: PreferencesPatch) {
        self.settings.preferences.apply(patch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptforge_core::EventKind;
    use promptforge_store::InMemoryStore;
    use serde_json::json;

    fn defaults() -> Settings {
        Settings::from_config(&AppConfig::default())
    }

    #[test]
    fn from_config_copies_defaults() {
        let settings = defaults();
        assert_eq!(settings.mode, CompositionMode::Layered);
        assert_eq!(settings.token_budget, None);
        assert!(settings.preferences.is_empty());
    }

    #[tokio::test]
    async fn mode_change_is_published_once() {
        let bus = Arc::new(EventBus::default());
        let mut sub = bus.subscribe_to(&[EventKind::ModeChanged]);
        let mut manager = SettingsManager::new(defaults(), bus);

        assert!(manager.set_mode(CompositionMode::Direct));
        assert!(!manager.set_mode(CompositionMode::Direct));

        let event = sub.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::ModeChanged { from, to, .. } => {
                assert_eq!(*from, CompositionMode::Layered);
                assert_eq!(*to, CompositionMode::Direct);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let store = InMemoryStore::new();
        let bus = Arc::new(EventBus::default());
        let mut manager = SettingsManager::new(defaults(), bus.clone());
        manager.set_mode(CompositionMode::Direct);
        manager.set_token_budget(Some(2048));
        manager.update_preferences(PreferencesPatch {
            preferred_languages: Some(vec!["rust".into()]),
            ..Default::default()
        });
        manager.save(&store).await.unwrap();

        let loaded = SettingsManager::load(&store, defaults(), bus).await.unwrap();
        assert_eq!(loaded.settings(), manager.settings());
    }

    #[tokio::test]
    async fn unreadable_settings_fall_back() {
        let store = InMemoryStore::new();
        store.save(SETTINGS_KEY, json!("garbage")).await.unwrap();
        let bus = Arc::new(EventBus::default());
        let loaded = SettingsManager::load(&store, defaults(), bus).await.unwrap();
        assert_eq!(loaded.settings(), &defaults());
    }

    #[tokio::test]
    async fn settings_saved_with_provider_fields_still_load() {
        let store = InMemoryStore::new();
        store
            .save(
                SETTINGS_KEY,
                json!({"mode": "direct", "provider": "openai", "model": "gpt-4o", "token_budget": 512}),
            )
            .await
            .unwrap();
        let bus = Arc::new(EventBus::default());
        let loaded = SettingsManager::load(&store, defaults(), bus).await.unwrap();
        assert_eq!(loaded.mode(), CompositionMode::Direct);
        assert_eq!(loaded.settings().token_budget, Some(512));
    }

    #[test]
    fn zero_budget_means_none() {
        let mut manager = SettingsManager::new(defaults(), Arc::new(EventBus::default()));
        manager.set_token_budget(Some(0));
        assert_eq!(manager.settings().token_budget, None);
    }
}
