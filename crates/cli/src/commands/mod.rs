pub mod compose;
pub mod config_cmd;
pub mod estimate;
pub mod parse;
pub mod sessions;

use promptforge_config::{AppConfig, StorageBackend};
use promptforge_core::KeyValueStore;
use promptforge_store::{InMemoryStore, JsonFileStore};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// The config file in use: the explicit path, or the default location.
pub fn config_file(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

/// Load configuration with environment overrides applied.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match explicit {
        None => AppConfig::load(),
        Some(path) => AppConfig::load_from(path).and_then(|mut config| {
            config.apply_env_overrides(|name| std::env::var(name).ok())?;
            Ok(config)
        }),
    };
    config.map_err(|e| format!("Failed to load config: {e}").into())
}

/// Read a file, or all of stdin when no file is given.
pub fn read_input(file: Option<&Path>) -> Result<String, Box<dyn std::error::Error>> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()).into()),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Open the configured key-value store.
pub fn open_store(config: &AppConfig) -> Arc<dyn KeyValueStore> {
    match config.storage.backend {
        StorageBackend::File => Arc::new(JsonFileStore::new(config.storage.resolved_path())),
        StorageBackend::Memory => Arc::new(InMemoryStore::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_file_defaults_under_config_dir() {
        let path = config_file(None);
        assert!(path.ends_with(".promptforge/config.toml"));
        assert_eq!(config_file(Some(Path::new("x.toml"))), PathBuf::from("x.toml"));
    }

    #[test]
    fn missing_explicit_config_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = load_config(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.parser.code_signal_threshold, 3);
    }

    #[test]
    fn memory_backend_opens_memory_store() {
        let mut config = AppConfig::default();
        config.storage.backend = StorageBackend::Memory;
        assert_eq!(open_store(&config).name(), "memory");
    }
}
