//! Configuration loading, validation, and management for PromptForge.
//!
//! Loads configuration from `~/.promptforge/config.toml` with environment
//! variable overrides. Validates all settings at load time.

use promptforge_core::{CompositionMode, UserPreferences};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.promptforge/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Prompt composition settings
    #[serde(default)]
    pub composition: CompositionConfig,

    /// Response parser settings
    #[serde(default)]
    pub parser: ParserConfig,

    /// Session and settings persistence
    #[serde(default)]
    pub storage: StorageConfig,

    /// Standing user preferences rendered into the preferences layer
    #[serde(default, skip_serializing_if = "UserPreferences::is_empty")]
    pub preferences: UserPreferences,

    /// Custom cost rates, consulted before the built-in table
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pricing: Vec<PricingOverride>,

    /// Provider-specific configurations
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "anthropic".into()
}
fn default_model() -> String {
    "claude-3-5-sonnet".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("composition", &self.composition)
            .field("parser", &self.parser)
            .field("storage", &self.storage)
            .field("preferences", &self.preferences)
            .field("pricing", &self.pricing)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompositionConfig {
    #[serde(default)]
    pub mode: CompositionMode,

    /// Token budget for composed prompts. `None` means unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_budget: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// How many structural signals unfenced text needs to be treated as code.
    #[serde(default = "default_code_signal_threshold")]
    pub code_signal_threshold: usize,

    /// Keep the raw provider text on structured responses.
    #[serde(default = "default_true")]
    pub keep_raw: bool,
}

fn default_code_signal_threshold() -> usize {
    3
}
fn default_true() -> bool {
    true
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            code_signal_threshold: default_code_signal_threshold(),
            keep_raw: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_backend")]
    pub backend: StorageBackend,

    /// Store file path. Defaults to `~/.promptforge/store.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Memory,
}

fn default_storage_backend() -> StorageBackend {
    StorageBackend::File
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            path: None,
        }
    }
}

impl StorageConfig {
    /// The configured store path, or the default under the config dir.
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("store.json"))
    }
}

/// A custom per-1K-token rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingOverride {
    pub provider: String,
    pub model_pattern: String,
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.promptforge/config.toml).
    ///
    /// Environment variables override the file:
    /// - `PROMPTFORGE_API_KEY`
    /// - `PROMPTFORGE_PROVIDER`
    /// - `PROMPTFORGE_MODEL`
    /// - `PROMPTFORGE_TOKEN_BUDGET`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process env in `load`).
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if self.api_key.is_none() {
            self.api_key = lookup("PROMPTFORGE_API_KEY");
        }

        if let Some(provider) = lookup("PROMPTFORGE_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = lookup("PROMPTFORGE_MODEL") {
            self.default_model = model;
        }

        if let Some(budget) = lookup("PROMPTFORGE_TOKEN_BUDGET") {
            let parsed = budget.trim().parse::<usize>().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "PROMPTFORGE_TOKEN_BUDGET must be a positive integer, got '{budget}'"
                ))
            })?;
            self.composition.token_budget = Some(parsed);
        }

        self.validate()
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as TOML, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |reason: String| ConfigError::WriteError {
            path: path.to_path_buf(),
            reason,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| write_err(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| write_err(e.to_string()))
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".promptforge")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.parser.code_signal_threshold == 0 {
            return Err(ConfigError::ValidationError(
                "parser.code_signal_threshold must be at least 1".into(),
            ));
        }

        if self.composition.token_budget == Some(0) {
            return Err(ConfigError::ValidationError(
                "composition.token_budget must be > 0 when set".into(),
            ));
        }

        for rate in &self.pricing {
            if rate.model_pattern.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "pricing entry for '{}' has an empty model_pattern",
                    rate.provider
                )));
            }
            if rate.input_per_1k < 0.0 || rate.output_per_1k < 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "pricing entry '{}/{}' has a negative rate",
                    rate.provider, rate.model_pattern
                )));
            }
        }

        Ok(())
    }

    /// Check if an API key is available for the default provider.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self
                .providers
                .get(&self.default_provider)
                .is_some_and(|p| p.api_key.is_some())
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            composition: CompositionConfig::default(),
            parser: ParserConfig::default(),
            storage: StorageConfig::default(),
            preferences: UserPreferences::default(),
            pricing: vec![],
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Failed to write config file at {path}: {reason}")]
    WriteError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptforge_core::Verbosity;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "anthropic");
        assert_eq!(config.parser.code_signal_threshold, 3);
        assert_eq!(config.composition.mode, CompositionMode::Layered);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.storage.backend, StorageBackend::File);
    }

    #[test]
    fn zero_threshold_rejected() {
        let mut config = AppConfig::default();
        config.parser.code_signal_threshold = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_pricing_rejected() {
        let config = AppConfig {
            pricing: vec![PricingOverride {
                provider: "openai".into(),
                model_pattern: "gpt-4o".into(),
                input_per_1k: -1.0,
                output_per_1k: 0.0,
            }],
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        let config = result.unwrap();
        assert_eq!(config.default_model, "claude-3-5-sonnet");
    }

    #[test]
    fn full_file_parses() {
        let toml_str = r#"
default_provider = "openai"
default_model = "gpt-4o"

[composition]
mode = "direct"
token_budget = 2048

[parser]
code_signal_threshold = 4

[preferences]
preferred_languages = ["rust"]
verbosity = "concise"

[[pricing]]
provider = "openai"
model_pattern = "gpt-4o"
input_per_1k = 0.002
output_per_1k = 0.008

[providers.openai]
api_key = "sk-secret"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.composition.mode, CompositionMode::Direct);
        assert_eq!(config.composition.token_budget, Some(2048));
        assert_eq!(config.parser.code_signal_threshold, 4);
        assert!(config.parser.keep_raw);
        assert_eq!(config.preferences.verbosity, Some(Verbosity::Concise));
        assert_eq!(config.pricing.len(), 1);
        assert!(config.has_api_key());
    }

    #[test]
    fn debug_output_redacts_keys() {
        let mut config = AppConfig {
            api_key: Some("sk-top-secret".into()),
            ..AppConfig::default()
        };
        config.providers.insert(
            "openai".into(),
            ProviderConfig {
                api_key: Some("sk-other".into()),
                default_model: None,
            },
        );
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-top-secret"));
        assert!(!debug.contains("sk-other"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config
            .apply_env_overrides(|name| match name {
                "PROMPTFORGE_MODEL" => Some("claude-3-haiku".into()),
                "PROMPTFORGE_TOKEN_BUDGET" => Some("1024".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.default_model, "claude-3-haiku");
        assert_eq!(config.composition.token_budget, Some(1024));
    }

    #[test]
    fn bad_budget_env_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env_overrides(|name| {
                (name == "PROMPTFORGE_TOKEN_BUDGET").then(|| "lots".to_string())
            })
            .unwrap_err();
        assert!(err.to_string().contains("PROMPTFORGE_TOKEN_BUDGET"));
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = AppConfig::default();
        config.default_model = "gpt-4o-mini".into();
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.default_model, "gpt-4o-mini");
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("anthropic"));
        assert!(toml_str.contains("code_signal_threshold"));
    }
}
