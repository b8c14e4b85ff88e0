//! `promptforge config` — Configuration management commands.

use promptforge_config::AppConfig;
use std::path::Path;

use super::{CmdResult, config_file, load_config};

/// Write the starter config. Returns `false` when a file already exists
/// and `force` is not set.
pub fn write_starter(path: &Path, force: bool) -> Result<bool, Box<dyn std::error::Error>> {
    if path.exists() && !force {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, AppConfig::default_toml())?;
    Ok(true)
}

pub async fn init(config_path: Option<&Path>, force: bool) -> CmdResult {
    let path = config_file(config_path);

    if write_starter(&path, force)? {
        println!("✅ Created config at: {}", path.display());
        println!("\n📝 Next steps:");
        println!("   1. Set default_provider and default_model");
        println!("   2. Add [[pricing]] overrides for models you use");
        println!("   3. Run: promptforge pricing");
    } else {
        println!("⚠️  Config already exists at: {}", path.display());
        println!("   Edit it manually or re-run with --force.");
    }

    Ok(())
}

pub async fn show(config_path: Option<&Path>) -> CmdResult {
    let mut shown = load_config(config_path)?;
    // Never print secrets
    if shown.api_key.is_some() {
        shown.api_key = Some("***".into());
    }
    for provider in shown.providers.values_mut() {
        if provider.api_key.is_some() {
            provider.api_key = Some("***".into());
        }
    }
    let toml_str = toml::to_string_pretty(&shown)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path(config_path: Option<&Path>) -> CmdResult {
    println!("{}", config_file(config_path).display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starter_config_roundtrips() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        assert!(write_starter(&path, false).unwrap());
        assert!(!write_starter(&path, false).unwrap());
        assert!(write_starter(&path, true).unwrap());

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_provider, AppConfig::default().default_provider);
    }
}
