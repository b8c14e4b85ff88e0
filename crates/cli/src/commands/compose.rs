//! `promptforge compose` — compose a layer file into a prompt.
//!
//! Layer file format:
//!
//! ```toml
//! [[layers]]
//! kind = "system"
//! content = "You are a senior Rust reviewer."
//!
//! [[layers]]
//! kind = "task"
//! id = "review"            # optional, generated when absent
//! priority = 90            # optional, defaults to the kind's tier
//! content = "Review the diff below."
//! examples = ["Point out unchecked unwraps."]
//!
//! [[layers]]
//! kind = "preferences"
//! [layers.preferences]
//! preferred_languages = ["rust"]
//! include_tests = true
//! ```

use promptforge_composer::{ComposedPrompt, Composer, Layer, LayerId, LayerKind};
use promptforge_core::{PreferencesPatch, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

use super::{CmdResult, load_config};

#[derive(Debug, Deserialize)]
pub struct LayerFile {
    #[serde(default)]
    pub layers: Vec<LayerSpec>,
}

#[derive(Debug, Deserialize)]
pub struct LayerSpec {
    pub kind: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub entries: Vec<String>,
    #[serde(default)]
    pub preferences: Option<PreferencesPatch>,
}

fn default_true() -> bool {
    true
}

/// Register every layer in `file` with a fresh composer.
pub fn build_composer(file: LayerFile) -> Result<Composer> {
    let mut composer = Composer::new();

    for spec in file.layers {
        let kind: LayerKind = spec.kind.parse()?;
        let id = match spec.id.as_deref() {
            Some(id) => {
                composer.insert_layer(Layer::new(id, kind, spec.content, spec.priority))?;
                LayerId::from(id)
            }
            None => composer.create_layer(kind, spec.content, spec.priority),
        };

        for example in spec.examples {
            if !composer.add_example(&id, example)? {
                warn!(layer_id = %id, kind = %kind, "Ignoring examples on a layer without examples");
                break;
            }
        }
        for entry in spec.entries {
            if !composer.add_entry(&id, entry)? {
                warn!(layer_id = %id, kind = %kind, "Ignoring entries on a layer without entries");
                break;
            }
        }
        if let Some(patch) = spec.preferences {
            if !composer.set_preferences(&id, patch)? {
                warn!(layer_id = %id, kind = %kind, "Ignoring preferences on a non-preferences layer");
            }
        }
        if !spec.enabled {
            composer.set_enabled(&id, false)?;
        }
    }

    Ok(composer)
}

/// Compose with an optional token budget.
pub fn compose(composer: &Composer, budget: Option<usize>) -> Result<ComposedPrompt> {
    Ok(match budget {
        Some(budget) => composer.compose_within_budget(None, budget)?,
        None => composer.compose(),
    })
}

pub async fn run(config_path: Option<&Path>, layers: &Path, budget: Option<usize>) -> CmdResult {
    let config = load_config(config_path)?;
    let content = std::fs::read_to_string(layers)
        .map_err(|e| format!("Failed to read {}: {e}", layers.display()))?;
    let file: LayerFile =
        toml::from_str(&content).map_err(|e| format!("Invalid layer file: {e}"))?;

    let composer = build_composer(file)?;
    let budget = budget.or(config.composition.token_budget).filter(|b| *b > 0);
    let composed = compose(&composer, budget)?;

    println!("{}", composed.text);

    eprintln!();
    eprintln!("🧩 Composition");
    eprintln!("─────────────────────────────────────");
    for layer in &composed.layers {
        eprintln!(
            "  ✅ {:<20} {:<12} priority {:>4}  ~{} tokens",
            layer.id, layer.kind, layer.priority, layer.tokens
        );
    }
    for layer in &composed.metadata.excluded {
        eprintln!("  ⏸️  {:<20} {:<12} disabled", layer.id, layer.kind);
    }
    for layer in &composed.metadata.dropped {
        eprintln!(
            "  ✂️  {:<20} {:<12} priority {:>4}  ~{} tokens (over budget)",
            layer.id, layer.kind, layer.priority, layer.tokens
        );
    }
    match composed.metadata.budget {
        Some(budget) => eprintln!("  Total: ~{} tokens (budget {budget})", composed.token_estimate),
        None => eprintln!("  Total: ~{} tokens", composed.token_estimate),
    }

    Ok(())
}
