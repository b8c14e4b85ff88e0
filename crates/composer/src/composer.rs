//! The layer registry and the composition pipeline.
//!
//! # Algorithm
//!
//! 1. Apply the optional [`LayerFilter`] (kinds, ids, enabled flag)
//! 2. Set disabled layers aside; they are reported as excluded
//! 3. Stable sort the rest by priority, highest first (ties keep insertion order)
//! 4. With a token budget, admit layers greedily in that order; `CRITICAL`
//!    layers are always admitted, others are dropped when they do not fit.
//!    A layer's cost includes the separator that joins it to earlier text
//! 5. Join the trimmed, non-empty layer contents with a blank line

use chrono::{DateTime, Utc};
use promptforge_core::{ConfigurationError, NotFoundError, PreferencesPatch};
use promptforge_telemetry::estimate_tokens;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::layer::{Layer, LayerId, LayerKind, priority};

const LAYER_SEPARATOR: &str = "\n\n";

// ── Types ─────────────────────────────────────────────────────────────────

/// Restricts which layers take part in a composition.
///
/// Unset criteria match everything. A set criterion must not be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kinds: Option<Vec<LayerKind>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<LayerId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl LayerFilter {
    pub fn kinds(kinds: impl IntoIterator<Item = LayerKind>) -> Self {
        Self {
            kinds: Some(kinds.into_iter().collect()),
            ..Default::default()
        }
    }

    pub fn ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<LayerId>,
    {
        Self {
            ids: Some(ids.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.kinds.as_ref().is_some_and(Vec::is_empty) {
            return Err(ConfigurationError::InvalidFilter(
                "kind list is empty".into(),
            ));
        }
        if let Some(ids) = &self.ids {
            if ids.is_empty() {
                return Err(ConfigurationError::InvalidFilter("id list is empty".into()));
            }
            if ids.iter().any(|id| id.as_str().trim().is_empty()) {
                return Err(ConfigurationError::InvalidFilter(
                    "id list contains a blank id".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn matches(&self, layer: &Layer) -> bool {
        let kind_ok = self
            .kinds
            .as_ref()
            .is_none_or(|kinds| kinds.contains(&layer.kind()));
        let id_ok = self
            .ids
            .as_ref()
            .is_none_or(|ids| ids.contains(layer.id()));
        let enabled_ok = self.enabled.is_none_or(|e| e == layer.is_enabled());
        kind_ok && id_ok && enabled_ok
    }
}

/// One layer as it took part in a composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedLayer {
    pub id: LayerId,
    pub kind: LayerKind,
    pub priority: i32,
    /// Trimmed content. May be empty; empty layers are listed but add no text.
    pub content: String,
    pub tokens: usize,
}

/// A disabled layer that matched the filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedLayer {
    pub id: LayerId,
    pub kind: LayerKind,
}

/// A layer left out because it did not fit the token budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedLayer {
    pub id: LayerId,
    pub kind: LayerKind,
    pub priority: i32,
    pub tokens: usize,
}

/// Bookkeeping about one composition run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionMetadata {
    pub composed_at: DateTime<Utc>,
    pub duration_us: u64,
    pub excluded: Vec<ExcludedLayer>,
    pub dropped: Vec<DroppedLayer>,
    pub budget: Option<usize>,
}

/// The result of composing the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedPrompt {
    pub text: String,
    /// Included layers in composition order.
    pub layers: Vec<ComposedLayer>,
    pub token_estimate: usize,
    pub metadata: CompositionMetadata,
}

impl ComposedPrompt {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn layer_ids(&self) -> Vec<LayerId> {
        self.layers.iter().map(|l| l.id.clone()).collect()
    }
}

// ── Composer ──────────────────────────────────────────────────────────────

/// Owns an ordered registry of layers and composes them into prompt text.
#[derive(Debug, Clone, Default)]
pub struct Composer {
    layers: Vec<Layer>,
    next_seq: u64,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a layer, register it, and return its generated id.
    pub fn create_layer(
        &mut self,
        kind: LayerKind,
        content: impl Into<String>,
        priority: Option<i32>,
    ) -> LayerId {
        let id = self.next_id(kind);
        let layer = Layer::new(id.clone(), kind, content, priority);
        debug!(layer_id = %id, kind = %kind, priority = layer.priority(), "Layer created");
        self.layers.push(layer);
        id
    }

    /// Create a layer from a type tag such as `"system"` or `"memory"`.
    pub fn create_layer_by_tag(
        &mut self,
        tag: &str,
        content: impl Into<String>,
        priority: Option<i32>,
    ) -> Result<LayerId, ConfigurationError> {
        let kind: LayerKind = tag.parse()?;
        Ok(self.create_layer(kind, content, priority))
    }

    /// Register a prebuilt layer under its own id.
    pub fn insert_layer(&mut self, layer: Layer) -> Result<(), ConfigurationError> {
        if self.layers.iter().any(|l| l.id() == layer.id()) {
            return Err(ConfigurationError::DuplicateLayerId(layer.id().to_string()));
        }
        debug!(layer_id = %layer.id(), kind = %layer.kind(), "Layer inserted");
        self.layers.push(layer);
        Ok(())
    }

    pub fn remove_layer(&mut self, id: &LayerId) -> Result<Layer, NotFoundError> {
        let index = self
            .layers
            .iter()
            .position(|l| l.id() == id)
            .ok_or_else(|| NotFoundError::Layer(id.to_string()))?;
        debug!(layer_id = %id, "Layer removed");
        Ok(self.layers.remove(index))
    }

    /// Remove every layer. Idempotent.
    pub fn clear_layers(&mut self) {
        if !self.layers.is_empty() {
            debug!(count = self.layers.len(), "Layers cleared");
        }
        self.layers.clear();
    }

    pub fn layer(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id() == id)
    }

    /// All layers in insertion order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn set_content(
        &mut self,
        id: &LayerId,
        content: impl Into<String>,
    ) -> Result<(), NotFoundError> {
        self.layer_mut(id)?.set_content(content);
        Ok(())
    }

    pub fn set_enabled(&mut self, id: &LayerId, enabled: bool) -> Result<(), NotFoundError> {
        self.layer_mut(id)?.set_enabled(enabled);
        Ok(())
    }

    pub fn set_priority(&mut self, id: &LayerId, priority: i32) -> Result<(), NotFoundError> {
        self.layer_mut(id)?.set_priority(priority);
        Ok(())
    }

    /// Returns `Ok(false)` when the layer is not a preferences layer.
    pub fn set_preferences(
        &mut self,
        id: &LayerId,
        patch: PreferencesPatch,
    ) -> Result<bool, NotFoundError> {
        Ok(self.layer_mut(id)?.set_preferences(patch))
    }

    /// Returns `Ok(false)` when the layer is not a task layer.
    pub fn add_example(
        &mut self,
        id: &LayerId,
        example: impl Into<String>,
    ) -> Result<bool, NotFoundError> {
        Ok(self.layer_mut(id)?.add_example(example))
    }

    /// Returns `Ok(false)` when the layer is not a memory layer.
    pub fn add_entry(
        &mut self,
        id: &LayerId,
        entry: impl Into<String>,
    ) -> Result<bool, NotFoundError> {
        Ok(self.layer_mut(id)?.add_entry(entry))
    }

    /// Compose every enabled layer.
    pub fn compose(&self) -> ComposedPrompt {
        self.assemble(None, None)
    }

    /// Compose the enabled layers that match `filter`.
    pub fn compose_filtered(
        &self,
        filter: &LayerFilter,
    ) -> Result<ComposedPrompt, ConfigurationError> {
        filter.validate()?;
        Ok(self.assemble(Some(filter), None))
    }

    /// Compose within a token budget. Layers are admitted highest priority
    /// first; `CRITICAL` layers are admitted even past the budget.
    pub fn compose_within_budget(
        &self,
        filter: Option<&LayerFilter>,
        budget: usize,
    ) -> Result<ComposedPrompt, ConfigurationError> {
        if let Some(filter) = filter {
            filter.validate()?;
        }
        Ok(self.assemble(filter, Some(budget)))
    }

    fn layer_mut(&mut self, id: &LayerId) -> Result<&mut Layer, NotFoundError> {
        self.layers
            .iter_mut()
            .find(|l| l.id() == id)
            .ok_or_else(|| NotFoundError::Layer(id.to_string()))
    }

    fn next_id(&mut self, kind: LayerKind) -> LayerId {
        loop {
            self.next_seq += 1;
            let candidate = LayerId(format!("{kind}-{}", self.next_seq));
            if self.layer(&candidate).is_none() {
                return candidate;
            }
        }
    }

    fn assemble(&self, filter: Option<&LayerFilter>, budget: Option<usize>) -> ComposedPrompt {
        let started = Instant::now();

        let mut excluded = Vec::new();
        let mut selected: Vec<&Layer> = Vec::new();
        for layer in &self.layers {
            if filter.is_some_and(|f| !f.matches(layer)) {
                continue;
            }
            if !layer.is_enabled() {
                excluded.push(ExcludedLayer {
                    id: layer.id().clone(),
                    kind: layer.kind(),
                });
                continue;
            }
            selected.push(layer);
        }

        // sort_by_key is stable: equal priorities keep insertion order
        selected.sort_by_key(|l| Reverse(l.priority()));

        let mut layers = Vec::with_capacity(selected.len());
        let mut dropped = Vec::new();
        let mut used = 0usize;
        let mut has_text = false;
        for layer in selected {
            let content = layer.content().trim().to_string();
            let tokens = estimate_tokens(&content);
            // Joining a non-empty layer after another costs a separator too
            let cost = if has_text && !content.is_empty() {
                tokens + estimate_tokens(LAYER_SEPARATOR)
            } else {
                tokens
            };

            if let Some(budget) = budget {
                if layer.priority() < priority::CRITICAL && used + cost > budget {
                    warn!(
                        layer_id = %layer.id(),
                        tokens,
                        used,
                        budget,
                        "Layer dropped, over token budget"
                    );
                    dropped.push(DroppedLayer {
                        id: layer.id().clone(),
                        kind: layer.kind(),
                        priority: layer.priority(),
                        tokens,
                    });
                    continue;
                }
            }

            used += cost;
            has_text |= !content.is_empty();
            layers.push(ComposedLayer {
                id: layer.id().clone(),
                kind: layer.kind(),
                priority: layer.priority(),
                content,
                tokens,
            });
        }

        let text = layers
            .iter()
            .map(|l| l.content.as_str())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join(LAYER_SEPARATOR);
        let token_estimate = estimate_tokens(&text);

        info!(
            layers = layers.len(),
            excluded = excluded.len(),
            dropped = dropped.len(),
            token_estimate,
            "Prompt composed"
        );

        ComposedPrompt {
            text,
            layers,
            token_estimate,
            metadata: CompositionMetadata {
                composed_at: Utc::now(),
                duration_us: started.elapsed().as_micros() as u64,
                excluded,
                dropped,
                budget,
            },
        }
    }
}
