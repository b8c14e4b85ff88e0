//! Layered prompt composition.
//!
//! A prompt is assembled from independent layers (system persona, task
//! instruction, memory, user preferences, extra context, behavior rules).
//! Each layer carries a priority; enabled layers are composed highest
//! priority first and joined with blank lines.
//!
//! # Priority tiers
//!
//! | Tier | Value | Default for |
//! |------|-------|-------------|
//! | `CRITICAL` | 100 | never dropped by a token budget |
//! | `HIGH` | 75 | system, behavior |
//! | `MEDIUM` | 50 | task, memory, preferences |
//! | `LOW` | 25 | context |
//!
//! # Determinism
//!
//! Composition is a pure function of the layer registry: ties are broken
//! by insertion order and no randomness is involved. Only the timing
//! fields in the metadata differ between runs.

pub mod composer;
pub mod layer;

pub use composer::{
    ComposedLayer, ComposedPrompt, Composer, CompositionMetadata, DroppedLayer, ExcludedLayer,
    LayerFilter,
};
pub use layer::{Capability, Layer, LayerBody, LayerId, LayerKind, priority};
