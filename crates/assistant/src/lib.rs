//! # PromptForge Assistant
//!
//! Wires the composer, a [`Provider`](promptforge_core::Provider), the
//! response parser, and the session tracker into one submit pipeline.
//!
//! ```text
//! user prompt ──► compose layers ──► provider.send ──► parse ──► session
//!                  (layered mode)      (once)          │          history
//!                                                      └──► usage ledger
//! ```
//!
//! A failed provider call never escapes as an error: it is recorded as an
//! error-shaped [`StructuredResponse`](promptforge_response::StructuredResponse)
//! so every iteration has the same shape.

pub mod assistant;
pub mod settings;

pub use assistant::{Assistant, Submission, pricing_table};
pub use settings::{SETTINGS_KEY, Settings, SettingsManager};
