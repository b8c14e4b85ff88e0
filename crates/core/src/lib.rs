//! # PromptForge Core
//!
//! Domain types, traits, and error definitions shared by every PromptForge
//! crate. Nothing here talks to the network or the filesystem.
//!
//! ## Design Philosophy
//!
//! External collaborators (LLM providers, persistence backends) are defined
//! as traits here and implemented elsewhere. Process-wide state does not
//! exist: every composer, tracker, and settings object is constructed
//! explicitly and handed to whoever needs it.

pub mod error;
pub mod event;
pub mod mode;
pub mod preferences;
pub mod provider;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use error::{
    ConfigurationError, Error, NotFoundError, ProviderError, Result, StorageError,
};
pub use event::{DomainEvent, EventBus, EventKind, EventSubscription, LayerChange};
pub use mode::CompositionMode;
pub use preferences::{PreferencesPatch, UserPreferences, Verbosity};
pub use provider::{Completion, Provider, Usage};
pub use store::KeyValueStore;
