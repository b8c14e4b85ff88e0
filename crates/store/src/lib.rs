//! Key-value persistence backends.
//!
//! Both backends implement [`KeyValueStore`](promptforge_core::KeyValueStore)
//! and store plain JSON values with no schema.
//!
//! - [`InMemoryStore`] — ephemeral, for tests and throwaway runs
//! - [`JsonFileStore`] — one JSON object on disk, rewritten on every mutation

pub mod file_store;
pub mod in_memory;

pub use file_store::JsonFileStore;
pub use in_memory::InMemoryStore;
