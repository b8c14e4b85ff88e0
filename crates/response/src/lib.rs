//! Response structuring.
//!
//! Turns raw provider text into a [`StructuredResponse`]: the prose
//! explanation, the fenced code blocks it contained, and usage metadata.
//! Parsing never fails. Malformed or unexpected input degrades to plain
//! prose with no code blocks, and upstream errors become an error-shaped
//! response so callers always render one shape.

pub mod heuristic;
pub mod language;
pub mod merge;
pub mod model;
pub mod parser;

pub use heuristic::{CODE_SIGNAL_THRESHOLD, CodeSignal, code_signals, infer_language, looks_like_code};
pub use language::normalize_language;
pub use merge::merge_responses;
pub use model::{CodeBlock, ResponseMeta, StructuredResponse, TokenCounts};
pub use parser::ResponseParser;
