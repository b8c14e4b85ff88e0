//! Token estimation utilities.
//!
//! Uses a character-based heuristic: ~4 characters per token, rounded up.
//! This is an approximation, not a tokenizer-accurate count. It is close
//! enough for budgeting a prompt before sending it and for reporting usage
//! when a provider does not return its own counts.

/// Characters per token assumed by [`estimate_tokens`].
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token count for a string.
///
/// Heuristic: 1 token ≈ 4 characters. Rounds up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}
