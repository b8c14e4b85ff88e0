//! Provider trait — the abstraction over LLM backends.
//!
//! The pipeline only needs one capability from a provider: send the final
//! prompt text and get either the reply text or an error back. HTTP, API
//! keys, retry policy and request shaping all live behind this trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Token usage reported by a provider, when it reports any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl Usage {
    pub fn total_tokens(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// A completed (non-streaming) reply from a provider.
///
/// Streaming collaborators hand over the final concatenated text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    /// The raw reply text.
    pub text: String,

    /// Provider-reported token usage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// Which model actually answered, if the provider says so.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Completion {
    /// A completion carrying only text.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
            model: None,
        }
    }

    /// Attach provider-reported usage.
    pub fn with_usage(mut self, prompt_tokens: u32, completion_tokens: u32) -> Self {
        self.usage = Some(Usage {
            prompt_tokens,
            completion_tokens,
        });
        self
    }
}

/// The core Provider trait.
///
/// Every backend (Claude, OpenAI, Gemini, a test double) implements this.
/// A call is single-shot: no retry, backoff or cancellation is expected
/// from the caller's side.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable provider name (e.g., "anthropic", "openai").
    fn name(&self) -> &str;

    /// The model requests are sent to.
    fn model(&self) -> &str;

    /// Send a prompt and wait for the complete reply.
    async fn send(&self, prompt: &str) -> std::result::Result<Completion, ProviderError>;
}
