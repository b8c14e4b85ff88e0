//! Structured response types.

use chrono::{DateTime, Utc};
use promptforge_core::Usage;
use promptforge_telemetry::{CostEstimate, PricingTable, estimate_tokens};
use serde::{Deserialize, Serialize};

use crate::language::normalize_language;

/// A fenced (or inferred) code region extracted from a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    /// Canonical lowercase language key, `"text"` when untagged.
    pub language: String,
    /// Trimmed block body. Never empty.
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// The lead-in sentence that introduced this block, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl CodeBlock {
    pub fn new(language: &str, code: impl Into<String>) -> Self {
        Self {
            language: normalize_language(language),
            code: code.into(),
            filename: None,
            explanation: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCounts {
    pub input: usize,
    pub output: usize,
    pub total: usize,
}

impl TokenCounts {
    pub fn new(input: usize, output: usize) -> Self {
        Self {
            input,
            output,
            total: input + output,
        }
    }
}

/// Caller-supplied usage metadata attached to a structured response.
///
/// The parser never computes these values itself; build them with
/// [`ResponseMeta::estimate`] or fill them from provider-reported data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub provider: String,
    pub model: String,
    pub tokens: TokenCounts,
    pub cost: CostEstimate,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl ResponseMeta {
    /// Metadata with zero usage.
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            tokens: TokenCounts::default(),
            cost: CostEstimate::zero(),
            duration_ms: 0,
            timestamp: Utc::now(),
        }
    }

    /// Derive token counts and cost for one exchange.
    ///
    /// Provider-reported usage wins; otherwise both sides are estimated
    /// from their text. Cost always comes from `pricing`.
    pub fn estimate(
        provider: &str,
        model: &str,
        prompt: &str,
        reply: &str,
        usage: Option<Usage>,
        pricing: &PricingTable,
    ) -> Self {
        let tokens = match usage {
            Some(usage) => TokenCounts::new(
                usage.prompt_tokens as usize,
                usage.completion_tokens as usize,
            ),
            None => TokenCounts::new(estimate_tokens(prompt), estimate_tokens(reply)),
        };
        let cost = pricing.estimate_cost(tokens.input, tokens.output, provider, model);
        Self {
            tokens,
            cost,
            ..Self::new(provider, model)
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

/// The parsed form of a raw provider reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredResponse {
    /// Prose with every fenced block removed and blank lines collapsed.
    pub explanation: String,
    /// Blocks in order of appearance.
    pub code_blocks: Vec<CodeBlock>,
    pub metadata: ResponseMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    /// Set when the response stands in for a failed provider call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StructuredResponse {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn has_code(&self) -> bool {
        !self.code_blocks.is_empty()
    }

    /// First block for a language. The tag is normalized before lookup,
    /// so `"javascript"` finds a `"js"` block.
    pub fn block(&self, language: &str) -> Option<&CodeBlock> {
        let key = normalize_language(language);
        self.code_blocks.iter().find(|b| b.language == key)
    }

    /// Distinct languages in order of first appearance.
    pub fn languages(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for block in &self.code_blocks {
            if !seen.contains(&block.language.as_str()) {
                seen.push(&block.language);
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_uses_text_length_without_usage() {
        let pricing = PricingTable::with_defaults();
        let meta = ResponseMeta::estimate(
            "anthropic",
            "claude-3-5-sonnet",
            &"p".repeat(4000),
            &"r".repeat(2000),
            None,
            &pricing,
        );
        assert_eq!(meta.tokens, TokenCounts::new(1000, 500));
        assert!((meta.cost.total_cost - 0.0105).abs() < 1e-12);
    }

    #[test]
    fn provider_usage_wins() {
        let pricing = PricingTable::with_defaults();
        let usage = Usage {
            prompt_tokens: 7,
            completion_tokens: 3,
        };
        let meta = ResponseMeta::estimate("openai", "gpt-4o", "ignored", "", Some(usage), &pricing);
        assert_eq!(meta.tokens.total, 10);
    }

    #[test]
    fn unknown_model_costs_nothing() {
        let pricing = PricingTable::with_defaults();
        let meta = ResponseMeta::estimate("acme", "rocket-1", "hi", "there", None, &pricing)
            .with_duration(42);
        assert_eq!(meta.cost, CostEstimate::zero());
        assert_eq!(meta.duration_ms, 42);
    }

    #[test]
    fn block_lookup_normalizes_language() {
        let response = StructuredResponse {
            explanation: String::new(),
            code_blocks: vec![
                CodeBlock::new("javascript", "let a = 1;"),
                CodeBlock::new("css", "a {}"),
                CodeBlock::new("js", "let b = 2;"),
            ],
            metadata: ResponseMeta::new("p", "m"),
            raw: None,
            error: None,
        };
        assert_eq!(response.block("JavaScript").unwrap().code, "let a = 1;");
        assert_eq!(response.languages(), vec!["js", "css"]);
        assert!(response.block("python").is_none());
    }
}
