//! Built-in pricing table for common LLM models.
//!
//! Prices are in USD per 1,000 tokens. A rate tier is keyed by a normalized
//! provider name and a model substring, so one provider can price `opus`,
//! `sonnet` and `haiku` models differently. Tiers are searched in order and
//! the first match wins; more specific patterns must come first
//! (`gpt-4o-mini` before `gpt-4o` before `gpt-4`).

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Per-1K-token rates for a model tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelRates {
    /// Price per 1K input tokens in USD.
    pub input_per_1k: f64,
    /// Price per 1K output tokens in USD.
    pub output_per_1k: f64,
}

impl ModelRates {
    pub fn new(input_per_1k: f64, output_per_1k: f64) -> Self {
        Self {
            input_per_1k,
            output_per_1k,
        }
    }

    /// Compute cost for the given token counts.
    pub fn cost(&self, input_tokens: usize, output_tokens: usize) -> CostEstimate {
        let input_cost = input_tokens as f64 / 1000.0 * self.input_per_1k;
        let output_cost = output_tokens as f64 / 1000.0 * self.output_per_1k;
        CostEstimate {
            input_cost,
            output_cost,
            total_cost: input_cost + output_cost,
            currency: CostEstimate::CURRENCY.to_string(),
        }
    }
}

/// One row of the pricing table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTier {
    /// Normalized provider name (see [`normalize_provider`]).
    pub provider: String,
    /// Lowercase substring matched against the model identifier.
    pub model_pattern: String,
    pub rates: ModelRates,
}

/// The estimated cost of one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
    pub currency: String,
}

impl CostEstimate {
    pub const CURRENCY: &'static str = "USD";

    /// The fallback for unknown provider/model combinations.
    pub fn zero() -> Self {
        Self {
            input_cost: 0.0,
            output_cost: 0.0,
            total_cost: 0.0,
            currency: Self::CURRENCY.to_string(),
        }
    }
}

impl Default for CostEstimate {
    fn default() -> Self {
        Self::zero()
    }
}

/// Map a provider label to its canonical pricing key.
///
/// `"Claude"` and `"anthropic"` both become `"anthropic"`; `"gpt"` and
/// `"OpenAI"` become `"openai"`; `"gemini"` becomes `"google"`. Anything
/// else is lowercased and trimmed.
pub fn normalize_provider(provider: &str) -> String {
    let lower = provider.trim().to_lowercase();
    if lower.contains("anthropic") || lower.contains("claude") {
        "anthropic".into()
    } else if lower.contains("openai") || lower.contains("gpt") {
        "openai".into()
    } else if lower.contains("google") || lower.contains("gemini") {
        "google".into()
    } else {
        lower
    }
}

/// Ordered pricing table with built-in defaults and custom overrides.
#[derive(Debug, Clone)]
pub struct PricingTable {
    tiers: Vec<RateTier>,
}

impl PricingTable {
    /// Create a pricing table with built-in model prices.
    pub fn with_defaults() -> Self {
        let mut table = Self::empty();

        // ── Anthropic ──────────────────────────────────────────────
        table.push("anthropic", "opus", ModelRates::new(0.015, 0.075));
        table.push("anthropic", "sonnet", ModelRates::new(0.003, 0.015));
        table.push("anthropic", "haiku", ModelRates::new(0.00025, 0.00125));
        table.push("anthropic", "claude-2", ModelRates::new(0.008, 0.024));
        table.push("anthropic", "claude-instant", ModelRates::new(0.0008, 0.0024));

        // ── OpenAI ─────────────────────────────────────────────────
        table.push("openai", "gpt-4o-mini", ModelRates::new(0.00015, 0.0006));
        table.push("openai", "gpt-4o", ModelRates::new(0.0025, 0.01));
        table.push("openai", "gpt-4-turbo", ModelRates::new(0.01, 0.03));
        table.push("openai", "gpt-4", ModelRates::new(0.03, 0.06));
        table.push("openai", "gpt-3.5", ModelRates::new(0.0005, 0.0015));
        table.push("openai", "o1-mini", ModelRates::new(0.003, 0.012));
        table.push("openai", "o1", ModelRates::new(0.015, 0.06));

        // ── Google ─────────────────────────────────────────────────
        table.push("google", "flash", ModelRates::new(0.000075, 0.0003));
        table.push("google", "pro", ModelRates::new(0.00125, 0.005));

        table
    }

    /// Create an empty pricing table.
    pub fn empty() -> Self {
        Self { tiers: Vec::new() }
    }

    fn push(&mut self, provider: &str, pattern: &str, rates: ModelRates) {
        self.tiers.push(RateTier {
            provider: provider.into(),
            model_pattern: pattern.into(),
            rates,
        });
    }

    /// Add an override. Overrides are consulted before every built-in tier.
    pub fn set(&mut self, provider: &str, model_pattern: &str, rates: ModelRates) {
        let provider = normalize_provider(provider);
        let model_pattern = model_pattern.trim().to_lowercase();
        self.tiers
            .retain(|t| !(t.provider == provider && t.model_pattern == model_pattern));
        self.tiers.insert(
            0,
            RateTier {
                provider,
                model_pattern,
                rates,
            },
        );
    }

    /// Look up the rates for a provider/model pair.
    ///
    /// When the provider label is blank, the provider is inferred from the
    /// model name (`claude-3-haiku` → anthropic).
    pub fn rates_for(&self, provider: &str, model: &str) -> Option<ModelRates> {
        let model = model.trim().to_lowercase();
        let provider = if provider.trim().is_empty() {
            normalize_provider(&model)
        } else {
            normalize_provider(provider)
        };

        self.tiers
            .iter()
            .find(|t| t.provider == provider && model.contains(&t.model_pattern))
            .map(|t| t.rates)
    }

    /// Estimate the cost of a call, falling back to zero for unknown models.
    pub fn estimate_cost(
        &self,
        input_tokens: usize,
        output_tokens: usize,
        provider: &str,
        model: &str,
    ) -> CostEstimate {
        match self.rates_for(provider, model) {
            Some(rates) => rates.cost(input_tokens, output_tokens),
            None => {
                debug!(provider, model, "No pricing tier, estimating zero cost");
                CostEstimate::zero()
            }
        }
    }

    /// All tiers in lookup order.
    pub fn tiers(&self) -> &[RateTier] {
        &self.tiers
    }

    /// Number of tiers in the table.
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_has_tiers() {
        let table = PricingTable::with_defaults();
        assert!(table.len() >= 12);
        assert!(!table.is_empty());
    }

    #[test]
    fn model_family_selects_tier() {
        let table = PricingTable::with_defaults();
        let opus = table.rates_for("anthropic", "claude-3-opus-20240229").unwrap();
        let sonnet = table.rates_for("anthropic", "claude-3-5-sonnet-latest").unwrap();
        let haiku = table.rates_for("anthropic", "claude-3-haiku").unwrap();
        assert!(opus.input_per_1k > sonnet.input_per_1k);
        assert!(sonnet.input_per_1k > haiku.input_per_1k);
    }

    #[test]
    fn specific_patterns_win_over_general() {
        let table = PricingTable::with_defaults();
        let mini = table.rates_for("openai", "gpt-4o-mini-2024-07-18").unwrap();
        let four_o = table.rates_for("openai", "gpt-4o").unwrap();
        let turbo = table.rates_for("openai", "gpt-4-turbo-preview").unwrap();
        assert_eq!(mini, ModelRates::new(0.00015, 0.0006));
        assert_eq!(four_o, ModelRates::new(0.0025, 0.01));
        assert_eq!(turbo, ModelRates::new(0.01, 0.03));
    }

    #[test]
    fn provider_aliases_normalize() {
        assert_eq!(normalize_provider(" Claude "), "anthropic");
        assert_eq!(normalize_provider("OpenAI"), "openai");
        assert_eq!(normalize_provider("gemini"), "google");
        assert_eq!(normalize_provider("Mistral"), "mistral");
    }

    #[test]
    fn known_model_cost() {
        let table = PricingTable::with_defaults();
        // Sonnet: $0.003/1K input, $0.015/1K output
        let cost = table.estimate_cost(1000, 500, "claude", "claude-3-5-sonnet");
        assert!((cost.input_cost - 0.003).abs() < 1e-12);
        assert!((cost.output_cost - 0.0075).abs() < 1e-12);
        assert!((cost.total_cost - 0.0105).abs() < 1e-12);
        assert_eq!(cost.currency, "USD");
    }

    #[test]
    fn unknown_model_returns_zero() {
        let table = PricingTable::with_defaults();
        let cost = table.estimate_cost(1000, 500, "anthropic", "unknown-model");
        assert_eq!(cost, CostEstimate::zero());
        let cost = table.estimate_cost(1000, 500, "acme", "gpt-4o");
        assert_eq!(cost.total_cost, 0.0);
    }

    #[test]
    fn blank_provider_is_inferred_from_model() {
        let table = PricingTable::with_defaults();
        assert!(table.rates_for("", "gemini-1.5-flash").is_some());
    }

    #[test]
    fn override_takes_precedence() {
        let mut table = PricingTable::with_defaults();
        table.set("Claude", "Sonnet", ModelRates::new(1.0, 2.0));
        let rates = table.rates_for("anthropic", "claude-3-5-sonnet").unwrap();
        assert_eq!(rates, ModelRates::new(1.0, 2.0));
    }

    #[test]
    fn custom_provider_pricing() {
        let mut table = PricingTable::empty();
        assert!(table.is_empty());
        table.set("mistral", "large", ModelRates::new(0.002, 0.006));
        let cost = table.estimate_cost(2000, 1000, "Mistral", "mistral-large-latest");
        assert!((cost.total_cost - 0.01).abs() < 1e-12);
    }
}
