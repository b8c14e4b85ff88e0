//! Token estimation, cost estimation, and usage tracking for PromptForge.
//!
//! Every number produced here is a best-effort estimate surfaced to the
//! user. Token counts use a fixed character heuristic rather than a real
//! tokenizer, and the rate table is a snapshot of public list prices that
//! will drift. Nothing here is suitable for billing enforcement.

pub mod ledger;
pub mod pricing;
pub mod token;

use std::sync::LazyLock;

pub use ledger::{ModelUsage, UsageLedger, UsageSnapshot};
pub use pricing::{CostEstimate, ModelRates, PricingTable, RateTier, normalize_provider};
pub use token::estimate_tokens;

static DEFAULT_PRICING: LazyLock<PricingTable> = LazyLock::new(PricingTable::with_defaults);

/// Estimate the cost of a call against the built-in rate table.
///
/// Unknown provider/model combinations cost zero.
pub fn estimate_cost(
    input_tokens: usize,
    output_tokens: usize,
    provider: &str,
    model: &str,
) -> CostEstimate {
    DEFAULT_PRICING.estimate_cost(input_tokens, output_tokens, provider, model)
}
