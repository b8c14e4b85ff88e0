//! Running usage totals across provider calls.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Totals for a single provider/model pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelUsage {
    pub requests: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost: f64,
}

/// A point-in-time copy of the ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub requests: u64,
    pub failed_requests: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_cost: f64,
    /// Keyed by `provider/model`.
    pub per_model: BTreeMap<String, ModelUsage>,
}

/// Accumulates estimated usage for one assistant instance.
///
/// Owned by its assistant; no interior mutability.
#[derive(Debug, Default)]
pub struct UsageLedger {
    totals: UsageSnapshot,
}

impl UsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one provider call.
    pub fn record(
        &mut self,
        provider: &str,
        model: &str,
        input_tokens: usize,
        output_tokens: usize,
        cost: f64,
        succeeded: bool,
    ) {
        let totals = &mut self.totals;
        totals.requests += 1;
        if !succeeded {
            totals.failed_requests += 1;
        }
        totals.input_tokens += input_tokens as u64;
        totals.output_tokens += output_tokens as u64;
        totals.total_cost += cost;

        let entry = totals
            .per_model
            .entry(format!("{provider}/{model}"))
            .or_default();
        entry.requests += 1;
        entry.input_tokens += input_tokens as u64;
        entry.output_tokens += output_tokens as u64;
        entry.cost += cost;
    }

    /// Total tokens (input + output) recorded so far.
    pub fn total_tokens(&self) -> u64 {
        self.totals.input_tokens + self.totals.output_tokens
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        self.totals.clone()
    }

    pub fn reset(&mut self) {
        self.totals = UsageSnapshot::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_accumulate_per_model() {
        let mut ledger = UsageLedger::new();
        ledger.record("anthropic", "claude-3-haiku", 100, 50, 0.001, true);
        ledger.record("anthropic", "claude-3-haiku", 10, 0, 0.0, false);
        ledger.record("openai", "gpt-4o", 200, 100, 0.0015, true);

        let snap = ledger.snapshot();
        assert_eq!(snap.requests, 3);
        assert_eq!(snap.failed_requests, 1);
        assert_eq!(ledger.total_tokens(), 460);
        assert!((snap.total_cost - 0.0025).abs() < 1e-12);

        let haiku = &snap.per_model["anthropic/claude-3-haiku"];
        assert_eq!(haiku.requests, 2);
        assert_eq!(haiku.input_tokens, 110);
    }

    #[test]
    fn reset_clears_totals() {
        let mut ledger = UsageLedger::new();
        ledger.record("openai", "gpt-4o", 1, 1, 0.1, true);
        ledger.reset();
        assert_eq!(ledger.snapshot(), UsageSnapshot::default());
    }

    #[test]
    fn snapshot_serializes() {
        let mut ledger = UsageLedger::new();
        ledger.record("google", "gemini-pro", 5, 5, 0.0, true);
        let json = serde_json::to_string(&ledger.snapshot()).unwrap();
        assert!(json.contains("google/gemini-pro"));
    }
}
