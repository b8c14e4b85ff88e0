//! `promptforge estimate` and `promptforge pricing` — cost estimation commands.

use promptforge_assistant::pricing_table;
use promptforge_telemetry::{CostEstimate, PricingTable, estimate_tokens};
use std::path::Path;

use super::{CmdResult, load_config, read_input};

/// The numbers printed by `estimate`.
#[derive(Debug, PartialEq)]
pub struct Estimate {
    pub provider: String,
    pub model: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub cost: CostEstimate,
    pub priced: bool,
}

pub fn estimate(
    table: &PricingTable,
    text: &str,
    provider: &str,
    model: &str,
    output_tokens: Option<usize>,
) -> Estimate {
    let input_tokens = estimate_tokens(text);
    let output_tokens = output_tokens.unwrap_or(input_tokens);
    Estimate {
        provider: provider.to_string(),
        model: model.to_string(),
        input_tokens,
        output_tokens,
        cost: table.estimate_cost(input_tokens, output_tokens, provider, model),
        priced: table.rates_for(provider, model).is_some(),
    }
}

pub async fn run(
    config_path: Option<&Path>,
    file: Option<&Path>,
    provider: Option<String>,
    model: Option<String>,
    output_tokens: Option<usize>,
) -> CmdResult {
    let config = load_config(config_path)?;
    let text = read_input(file)?;
    let provider = provider.unwrap_or_else(|| config.default_provider.clone());
    let model = model.unwrap_or_else(|| config.default_model.clone());

    let result = estimate(&pricing_table(&config), &text, &provider, &model, output_tokens);

    println!("📊 Estimate ({}/{})", result.provider, result.model);
    println!("─────────────────────────────────────");
    println!("  Input tokens:   {}", result.input_tokens);
    println!("  Output tokens:  {}", result.output_tokens);
    println!("  Input cost:     ${:.6}", result.cost.input_cost);
    println!("  Output cost:    ${:.6}", result.cost.output_cost);
    println!(
        "  Total cost:     ${:.6} {}",
        result.cost.total_cost, result.cost.currency
    );
    if !result.priced {
        println!();
        println!("  ⚠️  No rate known for this model; cost shown as zero.");
    }

    Ok(())
}

/// List the rate table, overrides first.
pub async fn pricing(config_path: Option<&Path>) -> CmdResult {
    let config = load_config(config_path)?;
    let table = pricing_table(&config);

    println!("💰 Model Pricing (USD per 1K tokens)");
    println!("─────────────────────────────────────────────────────");
    println!(
        "{:<12} {:<20} {:>10} {:>10}",
        "Provider", "Model match", "Input", "Output"
    );
    println!(
        "{:<12} {:<20} {:>10} {:>10}",
        "────────", "───────────", "─────", "──────"
    );

    for tier in table.tiers() {
        println!(
            "{:<12} {:<20} {:>10.5} {:>10.5}",
            tier.provider, tier.model_pattern, tier.rates.input_per_1k, tier.rates.output_per_1k
        );
    }

    println!();
    println!("  {} tiers. Estimates only; list prices drift.", table.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_defaults_to_input_size() {
        let table = PricingTable::with_defaults();
        let result = estimate(&table, &"x".repeat(4000), "anthropic", "claude-3-opus", None);
        assert_eq!(result.input_tokens, 1000);
        assert_eq!(result.output_tokens, 1000);
        assert!(result.priced);
        assert!((result.cost.total_cost - 0.09).abs() < 1e-9);
    }

    #[test]
    fn unknown_model_is_unpriced() {
        let table = PricingTable::with_defaults();
        let result = estimate(&table, "hello", "acme", "mystery", Some(10));
        assert_eq!(result.output_tokens, 10);
        assert!(!result.priced);
        assert_eq!(result.cost.total_cost, 0.0);
    }
}
