//! `promptforge parse` — structure a raw reply and print it as JSON.

use promptforge_assistant::pricing_table;
use promptforge_config::AppConfig;
use promptforge_response::{ResponseMeta, ResponseParser, StructuredResponse};
use std::path::Path;

use super::{CmdResult, load_config, read_input};

/// Parse `raw` with the parser settings and rate table from `config`.
///
/// There is no prompt on this path, so only the output side is estimated.
pub fn structure(
    config: &AppConfig,
    raw: &str,
    provider: &str,
    model: &str,
) -> StructuredResponse {
    let parser = ResponseParser::new()
        .with_threshold(config.parser.code_signal_threshold)
        .with_keep_raw(config.parser.keep_raw);
    let metadata = ResponseMeta::estimate(provider, model, "", raw, None, &pricing_table(config));
    parser.parse(raw, metadata)
}

pub async fn run(
    config_path: Option<&Path>,
    file: Option<&Path>,
    provider: Option<String>,
    model: Option<String>,
) -> CmdResult {
    let config = load_config(config_path)?;
    let raw = read_input(file)?;
    let provider = provider.unwrap_or_else(|| config.default_provider.clone());
    let model = model.unwrap_or_else(|| config.default_model.clone());

    let response = structure(&config, &raw, &provider, &model);
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
