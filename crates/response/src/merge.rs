//! Combining several structured responses into one.

use promptforge_telemetry::CostEstimate;

use crate::model::{CodeBlock, ResponseMeta, StructuredResponse, TokenCounts};

/// Merge responses from a multi-step generation.
///
/// - explanations are joined with a blank line
/// - code blocks are keyed by language: a later block replaces an earlier
///   one in place, so languages keep the order they were first seen in
/// - token counts, cost and duration are summed; provider, model and
///   timestamp come from the last response
///
/// An empty input yields an empty response.
pub fn merge_responses(responses: &[StructuredResponse]) -> StructuredResponse {
    let mut explanations = Vec::new();
    let mut code_blocks: Vec<CodeBlock> = Vec::new();
    let mut errors = Vec::new();
    let mut tokens = TokenCounts::default();
    let mut cost = CostEstimate::zero();
    let mut duration_ms = 0u64;

    for response in responses {
        if !response.explanation.trim().is_empty() {
            explanations.push(response.explanation.trim());
        }

        for block in &response.code_blocks {
            match code_blocks.iter_mut().find(|b| b.language == block.language) {
                Some(existing) => *existing = block.clone(),
                None => code_blocks.push(block.clone()),
            }
        }

        if let Some(error) = &response.error {
            errors.push(error.as_str());
        }

        let meta = &response.metadata;
        tokens = TokenCounts::new(
            tokens.input + meta.tokens.input,
            tokens.output + meta.tokens.output,
        );
        cost.input_cost += meta.cost.input_cost;
        cost.output_cost += meta.cost.output_cost;
        cost.total_cost += meta.cost.total_cost;
        duration_ms += meta.duration_ms;
    }

    let metadata = match responses.last() {
        Some(last) => ResponseMeta {
            tokens,
            cost,
            duration_ms,
            ..last.metadata.clone()
        },
        None => ResponseMeta::new("", ""),
    };

    StructuredResponse {
        explanation: explanations.join("\n\n"),
        code_blocks,
        metadata,
        raw: None,
        error: (!errors.is_empty()).then(|| errors.join("; ")),
    }
}
