//! Per-language code diffs between two iterations.

use serde::{Deserialize, Serialize};
use similar::TextDiff;

use crate::model::Iteration;

/// The code for one language in two iterations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffPair {
    pub language: String,
    /// Code from the older iteration.
    pub original: String,
    /// Code from the newer iteration.
    pub updated: String,
    pub from_index: usize,
    pub to_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl DiffPair {
    pub fn is_unchanged(&self) -> bool {
        self.original == self.updated
    }

    /// Render as a unified diff. Empty when the code is unchanged.
    pub fn unified(&self) -> String {
        let label = self
            .filename
            .clone()
            .unwrap_or_else(|| format!("code.{}", self.language));
        TextDiff::from_lines(&self.original, &self.updated)
            .unified_diff()
            .header(
                &format!("a/{label} (iteration {})", self.from_index),
                &format!("b/{label} (iteration {})", self.to_index),
            )
            .missing_newline_hint(false)
            .to_string()
    }
}

/// Pairs for every language present in both iterations, in the newer
/// iteration's block order. `older` and `newer` are chosen by index.
pub(crate) fn common_pairs(a: &Iteration, b: &Iteration) -> Vec<DiffPair> {
    let (older, newer) = if a.index <= b.index { (a, b) } else { (b, a) };

    let mut pairs: Vec<DiffPair> = Vec::new();
    for block in &newer.response.code_blocks {
        if pairs.iter().any(|p| p.language == block.language) {
            continue;
        }
        let Some(previous) = older.response.block(&block.language) else {
            continue;
        };
        pairs.push(DiffPair {
            language: block.language.clone(),
            original: previous.code.clone(),
            updated: block.code.clone(),
            from_index: older.index,
            to_index: newer.index,
            filename: block.filename.clone().or_else(|| previous.filename.clone()),
        });
    }
    pairs
}
