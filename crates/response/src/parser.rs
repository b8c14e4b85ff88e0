//! Raw reply → [`StructuredResponse`].
//!
//! # Algorithm
//!
//! 1. Find every fenced region: three backticks, an optional info string
//!    up to the first newline, the body, and a closing fence
//! 2. Normalize the language tag and pull a filename from the info string
//!    or from a `file:` comment on the first body line
//! 3. Discard blocks whose trimmed body is empty
//! 4. Everything outside the fences becomes the explanation, with runs of
//!    blank lines collapsed to one
//! 5. With no fences at all, fall back to the code heuristic

use regex_lite::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::heuristic::{CODE_SIGNAL_THRESHOLD, code_signals, infer_language};
use crate::language::normalize_language;
use crate::model::{CodeBlock, ResponseMeta, StructuredResponse};

static RE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```([^\n`]*)\n(.*?)```").unwrap());

static RE_FILE_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?://|#|--|/\*|<!--)\s*(?:file(?:name)?|path)\s*:\s*(\S+?)\s*(?:\*/|-->)?\s*$")
        .unwrap()
});

const INFO_FILENAME_KEYS: &[&str] = &["filename", "file", "title", "path"];

/// Stateless reply parser. Construct once and reuse.
#[derive(Debug, Clone)]
pub struct ResponseParser {
    threshold: usize,
    keep_raw: bool,
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self {
            threshold: CODE_SIGNAL_THRESHOLD,
            keep_raw: true,
        }
    }
}

impl ResponseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of code signals needed before unfenced text is treated as code.
    /// Values below 1 are raised to 1.
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold.max(1);
        self
    }

    /// Whether the original text is kept on the response.
    pub fn with_keep_raw(mut self, keep_raw: bool) -> Self {
        self.keep_raw = keep_raw;
        self
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Structure a successful reply. Never fails.
    pub fn parse(&self, raw: &str, metadata: ResponseMeta) -> StructuredResponse {
        let mut code_blocks = Vec::new();
        let mut prose: Vec<&str> = Vec::new();
        let mut fences = 0usize;
        let mut cursor = 0usize;

        for caps in RE_FENCE.captures_iter(raw) {
            let (Some(whole), Some(info), Some(body)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            fences += 1;

            let before = &raw[cursor..whole.start()];
            prose.push(before);
            cursor = whole.end();

            let (tag, info_filename) = parse_info(info.as_str());
            let (comment_filename, code) = split_file_comment(body.as_str());
            let code = code.trim();
            if code.is_empty() {
                debug!(language = tag, "Discarding empty code block");
                continue;
            }

            code_blocks.push(CodeBlock {
                language: normalize_language(tag),
                code: code.to_string(),
                filename: info_filename.or(comment_filename),
                explanation: lead_in(before),
            });
        }
        prose.push(&raw[cursor..]);

        let mut explanation = collapse_blank_lines(&prose.join("\n\n"));

        if fences == 0 {
            let trimmed = raw.trim();
            let signals = code_signals(trimmed);
            if signals.len() >= self.threshold {
                let language = infer_language(trimmed);
                debug!(
                    signals = signals.len(),
                    language = %language,
                    "Treating unfenced reply as code"
                );
                code_blocks.push(CodeBlock::new(&language, trimmed));
                explanation.clear();
            }
        }

        debug!(
            code_blocks = code_blocks.len(),
            explanation_chars = explanation.len(),
            "Response parsed"
        );

        StructuredResponse {
            explanation,
            code_blocks,
            metadata,
            raw: self.keep_raw.then(|| raw.to_string()),
            error: None,
        }
    }

    /// Build the degraded response for a failed provider call.
    ///
    /// `raw` is whatever partial text the provider returned, if any.
    pub fn parse_error(
        &self,
        message: &str,
        raw: Option<&str>,
        metadata: ResponseMeta,
    ) -> StructuredResponse {
        warn!(
            provider = %metadata.provider,
            model = %metadata.model,
            error = message,
            "Upstream error converted to response"
        );
        StructuredResponse {
            explanation: format!("Error: {message}"),
            code_blocks: Vec::new(),
            metadata,
            raw: raw.filter(|_| self.keep_raw).map(str::to_string),
            error: Some(message.to_string()),
        }
    }
}

/// Split a fence info string into the language tag and an optional filename.
///
/// Accepted forms: `rust`, `rust src/main.rs`, `rust:src/main.rs`,
/// `rust filename=src/main.rs`, `rust title="main.rs"`.
fn parse_info(info: &str) -> (&str, Option<String>) {
    let mut language = "";
    let mut filename = None;

    for (i, token) in info.split_whitespace().enumerate() {
        if let Some((key, value)) = token.split_once('=') {
            let value = value.trim_matches(|c| c == '"' || c == '\'');
            if filename.is_none()
                && INFO_FILENAME_KEYS.contains(&key.to_lowercase().as_str())
                && !value.is_empty()
            {
                filename = Some(value.to_string());
            }
        } else if i == 0 {
            match token.split_once(':') {
                Some((lang, path)) if !path.is_empty() => {
                    language = lang;
                    filename = Some(path.to_string());
                }
                _ => language = token,
            }
        } else if filename.is_none() && (token.contains('.') || token.contains('/')) {
            filename = Some(token.to_string());
        }
    }

    (language, filename)
}

/// Strip a leading `// file: path` style comment from a block body.
fn split_file_comment(body: &str) -> (Option<String>, &str) {
    let (first, rest) = body.split_once('\n').unwrap_or((body, ""));
    match RE_FILE_COMMENT.captures(first).and_then(|c| c.get(1)) {
        Some(path) => (Some(path.as_str().to_string()), rest),
        None => (None, body),
    }
}

/// The paragraph right before a block, if it introduces it with a colon.
fn lead_in(before: &str) -> Option<String> {
    let paragraph = before.trim_end().rsplit("\n\n").next()?.trim();
    paragraph
        .ends_with(':')
        .then(|| paragraph.to_string())
}

fn collapse_blank_lines(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut previous_blank = false;
    for line in text.trim().lines() {
        let blank = line.trim().is_empty();
        if blank && previous_blank {
            continue;
        }
        lines.push(if blank { "" } else { line.trim_end() });
        previous_blank = blank;
    }
    lines.join("\n")
}
