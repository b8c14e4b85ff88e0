//! "Looks like code" heuristic for unfenced replies.
//!
//! Models sometimes answer with bare code and no fences. When a reply has
//! no fenced block at all, it is tested against a fixed set of structural
//! signals; at [`CODE_SIGNAL_THRESHOLD`] or more distinct matches the whole
//! reply is treated as one code block. This is a best-effort guess, not a
//! parser: prose that quotes enough syntax will be misread as code.

use regex_lite::Regex;
use std::sync::LazyLock;

/// Minimum number of distinct signals for text to count as code.
pub const CODE_SIGNAL_THRESHOLD: usize = 3;

/// One structural hint that text is source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeSignal {
    BraceBlock,
    FunctionDecl,
    ClassDecl,
    Import,
    HtmlTag,
    Decorator,
    Include,
    StatementSemicolon,
    LineComment,
    JsonPair,
}

impl CodeSignal {
    pub const ALL: [CodeSignal; 10] = [
        Self::BraceBlock,
        Self::FunctionDecl,
        Self::ClassDecl,
        Self::Import,
        Self::HtmlTag,
        Self::Decorator,
        Self::Include,
        Self::StatementSemicolon,
        Self::LineComment,
        Self::JsonPair,
    ];

    fn pattern(self) -> &'static str {
        match self {
            Self::BraceBlock => r"(?s)\{.*\}",
            Self::FunctionDecl => {
                r"\b(function|def|fn|func)\s+\w+\s*\(|\w+\s*=\s*(async\s*)?\([^)]*\)\s*=>"
            }
            Self::ClassDecl => r"\b(class|struct|interface|impl|trait)\s+\w+",
            Self::Import => {
                r#"(?m)^\s*(import\s+[\w{*]|from\s+[\w.]+\s+import\s|use\s+\w+(::\w+)*|package\s+\w+)|require\(['"]"#
            }
            Self::HtmlTag => r"</?[a-zA-Z][a-zA-Z0-9-]*(\s[^<>]*)?>",
            Self::Decorator => r"(?m)^\s*@\w+",
            Self::Include => r#"(?m)^\s*#include\s*[<"]"#,
            Self::StatementSemicolon => r"(?m);\s*$",
            Self::LineComment => r"(?m)^\s*//",
            Self::JsonPair => r#""[^"\n]+"\s*:\s*("|-?\d|\[|\{|true|false|null)"#,
        }
    }
}

static SIGNALS: LazyLock<Vec<(CodeSignal, Regex)>> = LazyLock::new(|| {
    CodeSignal::ALL
        .into_iter()
        .map(|signal| (signal, Regex::new(signal.pattern()).unwrap()))
        .collect()
});

/// The distinct signals present in `text`.
pub fn code_signals(text: &str) -> Vec<CodeSignal> {
    SIGNALS
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(signal, _)| *signal)
        .collect()
}

/// Whether `text` shows at least `threshold` distinct code signals.
pub fn looks_like_code(text: &str, threshold: usize) -> bool {
    code_signals(text).len() >= threshold
}

static LANGUAGE_HINTS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("cpp", r#"(?m)^\s*#include\s*[<"]|std::"#),
        ("html", r"(?i)<!doctype html|<html[\s>]|<(div|body|head|span|p)[\s>]"),
        ("rust", r"\bfn\s+\w+\s*[(<]|\blet\s+mut\s|\bimpl\b|(?m)^\s*use\s+\w+::"),
        ("go", r"(?m)^\s*package\s+\w+|\bfunc\s+(\([^)]*\)\s*)?\w+\s*\("),
        ("python", r"(?m)^\s*def\s+\w+\s*\(.*\)\s*(->\s*[\w\[\], ]+)?:|^\s*from\s+[\w.]+\s+import\s|^\s*import\s+\w+\s*$"),
        ("java", r"\bpublic\s+(static\s+)?(class|void|final)\b|System\.out\.print"),
        ("ts", r"\binterface\s+\w+\s*\{|:\s*(string|number|boolean)\b"),
        ("js", r"\bfunction\s+\w*\s*\(|\b(const|let|var)\s+\w+\s*=|=>|console\.log"),
        ("css", r"(?m)^\s*[.#]?[\w-]+(\s*[,>+~]?\s*[.#]?[\w-]+)*\s*\{[^}]*:[^}]*;"),
    ]
    .into_iter()
    .map(|(language, pattern)| (language, Regex::new(pattern).unwrap()))
    .collect()
});

/// Guess the language of unfenced code. Falls back to `"text"`.
pub fn infer_language(code: &str) -> String {
    let trimmed = code.trim();
    if (trimmed.starts_with('{') || trimmed.starts_with('['))
        && serde_json::from_str::<serde_json::Value>(trimmed).is_ok()
    {
        return "json".into();
    }

    LANGUAGE_HINTS
        .iter()
        .find(|(_, re)| re.is_match(trimmed))
        .map(|(language, _)| (*language).to_string())
        .unwrap_or_else(|| "text".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn javascript_function_has_three_signals() {
        let text = "function add(a, b) {\n  return a + b;\n}";
        let signals = code_signals(text);
        assert!(signals.contains(&CodeSignal::FunctionDecl));
        assert!(signals.contains(&CodeSignal::BraceBlock));
        assert!(signals.contains(&CodeSignal::StatementSemicolon));
        assert!(looks_like_code(text, CODE_SIGNAL_THRESHOLD));
    }

    #[test]
    fn prose_with_two_signals_is_not_code() {
        let text = "Remember to end each statement with a semicolon;\nand wrap blocks in {braces}.";
        assert_eq!(code_signals(text).len(), 2);
        assert!(!looks_like_code(text, CODE_SIGNAL_THRESHOLD));
    }

    #[test]
    fn plain_prose_has_no_signals() {
        assert!(code_signals("Rust is a systems programming language.").is_empty());
    }

    #[test]
    fn threshold_is_tunable() {
        let text = "Remember to end each statement with a semicolon;\nand wrap blocks in {braces}.";
        assert!(looks_like_code(text, 2));
    }

    #[test]
    fn c_include_is_detected() {
        let text = "#include <stdio.h>\n\nint main(void) {\n  printf(\"hi\");\n  return 0;\n}";
        assert!(code_signals(text).contains(&CodeSignal::Include));
        assert_eq!(infer_language(text), "cpp");
    }

    #[test]
    fn infers_common_languages() {
        assert_eq!(infer_language("{\"a\": 1, \"b\": [true]}"), "json");
        assert_eq!(infer_language("fn main() {\n    let mut x = 1;\n}"), "rust");
        assert_eq!(infer_language("def greet(name):\n    return name"), "python");
        assert_eq!(infer_language("package main\n\nfunc main() {}"), "go");
        assert_eq!(infer_language("const x = 1;\nconsole.log(x);"), "js");
        assert_eq!(infer_language("interface User {\n  name: string;\n}"), "ts");
        assert_eq!(infer_language(".btn {\n  color: red;\n}"), "css");
        assert_eq!(infer_language("<div class=\"x\">hi</div>"), "html");
        assert_eq!(infer_language("just words"), "text");
    }
}
