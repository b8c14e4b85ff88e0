//! Canonical language keys for fence tags.
//!
//! Every code block is stored under its canonical key so that diff and
//! merge lookups treat `javascript` and `js` as the same language.

/// Alias → canonical key. Tags not listed are lowercased and kept.
const ALIASES: &[(&str, &str)] = &[
    ("javascript", "js"),
    ("node", "js"),
    ("typescript", "ts"),
    ("py", "python"),
    ("python3", "python"),
    ("shell", "bash"),
    ("sh", "bash"),
    ("zsh", "bash"),
    ("console", "bash"),
    ("md", "markdown"),
    ("rs", "rust"),
    ("yml", "yaml"),
    ("c++", "cpp"),
    ("cxx", "cpp"),
    ("golang", "go"),
    ("htm", "html"),
    ("rb", "ruby"),
    ("cs", "csharp"),
    ("c#", "csharp"),
    ("kt", "kotlin"),
    ("txt", "text"),
    ("plaintext", "text"),
    ("plain", "text"),
];

/// Normalize a fence language tag. Empty tags become `"text"`.
///
/// Idempotent: normalizing a canonical key returns it unchanged.
pub fn normalize_language(tag: &str) -> String {
    let tag = tag.trim().to_lowercase();
    if tag.is_empty() {
        return "text".into();
    }
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == tag)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or(tag)
}
