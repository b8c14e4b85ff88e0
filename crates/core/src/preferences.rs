//! Structured user preferences and their prose rendering.
//!
//! Preferences are stored as fields and rendered into instructions only when
//! a prompt is composed, so editing a single field never requires rewriting
//! free text.

use serde::{Deserialize, Serialize};

/// How much prose the user wants around generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Concise,
    Balanced,
    Detailed,
}

impl Verbosity {
    fn instruction(self) -> &'static str {
        match self {
            Self::Concise => "Keep explanations brief and focus on the code.",
            Self::Balanced => "Give a short explanation alongside the code.",
            Self::Detailed => "Explain the code thoroughly, including design decisions.",
        }
    }
}

/// The user's standing preferences for generated code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferred_languages: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frameworks: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coding_style: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<Verbosity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_style: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_tests: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_instructions: Option<String>,
}

/// A partial update to [`UserPreferences`]. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencesPatch {
    #[serde(default)]
    pub preferred_languages: Option<Vec<String>>,
    #[serde(default)]
    pub frameworks: Option<Vec<String>>,
    #[serde(default)]
    pub coding_style: Option<String>,
    #[serde(default)]
    pub verbosity: Option<Verbosity>,
    #[serde(default)]
    pub comment_style: Option<String>,
    #[serde(default)]
    pub include_tests: Option<bool>,
    #[serde(default)]
    pub custom_instructions: Option<String>,
}

impl UserPreferences {
    /// Merge a partial update into these preferences.
    pub fn apply(&mut self, patch: PreferencesPatch) {
        if let Some(languages) = patch.preferred_languages {
            self.preferred_languages = languages;
        }
        if let Some(frameworks) = patch.frameworks {
            self.frameworks = frameworks;
        }
        if let Some(style) = patch.coding_style {
            self.coding_style = non_blank(style);
        }
        if let Some(verbosity) = patch.verbosity {
            self.verbosity = Some(verbosity);
        }
        if let Some(comments) = patch.comment_style {
            self.comment_style = non_blank(comments);
        }
        if let Some(tests) = patch.include_tests {
            self.include_tests = Some(tests);
        }
        if let Some(custom) = patch.custom_instructions {
            self.custom_instructions = non_blank(custom);
        }
    }

    /// Whether no preference has been set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Render the preferences as prompt instructions.
    ///
    /// Returns an empty string when nothing is set.
    pub fn render_instructions(&self) -> String {
        let mut lines = Vec::new();

        if !self.preferred_languages.is_empty() {
            lines.push(format!(
                "- Prefer these languages: {}.",
                self.preferred_languages.join(", ")
            ));
        }
        if !self.frameworks.is_empty() {
            lines.push(format!(
                "- Use these frameworks where appropriate: {}.",
                self.frameworks.join(", ")
            ));
        }
        if let Some(style) = &self.coding_style {
            lines.push(format!("- Follow this coding style: {style}."));
        }
        if let Some(verbosity) = self.verbosity {
            lines.push(format!("- {}", verbosity.instruction()));
        }
        if let Some(comments) = &self.comment_style {
            lines.push(format!("- Comment style: {comments}."));
        }
        match self.include_tests {
            Some(true) => lines.push("- Include unit tests for new code.".to_string()),
            Some(false) => lines.push("- Do not include tests.".to_string()),
            None => {}
        }
        if let Some(custom) = &self.custom_instructions {
            lines.push(format!("- {custom}"));
        }

        if lines.is_empty() {
            return String::new();
        }
        format!("User preferences:\n{}", lines.join("\n"))
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_preferences_render_nothing() {
        let prefs = UserPreferences::default();
        assert!(prefs.is_empty());
        assert_eq!(prefs.render_instructions(), "");
    }

    #[test]
    fn patch_merges_only_given_fields() {
        let mut prefs = UserPreferences {
            coding_style: Some("functional".into()),
            ..Default::default()
        };
        prefs.apply(PreferencesPatch {
            preferred_languages: Some(vec!["rust".into(), "ts".into()]),
            include_tests: Some(true),
            ..Default::default()
        });

        assert_eq!(prefs.coding_style.as_deref(), Some("functional"));
        assert_eq!(prefs.preferred_languages, vec!["rust", "ts"]);
        assert_eq!(prefs.include_tests, Some(true));
    }

    #[test]
    fn blank_text_clears_field() {
        let mut prefs = UserPreferences {
            comment_style: Some("doc comments".into()),
            ..Default::default()
        };
        prefs.apply(PreferencesPatch {
            comment_style: Some("   ".into()),
            ..Default::default()
        });
        assert!(prefs.comment_style.is_none());
    }

    #[test]
    fn render_lists_each_preference() {
        let prefs = UserPreferences {
            preferred_languages: vec!["python".into()],
            verbosity: Some(Verbosity::Concise),
            include_tests: Some(false),
            ..Default::default()
        };
        let text = prefs.render_instructions();
        assert!(text.starts_with("User preferences:"));
        assert!(text.contains("python"));
        assert!(text.contains("brief"));
        assert!(text.contains("Do not include tests"));
    }
}
