//! Prompt layers and the factory that builds them.
//!
//! The set of layer kinds is closed. Structured setters (`add_example`,
//! `add_entry`, `set_preferences`) only act on the kinds that carry the
//! matching [`Capability`]; on any other kind they are no-ops that report
//! `false`.

use promptforge_core::{ConfigurationError, PreferencesPatch, UserPreferences};
use serde::{Deserialize, Serialize};

/// Priority tiers. Higher values are composed first.
pub mod priority {
    pub const CRITICAL: i32 = 100;
    pub const HIGH: i32 = 75;
    pub const MEDIUM: i32 = 50;
    pub const LOW: i32 = 25;
}

/// Default cap on memory layer entries.
pub const DEFAULT_MAX_MEMORY_ENTRIES: usize = 20;

/// Unique identifier for a layer within one composer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerId(pub String);

impl LayerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

/// The registered layer types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    System,
    Task,
    Memory,
    Preferences,
    Context,
    Behavior,
}

impl LayerKind {
    pub const ALL: [LayerKind; 6] = [
        Self::System,
        Self::Task,
        Self::Memory,
        Self::Preferences,
        Self::Context,
        Self::Behavior,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Task => "task",
            Self::Memory => "memory",
            Self::Preferences => "preferences",
            Self::Context => "context",
            Self::Behavior => "behavior",
        }
    }

    /// The priority a layer of this kind gets when none is given.
    pub fn default_priority(self) -> i32 {
        match self {
            Self::System | Self::Behavior => priority::HIGH,
            Self::Task | Self::Memory | Self::Preferences => priority::MEDIUM,
            Self::Context => priority::LOW,
        }
    }
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for LayerKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == tag)
            .ok_or_else(|| ConfigurationError::UnknownLayerType(s.trim().to_string()))
    }
}

/// Structured operations some layer kinds support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// `set_preferences` — preferences layers.
    Preferences,
    /// `add_example` — task layers.
    Examples,
    /// `add_entry` — memory layers.
    Entries,
}

/// Kind-specific layer state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LayerBody {
    System {
        text: String,
    },
    Task {
        instruction: String,
        examples: Vec<String>,
    },
    Memory {
        entries: Vec<String>,
        max_entries: usize,
    },
    Preferences {
        preferences: UserPreferences,
        /// Free text appended after the rendered preferences.
        note: String,
    },
    Context {
        text: String,
    },
    Behavior {
        text: String,
    },
}

impl LayerBody {
    fn new(kind: LayerKind, content: String) -> Self {
        match kind {
            LayerKind::System => Self::System { text: content },
            LayerKind::Task => Self::Task {
                instruction: content,
                examples: Vec::new(),
            },
            LayerKind::Memory => Self::Memory {
                entries: if content.trim().is_empty() {
                    Vec::new()
                } else {
                    vec![content]
                },
                max_entries: DEFAULT_MAX_MEMORY_ENTRIES,
            },
            LayerKind::Preferences => Self::Preferences {
                preferences: UserPreferences::default(),
                note: content,
            },
            LayerKind::Context => Self::Context { text: content },
            LayerKind::Behavior => Self::Behavior { text: content },
        }
    }

    fn kind(&self) -> LayerKind {
        match self {
            Self::System { .. } => LayerKind::System,
            Self::Task { .. } => LayerKind::Task,
            Self::Memory { .. } => LayerKind::Memory,
            Self::Preferences { .. } => LayerKind::Preferences,
            Self::Context { .. } => LayerKind::Context,
            Self::Behavior { .. } => LayerKind::Behavior,
        }
    }
}

/// A named, prioritized, independently editable fragment of prompt text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    id: LayerId,
    priority: i32,
    enabled: bool,
    body: LayerBody,
}

impl Layer {
    /// Build a layer of `kind`. `priority` defaults to the kind's tier.
    pub fn new(
        id: impl Into<LayerId>,
        kind: LayerKind,
        content: impl Into<String>,
        priority: Option<i32>,
    ) -> Self {
        Self {
            id: id.into(),
            priority: priority.unwrap_or_else(|| kind.default_priority()),
            enabled: true,
            body: LayerBody::new(kind, content.into()),
        }
    }

    pub fn id(&self) -> &LayerId {
        &self.id
    }

    pub fn kind(&self) -> LayerKind {
        self.body.kind()
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn body(&self) -> &LayerBody {
        &self.body
    }

    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether this layer supports a structured operation.
    pub fn supports(&self, capability: Capability) -> bool {
        matches!(
            (&self.body, capability),
            (LayerBody::Preferences { .. }, Capability::Preferences)
                | (LayerBody::Task { .. }, Capability::Examples)
                | (LayerBody::Memory { .. }, Capability::Entries)
        )
    }

    /// The rendered text of this layer. Never fails; empty state renders
    /// as an empty string.
    pub fn content(&self) -> String {
        match &self.body {
            LayerBody::System { text }
            | LayerBody::Context { text }
            | LayerBody::Behavior { text } => text.clone(),
            LayerBody::Task {
                instruction,
                examples,
            } => render_task(instruction, examples),
            LayerBody::Memory { entries, .. } => {
                if entries.is_empty() {
                    String::new()
                } else {
                    let lines: Vec<String> = entries.iter().map(|e| format!("- {e}")).collect();
                    format!("Relevant context:\n{}", lines.join("\n"))
                }
            }
            LayerBody::Preferences { preferences, note } => {
                let rendered = preferences.render_instructions();
                [rendered.as_str(), note.trim()]
                    .into_iter()
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n\n")
            }
        }
    }

    /// Replace the free-text part of this layer.
    ///
    /// For a task layer this is the instruction, for a memory layer it
    /// replaces every entry, for a preferences layer it is the trailing note.
    pub fn set_content(&mut self, content: impl Into<String>) {
        let content = content.into();
        match &mut self.body {
            LayerBody::System { text }
            | LayerBody::Context { text }
            | LayerBody::Behavior { text } => *text = content,
            LayerBody::Task { instruction, .. } => *instruction = content,
            LayerBody::Memory { entries, .. } => {
                entries.clear();
                if !content.trim().is_empty() {
                    entries.push(content);
                }
            }
            LayerBody::Preferences { note, .. } => *note = content,
        }
    }

    /// Merge a preferences patch. Returns `false` on non-preferences layers.
    pub fn set_preferences(&mut self, patch: PreferencesPatch) -> bool {
        match &mut self.body {
            LayerBody::Preferences { preferences, .. } => {
                preferences.apply(patch);
                true
            }
            _ => false,
        }
    }

    /// Append an example. Returns `false` on non-task layers.
    pub fn add_example(&mut self, example: impl Into<String>) -> bool {
        match &mut self.body {
            LayerBody::Task { examples, .. } => {
                let example = example.into();
                if !example.trim().is_empty() {
                    examples.push(example);
                }
                true
            }
            _ => false,
        }
    }

    /// Append a memory entry, evicting the oldest past the cap.
    /// Returns `false` on non-memory layers.
    pub fn add_entry(&mut self, entry: impl Into<String>) -> bool {
        match &mut self.body {
            LayerBody::Memory {
                entries,
                max_entries,
            } => {
                let entry = entry.into();
                if !entry.trim().is_empty() {
                    entries.push(entry);
                }
                if entries.len() > *max_entries {
                    let overflow = entries.len() - *max_entries;
                    entries.drain(..overflow);
                }
                true
            }
            _ => false,
        }
    }

    /// Current preferences, for preferences layers.
    pub fn preferences(&self) -> Option<&UserPreferences> {
        match &self.body {
            LayerBody::Preferences { preferences, .. } => Some(preferences),
            _ => None,
        }
    }
}

fn render_task(instruction: &str, examples: &[String]) -> String {
    let instruction = instruction.trim();
    if examples.is_empty() {
        return instruction.to_string();
    }

    let listed: Vec<String> = examples
        .iter()
        .enumerate()
        .map(|(i, ex)| format!("{}. {}", i + 1, ex.trim()))
        .collect();
    let examples_block = format!("Examples:\n{}", listed.join("\n"));

    if instruction.is_empty() {
        examples_block
    } else {
        format!("{instruction}\n\n{examples_block}")
    }
}
