//! Session domain types.

use chrono::{DateTime, Utc};
use promptforge_response::{CodeBlock, StructuredResponse, normalize_language};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of follow-up edit actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditAction {
    Regenerate,
    Refactor,
    Extend,
    Fix,
    Explain,
}

impl EditAction {
    pub const ALL: [EditAction; 5] = [
        Self::Regenerate,
        Self::Refactor,
        Self::Extend,
        Self::Fix,
        Self::Explain,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Regenerate => "regenerate",
            Self::Refactor => "refactor",
            Self::Extend => "extend",
            Self::Fix => "fix",
            Self::Explain => "explain",
        }
    }

    /// The instruction that opens a follow-up prompt.
    pub fn instruction(self) -> &'static str {
        match self {
            Self::Regenerate => {
                "Regenerate the code below from scratch while keeping the same requirements."
            }
            Self::Refactor => {
                "Refactor the code below to improve its structure and readability without changing its behavior."
            }
            Self::Extend => "Extend the code below with the requested functionality.",
            Self::Fix => "Find and fix the bugs in the code below.",
            Self::Explain => "Explain step by step how the code below works.",
        }
    }
}

impl std::fmt::Display for EditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == tag)
            .ok_or_else(|| format!("unknown edit action '{}'", s.trim()))
    }
}

/// Which code a follow-up is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditTarget {
    All,
    /// Canonical language key.
    Language(String),
}

impl EditTarget {
    pub fn language(tag: &str) -> Self {
        Self::Language(normalize_language(tag))
    }

    pub fn matches(&self, block: &CodeBlock) -> bool {
        match self {
            Self::All => true,
            Self::Language(language) => block.language == *language,
        }
    }
}

impl std::fmt::Display for EditTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Language(language) => f.write_str(language),
        }
    }
}

impl std::str::FromStr for EditTarget {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        if tag.is_empty() || tag.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            Ok(Self::language(tag))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditRequest {
    pub action: EditAction,
    pub target: EditTarget,
}

/// The prompt that produced an iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub text: String,
    /// Present when the prompt is a follow-up edit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit: Option<EditRequest>,
}

impl Prompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            edit: None,
        }
    }

    pub fn follow_up(text: impl Into<String>, action: EditAction, target: EditTarget) -> Self {
        Self {
            text: text.into(),
            edit: Some(EditRequest { action, target }),
        }
    }

    pub fn is_follow_up(&self) -> bool {
        self.edit.is_some()
    }
}

/// One prompt/response pair in a session's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Iteration {
    pub index: usize,
    pub prompt: Prompt,
    pub response: StructuredResponse,
    pub provider: String,
    pub model: String,
    pub timestamp: DateTime<Utc>,
}

/// History navigation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Previous,
    Next,
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "prev" | "previous" | "back" => Ok(Self::Previous),
            "next" | "forward" => Ok(Self::Next),
            other => Err(format!("unknown direction '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Empty,
    Active,
}

/// An ordered history of iterations.
///
/// Once the session has iterations, `active_index` always points at one
/// of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    active_index: Option<usize>,
    iterations: Vec<Iteration>,
}

impl Session {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            name: name.into(),
            created_at: now,
            updated_at: now,
            active_index: None,
            iterations: Vec::new(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active_index
    }

    pub fn iterations(&self) -> &[Iteration] {
        &self.iterations
    }

    pub fn iteration(&self, index: usize) -> Option<&Iteration> {
        self.iterations.get(index)
    }

    pub fn active_iteration(&self) -> Option<&Iteration> {
        self.active_index.and_then(|i| self.iterations.get(i))
    }

    pub fn len(&self) -> usize {
        self.iterations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.iterations.is_empty()
    }

    pub fn state(&self) -> SessionState {
        if self.iterations.is_empty() {
            SessionState::Empty
        } else {
            SessionState::Active
        }
    }

    pub(crate) fn rename(&mut self, name: String) {
        self.name = name;
        self.updated_at = Utc::now();
    }

    pub(crate) fn push(
        &mut self,
        prompt: Prompt,
        response: StructuredResponse,
        provider: String,
        model: String,
    ) -> usize {
        let index = self.iterations.len();
        let now = Utc::now();
        self.iterations.push(Iteration {
            index,
            prompt,
            response,
            provider,
            model,
            timestamp: now,
        });
        self.active_index = Some(index);
        self.updated_at = now;
        index
    }

    /// Move the active pointer one step, clamped to the history bounds.
    pub(crate) fn step(&mut self, direction: Direction) -> Option<usize> {
        let last = self.iterations.len().checked_sub(1)?;
        let current = self.active_index.unwrap_or(last).min(last);
        let next = match direction {
            Direction::Previous => current.saturating_sub(1),
            Direction::Next => (current + 1).min(last),
        };
        self.active_index = Some(next);
        Some(next)
    }

    /// Re-establish invariants on a session loaded from storage.
    pub(crate) fn repair(&mut self) {
        for (i, iteration) in self.iterations.iter_mut().enumerate() {
            iteration.index = i;
        }
        self.active_index = match self.iterations.len().checked_sub(1) {
            None => None,
            Some(last) => Some(self.active_index.unwrap_or(last).min(last)),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptforge_response::ResponseMeta;

    fn response(text: &str) -> StructuredResponse {
        promptforge_response::ResponseParser::new().parse(text, ResponseMeta::new("p", "m"))
    }

    #[test]
    fn session_ids_convert_from_str() {
        let id: SessionId = "abc-123".into();
        assert_eq!(id, SessionId::from("abc-123"));
        assert_eq!(id.to_string(), "abc-123");
    }

    #[test]
    fn new_session_is_empty() {
        let session = Session::new("demo");
        assert_eq!(session.state(), SessionState::Empty);
        assert!(session.active_iteration().is_none());
    }

    #[test]
    fn push_advances_pointer() {
        let mut session = Session::new("demo");
        session.push(Prompt::new("a"), response("one"), "p".into(), "m".into());
        let index = session.push(Prompt::new("b"), response("two"), "p".into(), "m".into());
        assert_eq!(index, 1);
        assert_eq!(session.active_index(), Some(1));
        assert_eq!(session.state(), SessionState::Active);
    }

    #[test]
    fn step_on_empty_session_is_noop() {
        let mut session = Session::new("demo");
        assert_eq!(session.step(Direction::Previous), None);
        assert_eq!(session.active_index(), None);
    }

    #[test]
    fn repair_clamps_pointer() {
        let mut session = Session::new("demo");
        session.push(Prompt::new("a"), response("one"), "p".into(), "m".into());
        session.active_index = Some(9);
        session.repair();
        assert_eq!(session.active_index(), Some(0));
    }

    #[test]
    fn edit_vocabulary_parses() {
        assert_eq!("Refactor".parse::<EditAction>(), Ok(EditAction::Refactor));
        assert!("rewrite".parse::<EditAction>().is_err());
        assert_eq!("javascript".parse::<EditTarget>(), Ok(EditTarget::Language("js".into())));
        assert_eq!("ALL".parse::<EditTarget>(), Ok(EditTarget::All));
        assert_eq!("prev".parse::<Direction>(), Ok(Direction::Previous));
    }

    #[test]
    fn every_action_has_an_instruction() {
        for action in EditAction::ALL {
            assert!(action.instruction().ends_with('.'));
        }
    }
}
