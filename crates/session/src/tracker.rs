//! The session tracker.
//!
//! Owns every session exclusively. Persistence is external: callers hand
//! sessions to a [`SessionRepository`](crate::SessionRepository) after
//! mutating them and rebuild the tracker with [`SessionTracker::restore`].

use promptforge_core::NotFoundError;
use promptforge_response::StructuredResponse;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::diff::{DiffPair, common_pairs};
use crate::model::{Direction, EditAction, EditTarget, Iteration, Prompt, Session, SessionId};

const DEFAULT_SESSION_NAME: &str = "Untitled session";

#[derive(Debug, Default)]
pub struct SessionTracker {
    sessions: HashMap<SessionId, Session>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a tracker from persisted sessions.
    pub fn restore(sessions: impl IntoIterator<Item = Session>) -> Self {
        let sessions: HashMap<SessionId, Session> = sessions
            .into_iter()
            .map(|mut session| {
                session.repair();
                (session.id().clone(), session)
            })
            .collect();
        debug!(count = sessions.len(), "Sessions restored");
        Self { sessions }
    }

    pub fn create_session(&mut self, name: &str) -> SessionId {
        let name = match name.trim() {
            "" => DEFAULT_SESSION_NAME,
            trimmed => trimmed,
        };
        let session = Session::new(name);
        let id = session.id().clone();
        info!(session_id = %id, name, "Session created");
        self.sessions.insert(id.clone(), session);
        id
    }

    pub fn session(&self, id: &SessionId) -> Result<&Session, NotFoundError> {
        self.sessions
            .get(id)
            .ok_or_else(|| NotFoundError::Session(id.to_string()))
    }

    /// All sessions, most recently updated first.
    pub fn sessions(&self) -> Vec<&Session> {
        let mut sessions: Vec<&Session> = self.sessions.values().collect();
        sessions.sort_by(|a, b| {
            b.updated_at()
                .cmp(&a.updated_at())
                .then_with(|| a.id().as_str().cmp(b.id().as_str()))
        });
        sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn rename_session(&mut self, id: &SessionId, name: &str) -> Result<(), NotFoundError> {
        let name = match name.trim() {
            "" => DEFAULT_SESSION_NAME,
            trimmed => trimmed,
        };
        self.session_mut(id)?.rename(name.to_string());
        Ok(())
    }

    pub fn delete_session(&mut self, id: &SessionId) -> Result<Session, NotFoundError> {
        let session = self
            .sessions
            .remove(id)
            .ok_or_else(|| NotFoundError::Session(id.to_string()))?;
        info!(session_id = %id, iterations = session.len(), "Session deleted");
        Ok(session)
    }

    /// Append an iteration and make it the active one. Returns its index.
    pub fn add_iteration(
        &mut self,
        id: &SessionId,
        prompt: Prompt,
        response: StructuredResponse,
        provider: &str,
        model: &str,
    ) -> Result<usize, NotFoundError> {
        let session = self.session_mut(id)?;
        let index = session.push(prompt, response, provider.to_string(), model.to_string());
        debug!(session_id = %id, index, provider, model, "Iteration added");
        Ok(index)
    }

    pub fn active_iteration(&self, id: &SessionId) -> Result<Option<&Iteration>, NotFoundError> {
        Ok(self.session(id)?.active_iteration())
    }

    /// Move the active pointer. At either end of the history this is a
    /// no-op. Returns the new active index, `None` for an empty session.
    pub fn navigate_history(
        &mut self,
        id: &SessionId,
        direction: Direction,
    ) -> Result<Option<usize>, NotFoundError> {
        let index = self.session_mut(id)?.step(direction);
        debug!(session_id = %id, ?direction, ?index, "History navigated");
        Ok(index)
    }

    /// Build a prompt that carries the active iteration's code into an
    /// edit request.
    ///
    /// Blocks matching `target` are embedded as fenced code. When none
    /// match, the previous explanation is embedded instead.
    pub fn generate_follow_up_prompt(
        &self,
        id: &SessionId,
        text: &str,
        action: EditAction,
        target: EditTarget,
    ) -> Result<Prompt, NotFoundError> {
        let session = self.session(id)?;
        let previous = session
            .active_iteration()
            .ok_or_else(|| NotFoundError::NoIterations(id.to_string()))?;

        let mut sections = vec![action.instruction().to_string()];
        if let EditTarget::Language(language) = &target {
            sections.push(format!("Focus on the {language} code."));
        }

        let fenced: Vec<String> = previous
            .response
            .code_blocks
            .iter()
            .filter(|block| target.matches(block))
            .map(|block| match &block.filename {
                Some(filename) => format!("```{} {}\n{}\n```", block.language, filename, block.code),
                None => format!("```{}\n{}\n```", block.language, block.code),
            })
            .collect();

        if !fenced.is_empty() {
            sections.push(format!("Previous code:\n\n{}", fenced.join("\n\n")));
        } else if !previous.response.explanation.trim().is_empty() {
            sections.push(format!(
                "Previous answer:\n\n{}",
                previous.response.explanation.trim()
            ));
        }

        if !text.trim().is_empty() {
            sections.push(format!("Request: {}", text.trim()));
        }

        debug!(
            session_id = %id,
            action = %action,
            target = %target,
            blocks = fenced.len(),
            "Follow-up prompt generated"
        );
        Ok(Prompt::follow_up(sections.join("\n\n"), action, target))
    }

    /// The first language present in both iterations, scanning the newer
    /// iteration's blocks in order. `Ok(None)` when they share no language.
    pub fn show_diff(
        &self,
        id: &SessionId,
        index_a: usize,
        index_b: usize,
    ) -> Result<Option<DiffPair>, NotFoundError> {
        Ok(self.show_all_diffs(id, index_a, index_b)?.into_iter().next())
    }

    /// Every language present in both iterations.
    pub fn show_all_diffs(
        &self,
        id: &SessionId,
        index_a: usize,
        index_b: usize,
    ) -> Result<Vec<DiffPair>, NotFoundError> {
        let session = self.session(id)?;
        let lookup = |index: usize| {
            session
                .iteration(index)
                .ok_or_else(|| NotFoundError::Iteration {
                    session_id: id.to_string(),
                    index,
                })
        };
        let a = lookup(index_a)?;
        let b = lookup(index_b)?;
        Ok(common_pairs(a, b))
    }

    fn session_mut(&mut self, id: &SessionId) -> Result<&mut Session, NotFoundError> {
        self.sessions
            .get_mut(id)
            .ok_or_else(|| NotFoundError::Session(id.to_string()))
    }
}
