//! The submit pipeline.
//!
//! One call to [`Assistant::submit`]:
//!
//! 1. Resolve the session (creating one when none is given)
//! 2. Build the final prompt: composed layers + user prompt in layered
//!    mode, the user prompt alone in direct mode
//! 3. Send it to the provider exactly once
//! 4. Estimate usage and cost, then structure the reply; a provider error
//!    becomes an error-shaped response instead of a failure
//! 5. Record the iteration, update the usage ledger, publish events

use chrono::Utc;
use promptforge_composer::{Composer, LayerId, LayerKind};
use promptforge_config::AppConfig;
use promptforge_core::{
    CompositionMode, ConfigurationError, DomainEvent, EventBus, LayerChange, PreferencesPatch,
    Provider, Result,
};
use promptforge_response::{ResponseMeta, ResponseParser, StructuredResponse, TokenCounts};
use promptforge_session::{
    Direction, EditAction, EditTarget, Prompt, SessionId, SessionRepository, SessionTracker,
};
use promptforge_telemetry::{
    ModelRates, PricingTable, UsageLedger, UsageSnapshot, estimate_tokens,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::settings::SettingsManager;

/// Longest session name derived from a first prompt.
const SESSION_NAME_CHARS: usize = 48;

/// Joins the composed layers and the user prompt.
const PROMPT_SEPARATOR: &str = "\n\n";

/// The outcome of one submission.
#[derive(Debug, Clone)]
pub struct Submission {
    pub session_id: SessionId,
    pub index: usize,
    pub prompt_text: String,
    pub response: StructuredResponse,
}

/// Build the pricing table for a configuration: built-in tiers with the
/// configured overrides in front.
pub fn pricing_table(config: &AppConfig) -> PricingTable {
    let mut table = PricingTable::with_defaults();
    for rate in &config.pricing {
        table.set(
            &rate.provider,
            &rate.model_pattern,
            ModelRates::new(rate.input_per_1k, rate.output_per_1k),
        );
    }
    table
}

/// Orchestrates composition, the provider call, parsing, and history.
pub struct Assistant {
    provider: Arc<dyn Provider>,
    event_bus: Arc<EventBus>,
    settings: SettingsManager,
    composer: Composer,
    parser: ResponseParser,
    pricing: PricingTable,
    tracker: SessionTracker,
    ledger: UsageLedger,
    repository: Option<SessionRepository>,
    preferences_layer: Option<LayerId>,
}

impl Assistant {
    pub fn new(
        provider: Arc<dyn Provider>,
        settings: SettingsManager,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let mut assistant = Self {
            provider,
            event_bus,
            settings,
            composer: Composer::new(),
            parser: ResponseParser::new(),
            pricing: PricingTable::with_defaults(),
            tracker: SessionTracker::new(),
            ledger: UsageLedger::new(),
            repository: None,
            preferences_layer: None,
        };
        if !assistant.settings.settings().preferences.is_empty() {
            assistant.sync_preferences_layer();
        }
        assistant
    }

    /// Apply parser and pricing settings from a configuration.
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        self.parser = ResponseParser::new()
            .with_threshold(config.parser.code_signal_threshold)
            .with_keep_raw(config.parser.keep_raw);
        self.pricing = pricing_table(config);
        self
    }

    pub fn with_parser(mut self, parser: ResponseParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_pricing(mut self, pricing: PricingTable) -> Self {
        self.pricing = pricing;
        self
    }

    /// Persist sessions after every change.
    pub fn with_repository(mut self, repository: SessionRepository) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Start from previously saved sessions.
    pub fn with_tracker(mut self, tracker: SessionTracker) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn settings(&self) -> &SettingsManager {
        &self.settings
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    pub fn usage(&self) -> UsageSnapshot {
        self.ledger.snapshot()
    }

    pub fn set_mode(&mut self, mode: CompositionMode) -> bool {
        self.settings.set_mode(mode)
    }

    pub fn set_token_budget(&mut self, budget: Option<usize>) {
        self.settings.set_token_budget(budget);
    }

    // ── Layers ────────────────────────────────────────────────────────────

    pub fn create_layer(
        &mut self,
        kind: LayerKind,
        content: impl Into<String>,
        priority: Option<i32>,
    ) -> LayerId {
        let id = self.composer.create_layer(kind, content, priority);
        self.publish_layer_change(&id, LayerChange::Created);
        id
    }

    pub fn set_layer_content(&mut self, id: &LayerId, content: impl Into<String>) -> Result<()> {
        self.composer.set_content(id, content)?;
        self.publish_layer_change(id, LayerChange::Updated);
        Ok(())
    }

    pub fn set_layer_enabled(&mut self, id: &LayerId, enabled: bool) -> Result<()> {
        self.composer.set_enabled(id, enabled)?;
        self.publish_layer_change(id, LayerChange::Updated);
        Ok(())
    }

    pub fn remove_layer(&mut self, id: &LayerId) -> Result<()> {
        self.composer.remove_layer(id)?;
        if self.preferences_layer.as_ref() == Some(id) {
            self.preferences_layer = None;
        }
        self.publish_layer_change(id, LayerChange::Removed);
        Ok(())
    }

    pub fn clear_layers(&mut self) {
        self.composer.clear_layers();
        self.preferences_layer = None;
        self.event_bus.publish(DomainEvent::LayerChanged {
            layer_id: String::new(),
            change: LayerChange::Cleared,
            timestamp: Utc::now(),
        });
    }

    /// Update stored preferences and the preferences layer that renders them.
    pub fn update_preferences(&mut self, patch: PreferencesPatch) {
        self.settings.update_preferences(patch);
        self.sync_preferences_layer();
    }

    fn sync_preferences_layer(&mut self) {
        let preferences = self.settings.settings().preferences.clone();
        let existing = self
            .preferences_layer
            .clone()
            .filter(|id| self.composer.layer(id).is_some());
        let (id, change) = match existing {
            Some(id) => (id, LayerChange::Updated),
            None => {
                let id = self.composer.create_layer(LayerKind::Preferences, "", None);
                self.preferences_layer = Some(id.clone());
                (id, LayerChange::Created)
            }
        };

        // Replace rather than merge: the settings hold the full state.
        let patch = PreferencesPatch {
            preferred_languages: Some(preferences.preferred_languages),
            frameworks: Some(preferences.frameworks),
            coding_style: Some(preferences.coding_style.unwrap_or_default()),
            verbosity: preferences.verbosity,
            comment_style: Some(preferences.comment_style.unwrap_or_default()),
            include_tests: preferences.include_tests,
            custom_instructions: Some(preferences.custom_instructions.unwrap_or_default()),
        };
        if let Err(e) = self.composer.set_preferences(&id, patch) {
            warn!(layer_id = %id, error = %e, "Preferences layer vanished during sync");
            return;
        }
        self.publish_layer_change(&id, change);
    }

    fn publish_layer_change(&self, id: &LayerId, change: LayerChange) {
        self.event_bus.publish(DomainEvent::LayerChanged {
            layer_id: id.to_string(),
            change,
            timestamp: Utc::now(),
        });
    }

    // ── Sessions ──────────────────────────────────────────────────────────

    pub async fn create_session(&mut self, name: &str) -> Result<SessionId> {
        let id = self.tracker.create_session(name);
        let session = self.tracker.session(&id)?;
        self.event_bus.publish(DomainEvent::SessionCreated {
            session_id: id.to_string(),
            name: session.name().to_string(),
            timestamp: Utc::now(),
        });
        self.persist(&id).await?;
        Ok(id)
    }

    pub async fn delete_session(&mut self, id: &SessionId) -> Result<()> {
        self.tracker.delete_session(id)?;
        if let Some(repository) = &self.repository {
            repository.delete(id).await?;
        }
        self.event_bus.publish(DomainEvent::SessionDeleted {
            session_id: id.to_string(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Move through a session's history. Returns the new active index.
    pub async fn navigate(&mut self, id: &SessionId, direction: Direction) -> Result<Option<usize>> {
        let index = self.tracker.navigate_history(id, direction)?;
        if let Some(index) = index {
            self.event_bus.publish(DomainEvent::HistoryNavigated {
                session_id: id.to_string(),
                index,
                timestamp: Utc::now(),
            });
            self.persist(id).await?;
        }
        Ok(index)
    }

    // ── Submission ────────────────────────────────────────────────────────

    /// Build the text that will be sent for `user_prompt` in the current mode.
    pub fn build_prompt(&self, user_prompt: &str) -> Result<String> {
        let user_prompt = user_prompt.trim();
        if self.settings.mode() == CompositionMode::Direct {
            return Ok(user_prompt.to_string());
        }

        let composed = match self.settings.settings().token_budget {
            Some(budget) => {
                // The user prompt and its separator share the same budget
                let reserved = if user_prompt.is_empty() {
                    0
                } else {
                    estimate_tokens(user_prompt) + estimate_tokens(PROMPT_SEPARATOR)
                };
                self.composer
                    .compose_within_budget(None, budget.saturating_sub(reserved))?
            }
            None => self.composer.compose(),
        };
        self.event_bus.publish(DomainEvent::PromptComposed {
            layers: composed.layers.len(),
            token_estimate: composed.token_estimate,
            excluded: composed.metadata.excluded.len(),
            timestamp: Utc::now(),
        });

        Ok(match (composed.is_empty(), user_prompt.is_empty()) {
            (true, _) => user_prompt.to_string(),
            (false, true) => composed.text,
            (false, false) => format!("{}{PROMPT_SEPARATOR}{}", composed.text, user_prompt),
        })
    }

    /// Send a prompt and record the result as a new iteration.
    ///
    /// Only programmer errors (unknown session, empty prompt, storage
    /// failures) are returned as `Err`. A failed provider call is recorded as an
    /// error-shaped response.
    pub async fn submit(&mut self, session: Option<&SessionId>, prompt: Prompt) -> Result<Submission> {
        if let Some(id) = session {
            self.tracker.session(id)?;
        }
        let prompt_text = self.build_prompt(&prompt.text)?;
        if prompt_text.trim().is_empty() {
            return Err(ConfigurationError::EmptyPrompt.into());
        }
        let session_id = match session {
            Some(id) => id.clone(),
            None => self.create_session(&session_name(&prompt.text)).await?,
        };

        let provider_name = self.provider.name().to_string();

        info!(
            session_id = %session_id,
            provider = %provider_name,
            mode = %self.settings.mode(),
            follow_up = prompt.is_follow_up(),
            "Submitting prompt"
        );

        let started = Instant::now();
        let result = self.provider.send(&prompt_text).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let response = match result {
            Ok(completion) => {
                let model = completion
                    .model
                    .clone()
                    .unwrap_or_else(|| self.provider.model().to_string());
                let metadata = ResponseMeta::estimate(
                    &provider_name,
                    &model,
                    &prompt_text,
                    &completion.text,
                    completion.usage,
                    &self.pricing,
                )
                .with_duration(duration_ms);
                self.ledger.record(
                    &provider_name,
                    &model,
                    metadata.tokens.input,
                    metadata.tokens.output,
                    metadata.cost.total_cost,
                    true,
                );
                self.parser.parse(&completion.text, metadata)
            }
            Err(e) => {
                let model = self.provider.model().to_string();
                let input = estimate_tokens(&prompt_text);
                self.ledger.record(&provider_name, &model, input, 0, 0.0, false);
                let mut metadata =
                    ResponseMeta::new(&provider_name, &model).with_duration(duration_ms);
                metadata.tokens = TokenCounts::new(input, 0);
                self.parser.parse_error(&e.to_string(), None, metadata)
            }
        };

        self.event_bus.publish(DomainEvent::ResponseParsed {
            provider: response.metadata.provider.clone(),
            model: response.metadata.model.clone(),
            code_blocks: response.code_blocks.len(),
            is_error: response.is_error(),
            timestamp: Utc::now(),
        });

        let model = response.metadata.model.clone();
        let index = self.tracker.add_iteration(
            &session_id,
            prompt,
            response.clone(),
            &provider_name,
            &model,
        )?;
        self.event_bus.publish(DomainEvent::IterationAdded {
            session_id: session_id.to_string(),
            index,
            timestamp: Utc::now(),
        });
        self.persist(&session_id).await?;

        debug!(
            session_id = %session_id,
            index,
            code_blocks = response.code_blocks.len(),
            tokens = response.metadata.tokens.total,
            "Iteration recorded"
        );

        Ok(Submission {
            session_id,
            index,
            prompt_text,
            response,
        })
    }

    /// Ask for an edit of the session's active iteration.
    pub async fn follow_up(
        &mut self,
        session: &SessionId,
        text: &str,
        action: EditAction,
        target: EditTarget,
    ) -> Result<Submission> {
        let prompt = self
            .tracker
            .generate_follow_up_prompt(session, text, action, target)?;
        self.submit(Some(session), prompt).await
    }

    async fn persist(&self, id: &SessionId) -> Result<()> {
        let Some(repository) = &self.repository else {
            return Ok(());
        };
        repository.save(self.tracker.session(id)?).await?;
        Ok(())
    }
}

/// A session name from the first line of a prompt.
fn session_name(prompt: &str) -> String {
    let first_line = prompt.trim().lines().next().unwrap_or("");
    let mut name: String = first_line.chars().take(SESSION_NAME_CHARS).collect();
    if first_line.chars().count() > SESSION_NAME_CHARS {
        name.push('…');
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use async_trait::async_trait;
    use promptforge_core::{Completion, EventKind, ProviderError};
    use promptforge_store::InMemoryStore;
    use std::sync::Mutex;

    /// Replies with a fixed text and records every prompt it receives.
    struct MockProvider {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl MockProvider {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.into(),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn last_prompt(&self) -> String {
            self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Provider for MockProvider {
        fn name(&self) -> &str {
            "anthropic"
        }

        fn model(&self) -> &str {
            "claude-3-5-sonnet"
        }

        async fn send(&self, prompt: &str) -> std::result::Result<Completion, ProviderError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(Completion::text(self.reply.clone()))
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl Provider for FailingProvider {
        fn name(&self) -> &str {
            "openai"
        }

        fn model(&self) -> &str {
            "gpt-4o"
        }

        async fn send(&self, _prompt: &str) -> std::result::Result<Completion, ProviderError> {
            Err(ProviderError::RateLimited {
                retry_after_secs: 30,
            })
        }
    }

    fn assistant(provider: Arc<dyn Provider>) -> (Assistant, Arc<EventBus>) {
        let bus = Arc::new(EventBus::default());
        let settings = SettingsManager::new(
            Settings::from_config(&AppConfig::default()),
            bus.clone(),
        );
        (Assistant::new(provider, settings, bus.clone()), bus)
    }

    #[tokio::test]
    async fn layered_submit_prepends_layers() {
        let provider = MockProvider::new("Here:\n```rust\nfn main() {}\n```");
        let (mut assistant, _) = assistant(provider.clone());
        assistant.create_layer(LayerKind::System, "You are a Rust expert.", None);

        let submission = assistant
            .submit(None, Prompt::new("Write a main function."))
            .await
            .unwrap();

        assert_eq!(
            provider.last_prompt(),
            "You are a Rust expert.\n\nWrite a main function."
        );
        assert_eq!(submission.index, 0);
        assert_eq!(submission.response.code_blocks[0].language, "rust");
        let session = assistant.tracker().session(&submission.session_id).unwrap();
        assert_eq!(session.name(), "Write a main function.");
    }

    #[tokio::test]
    async fn direct_mode_sends_prompt_only() {
        let provider = MockProvider::new("ok");
        let (mut assistant, _) = assistant(provider.clone());
        assistant.create_layer(LayerKind::System, "ignored persona", None);
        assistant.set_mode(CompositionMode::Direct);

        assistant.submit(None, Prompt::new("  hello  ")).await.unwrap();
        assert_eq!(provider.last_prompt(), "hello");
    }

    #[tokio::test]
    async fn provider_error_becomes_response() {
        let (mut assistant, bus) = assistant(Arc::new(FailingProvider));
        let mut parsed = bus.subscribe_to(&[EventKind::ResponseParsed]);

        let submission = assistant.submit(None, Prompt::new("anything")).await.unwrap();
        assert!(submission.response.is_error());
        assert!(submission.response.explanation.starts_with("Error: Rate limited"));
        assert!(submission.response.code_blocks.is_empty());

        // The prompt was still sent, so its input side is counted
        assert_eq!(submission.response.metadata.tokens.input, estimate_tokens("anything"));
        let usage = assistant.usage();
        assert_eq!(usage.requests, 1);
        assert_eq!(usage.failed_requests, 1);
        assert_eq!(usage.input_tokens, estimate_tokens("anything") as u64);
        assert_eq!(usage.output_tokens, 0);

        match parsed.recv().await.unwrap().as_ref() {
            DomainEvent::ResponseParsed { is_error, .. } => assert!(*is_error),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn usage_is_estimated_and_recorded() {
        let provider = MockProvider::new(&"r".repeat(400));
        let (mut assistant, _) = assistant(provider);
        let submission = assistant
            .submit(None, Prompt::new("p".repeat(800)))
            .await
            .unwrap();

        let meta = &submission.response.metadata;
        assert_eq!(meta.tokens.input, 200);
        assert_eq!(meta.tokens.output, 100);
        assert!(meta.cost.total_cost > 0.0);
        assert_eq!(assistant.usage().input_tokens, 200);
    }

    #[tokio::test]
    async fn unknown_session_is_rejected_before_sending() {
        let provider = MockProvider::new("ok");
        let (mut assistant, _) = assistant(provider.clone());
        let err = assistant
            .submit(Some(&SessionId::from("ghost")), Prompt::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, promptforge_core::Error::NotFound(_)));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn blank_prompt_without_layers_is_rejected_before_sending() {
        let provider = MockProvider::new("ok");
        let (mut assistant, _) = assistant(provider.clone());

        let err = assistant.submit(None, Prompt::new("   ")).await.unwrap_err();
        assert!(matches!(
            err,
            promptforge_core::Error::Configuration(ConfigurationError::EmptyPrompt)
        ));
        assert_eq!(provider.calls(), 0);
        assert!(assistant.tracker().is_empty());
        assert_eq!(assistant.usage().requests, 0);

        let id = assistant.create_session("kept").await.unwrap();
        assert!(assistant.submit(Some(&id), Prompt::new("")).await.is_err());
        assert!(assistant.tracker().session(&id).unwrap().is_empty());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn blank_prompt_with_layers_sends_the_layers() {
        let provider = MockProvider::new("ok");
        let (mut assistant, _) = assistant(provider.clone());
        assistant.create_layer(LayerKind::Task, "Summarize the changelog.", None);

        assistant.submit(None, Prompt::new(" ")).await.unwrap();
        assert_eq!(provider.last_prompt(), "Summarize the changelog.");
    }

    #[tokio::test]
    async fn follow_up_embeds_previous_code() {
        let provider = MockProvider::new("```css\n.btn { color: red; }\n```");
        let (mut assistant, _) = assistant(provider.clone());
        assistant.set_mode(CompositionMode::Direct);
        let first = assistant.submit(None, Prompt::new("style a button")).await.unwrap();

        let second = assistant
            .follow_up(&first.session_id, "make it blue", EditAction::Fix, EditTarget::language("css"))
            .await
            .unwrap();

        assert_eq!(second.index, 1);
        let sent = provider.last_prompt();
        assert!(sent.starts_with(EditAction::Fix.instruction()));
        assert!(sent.contains(".btn { color: red; }"));
        let session = assistant.tracker().session(&first.session_id).unwrap();
        assert!(session.iterations()[1].prompt.is_follow_up());
    }

    #[tokio::test]
    async fn follow_up_on_empty_session_fails() {
        let (mut assistant, _) = assistant(MockProvider::new("ok"));
        let id = assistant.create_session("empty").await.unwrap();
        let err = assistant
            .follow_up(&id, "again", EditAction::Regenerate, EditTarget::All)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            promptforge_core::Error::NotFound(promptforge_core::NotFoundError::NoIterations(_))
        ));
    }

    #[tokio::test]
    async fn budget_drops_layers_from_prompt() {
        let provider = MockProvider::new("ok");
        let (mut assistant, _) = assistant(provider.clone());
        assistant.create_layer(LayerKind::System, "a".repeat(40), None);
        assistant.create_layer(LayerKind::Context, "b".repeat(400), None);
        assistant.set_token_budget(Some(20));

        assistant.submit(None, Prompt::new("go")).await.unwrap();
        let sent = provider.last_prompt();
        assert!(sent.starts_with(&"a".repeat(40)));
        assert!(!sent.contains('b'));
    }

    #[tokio::test]
    async fn budget_reserves_room_for_the_user_prompt() {
        let provider = MockProvider::new("ok");
        let (mut assistant, _) = assistant(provider.clone());
        assistant.create_layer(LayerKind::System, "a".repeat(40), None);
        assistant.create_layer(LayerKind::Context, "b".repeat(20), None);
        assistant.set_token_budget(Some(20));

        // Layers alone fit in 20 tokens, but not together with the prompt
        assistant.submit(None, Prompt::new("c".repeat(24))).await.unwrap();
        let sent = provider.last_prompt();
        assert!(!sent.contains('b'));
        assert!(sent.ends_with(&"c".repeat(24)));
        assert!(estimate_tokens(&sent) <= 20);
    }

    #[tokio::test]
    async fn preferences_feed_the_preferences_layer() {
        let provider = MockProvider::new("ok");
        let (mut assistant, _) = assistant(provider.clone());
        assistant.update_preferences(PreferencesPatch {
            include_tests: Some(true),
            ..Default::default()
        });
        assistant.update_preferences(PreferencesPatch {
            coding_style: Some("functional".into()),
            ..Default::default()
        });
        assert_eq!(assistant.composer().len(), 1);

        assistant.submit(None, Prompt::new("sort a list")).await.unwrap();
        let sent = provider.last_prompt();
        assert!(sent.starts_with("User preferences:"));
        assert!(sent.contains("unit tests"));
        assert!(sent.contains("functional"));
        assert!(sent.ends_with("sort a list"));
    }

    #[tokio::test]
    async fn sessions_are_persisted_and_deleted() {
        let store = Arc::new(InMemoryStore::new());
        let repository = SessionRepository::new(store.clone());
        let (assistant, _) = assistant(MockProvider::new("ok"));
        let mut assistant = assistant.with_repository(repository.clone());

        let submission = assistant.submit(None, Prompt::new("persist me")).await.unwrap();
        let saved = repository.load(&submission.session_id).await.unwrap().unwrap();
        assert_eq!(saved.len(), 1);

        assistant.delete_session(&submission.session_id).await.unwrap();
        assert!(repository.load(&submission.session_id).await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn navigation_publishes_events() {
        let (mut assistant, bus) = assistant(MockProvider::new("ok"));
        let first = assistant.submit(None, Prompt::new("one")).await.unwrap();
        assistant.submit(Some(&first.session_id), Prompt::new("two")).await.unwrap();

        let mut nav = bus.subscribe_to(&[EventKind::HistoryNavigated]);
        let index = assistant
            .navigate(&first.session_id, Direction::Previous)
            .await
            .unwrap();
        assert_eq!(index, Some(0));
        assert!(nav.try_recv().is_some());
    }

    #[test]
    fn long_prompts_make_short_session_names() {
        let name = session_name(&"x".repeat(100));
        assert_eq!(name.chars().count(), SESSION_NAME_CHARS + 1);
        assert_eq!(session_name("first\nsecond"), "first");
    }

    #[test]
    fn pricing_overrides_apply() {
        let mut config = AppConfig::default();
        config.pricing.push(promptforge_config::PricingOverride {
            provider: "acme".into(),
            model_pattern: "rocket".into(),
            input_per_1k: 1.0,
            output_per_1k: 1.0,
        });
        let table = pricing_table(&config);
        assert!(table.rates_for("acme", "rocket-1").is_some());
    }
}
