//! The chat engine.
//!
//! A turn runs as one synchronous pass: load the character, gather lore
//! candidates, assemble the system prompt, inject triggered lore, trim
//! history, route to a provider, and persist the exchange when a session
//! is attached.

use std::sync::Arc;

use chat_core::{
    fingerprint, ChatMessage, ChatProvider, ChatRequest, ChatRole, ChatStream, StreamEvent,
    TokenUsage, Transcript,
};
use database::{character, lorebook as lorebook_store, session, Character, Database};
use persona::{
    build_system_prompt, AttributeState, CharacterCard, PromptOptions, DEFAULT_ROLEPLAY_RULES,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::context::LoreContext;
use crate::error::EngineError;
use crate::retry::{with_retry, RetryPolicy};
use crate::router::ProviderRouter;

/// Default number of recent messages scanned for lore triggers.
pub const LORE_SCAN_MESSAGES: usize = 4;

/// Engine-wide settings applied to every turn.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Name substituted for `{{user}}` in card text.
    pub user_name: String,
    /// Instructions applied to every character.
    pub global_instructions: Option<String>,
    /// Core roleplay rules; empty disables the section.
    pub roleplay_rules: String,
    /// Output formatting rules.
    pub formatting_rules: Option<String>,
    /// Maximum user/assistant turns sent to the provider.
    pub max_history_turns: usize,
    /// Recent messages scanned for lore triggers.
    pub lore_scan_messages: usize,
    /// Backoff policy for rate-limited providers.
    pub retry: RetryPolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            user_name: "User".to_string(),
            global_instructions: None,
            roleplay_rules: DEFAULT_ROLEPLAY_RULES.to_string(),
            formatting_rules: None,
            max_history_turns: 20,
            lore_scan_messages: LORE_SCAN_MESSAGES,
            retry: RetryPolicy::default(),
        }
    }
}

impl EngineSettings {
    /// Load settings from environment variables.
    ///
    /// Optional variables: `REVERIE_USER_NAME`,
    /// `REVERIE_GLOBAL_INSTRUCTIONS`, `REVERIE_ROLEPLAY_RULES`,
    /// `REVERIE_FORMATTING_RULES`, `REVERIE_MAX_HISTORY_TURNS`,
    /// `REVERIE_LORE_SCAN_MESSAGES`, `REVERIE_MAX_RETRIES`.
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Ok(name) = std::env::var("REVERIE_USER_NAME") {
            settings.user_name = name;
        }
        if let Ok(global) = std::env::var("REVERIE_GLOBAL_INSTRUCTIONS") {
            settings.global_instructions = Some(global);
        }
        if let Ok(rules) = std::env::var("REVERIE_ROLEPLAY_RULES") {
            settings.roleplay_rules = rules;
        }
        if let Ok(formatting) = std::env::var("REVERIE_FORMATTING_RULES") {
            settings.formatting_rules = Some(formatting);
        }
        if let Some(turns) = env_parse("REVERIE_MAX_HISTORY_TURNS") {
            settings.max_history_turns = turns;
        }
        if let Some(scan) = env_parse("REVERIE_LORE_SCAN_MESSAGES") {
            settings.lore_scan_messages = scan;
        }
        if let Some(retries) = env_parse("REVERIE_MAX_RETRIES") {
            settings.retry.max_retries = retries;
        }

        settings
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.parse().ok()
}

/// A single-character chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRequest {
    /// Character to speak as.
    pub character_id: String,
    /// Session to load history from and persist the exchange to.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Inline conversation history; takes precedence over stored history.
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    /// The new user message.
    pub user_message: String,
    /// Provider override ("openrouter", "xai", "groq", "gemini").
    #[serde(default)]
    pub provider: Option<String>,
    /// Model override.
    #[serde(default)]
    pub model: Option<String>,
    /// Extra lorebooks to draw candidates from.
    #[serde(default)]
    pub lorebook_ids: Vec<String>,
    /// Current attribute state for the prompt's state section.
    #[serde(default)]
    pub attribute_state: Option<AttributeState>,
    /// Max tokens override.
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Temperature override.
    #[serde(default)]
    pub temperature: Option<f32>,
}

/// Result of a completed (non-streaming) turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    /// The character's reply.
    pub reply: String,
    /// Provider that produced the reply.
    pub provider: String,
    /// Model used.
    pub model: String,
    /// Finish reason, if reported.
    pub finish_reason: Option<String>,
    /// Token usage, if reported.
    pub usage: Option<TokenUsage>,
    /// Names of the lore entries injected into the prompt.
    pub triggered_lore: Vec<String>,
    /// Session the exchange was persisted to, if any.
    pub session_id: Option<String>,
}

/// A streamed turn: metadata plus the live delta stream.
///
/// The caller accumulates deltas and records the exchange itself (via
/// [`ChatEngine::record_exchange`]) once the stream completes, so a
/// dropped stream persists nothing.
pub struct StreamTurn {
    /// Provider producing the reply.
    pub provider: String,
    /// Model used.
    pub model: String,
    /// Names of the lore entries injected into the prompt.
    pub triggered_lore: Vec<String>,
    /// Session to persist to once the stream completes, if any.
    pub session_id: Option<String>,
    /// The user message that opened the turn.
    pub user_message: String,
    /// The delta stream.
    pub stream: ChatStream,
}

/// A multi-character turn over a shared conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupTurnRequest {
    /// Characters that respond, in order.
    pub character_ids: Vec<String>,
    /// The new user message.
    pub user_message: String,
    /// Shared conversation history.
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    /// Provider override.
    #[serde(default)]
    pub provider: Option<String>,
    /// Model override.
    #[serde(default)]
    pub model: Option<String>,
    /// Extra lorebooks to draw candidates from.
    #[serde(default)]
    pub lorebook_ids: Vec<String>,
    /// Max tokens override.
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Temperature override.
    #[serde(default)]
    pub temperature: Option<f32>,
}

/// One character's contribution to a group turn.
#[derive(Debug, Clone, Serialize)]
pub struct GroupReply {
    /// Character ID.
    pub character_id: String,
    /// Character name, when the character was found.
    pub character_name: Option<String>,
    /// The reply, on success.
    pub reply: Option<String>,
    /// The failure, on error. A failed character never fails the turn.
    pub error: Option<String>,
    /// Names of the lore entries injected for this character.
    pub triggered_lore: Vec<String>,
}

struct PreparedTurn {
    provider: Arc<dyn ChatProvider>,
    provider_name: String,
    model: String,
    chat_request: ChatRequest,
    triggered_lore: Vec<String>,
    character_name: String,
}

/// The chat engine tying characters, lore, and providers together.
pub struct ChatEngine {
    db: Database,
    router: ProviderRouter,
    settings: EngineSettings,
}

impl ChatEngine {
    /// Create an engine over the given database and router.
    pub fn new(db: Database, router: ProviderRouter, settings: EngineSettings) -> Self {
        Self {
            db,
            router,
            settings,
        }
    }

    /// Get the engine settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Get the provider router.
    pub fn router(&self) -> &ProviderRouter {
        &self.router
    }

    /// Get the database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Run a single-character turn to completion.
    pub async fn run_turn(&self, request: TurnRequest) -> Result<TurnOutcome, EngineError> {
        validate_user_message(&request.user_message)?;

        if let Some(session_id) = request.session_id.as_deref() {
            session::get_session(self.db.pool(), session_id).await?;
        }

        let prepared = self
            .prepare(
                &request.character_id,
                &request.history,
                request.session_id.as_deref(),
                &request.user_message,
                &request.lorebook_ids,
                request.attribute_state.clone(),
                request.provider.as_deref(),
                request.model.as_deref(),
                request.max_tokens,
                request.temperature,
            )
            .await?;

        info!(
            character = %prepared.character_name,
            provider = %prepared.provider_name,
            model = %prepared.model,
            "Running chat turn"
        );

        let provider = Arc::clone(&prepared.provider);
        let chat_request = prepared.chat_request.clone();
        let response = with_retry(&self.settings.retry, &prepared.provider_name, move || {
            let provider = Arc::clone(&provider);
            let chat_request = chat_request.clone();
            async move { provider.complete(chat_request).await }
        })
        .await?;

        if let Some(session_id) = request.session_id.as_deref() {
            self.record_exchange(session_id, &request.user_message, &response.content)
                .await?;
        }

        Ok(TurnOutcome {
            reply: response.content,
            provider: prepared.provider_name,
            model: prepared.model,
            finish_reason: response.finish_reason,
            usage: response.usage,
            triggered_lore: prepared.triggered_lore,
            session_id: request.session_id,
        })
    }

    /// Open a streamed single-character turn.
    pub async fn run_turn_stream(&self, request: TurnRequest) -> Result<StreamTurn, EngineError> {
        validate_user_message(&request.user_message)?;

        if let Some(session_id) = request.session_id.as_deref() {
            session::get_session(self.db.pool(), session_id).await?;
        }

        let prepared = self
            .prepare(
                &request.character_id,
                &request.history,
                request.session_id.as_deref(),
                &request.user_message,
                &request.lorebook_ids,
                request.attribute_state.clone(),
                request.provider.as_deref(),
                request.model.as_deref(),
                request.max_tokens,
                request.temperature,
            )
            .await?;

        info!(
            character = %prepared.character_name,
            provider = %prepared.provider_name,
            model = %prepared.model,
            "Opening streamed chat turn"
        );

        let stream = prepared.provider.stream(prepared.chat_request).await?;

        Ok(StreamTurn {
            provider: prepared.provider_name,
            model: prepared.model,
            triggered_lore: prepared.triggered_lore,
            session_id: request.session_id,
            user_message: request.user_message,
            stream,
        })
    }

    /// Run a multi-character turn.
    ///
    /// Characters respond in request order; each sees the replies of the
    /// characters before it. A failed character yields an error entry in
    /// its reply slot and never fails the turn.
    pub async fn run_group_turn(
        &self,
        request: GroupTurnRequest,
    ) -> Result<Vec<GroupReply>, EngineError> {
        validate_user_message(&request.user_message)?;
        if request.character_ids.is_empty() {
            return Err(EngineError::InvalidRequest(
                "character_ids cannot be empty".to_string(),
            ));
        }

        let mut history = request.history.clone();
        let mut replies = Vec::with_capacity(request.character_ids.len());

        for character_id in &request.character_ids {
            let outcome = self
                .group_member_turn(character_id, &history, &request)
                .await;

            match outcome {
                Ok((name, reply, triggered)) => {
                    // Later characters see this reply as part of the scene.
                    history.push(ChatMessage::assistant(format!("{}: {}", name, reply)));
                    replies.push(GroupReply {
                        character_id: character_id.clone(),
                        character_name: Some(name),
                        reply: Some(reply),
                        error: None,
                        triggered_lore: triggered,
                    });
                }
                Err(err) => {
                    warn!(character = %character_id, error = %err, "Group member failed");
                    replies.push(GroupReply {
                        character_id: character_id.clone(),
                        character_name: None,
                        reply: None,
                        error: Some(err.to_string()),
                        triggered_lore: Vec::new(),
                    });
                }
            }
        }

        Ok(replies)
    }

    /// Persist a completed exchange to a session.
    pub async fn record_exchange(
        &self,
        session_id: &str,
        user_message: &str,
        reply: &str,
    ) -> Result<(), EngineError> {
        session::append_message(self.db.pool(), session_id, "user", user_message).await?;
        session::append_message(self.db.pool(), session_id, "assistant", reply).await?;
        Ok(())
    }

    async fn group_member_turn(
        &self,
        character_id: &str,
        history: &[ChatMessage],
        request: &GroupTurnRequest,
    ) -> Result<(String, String, Vec<String>), EngineError> {
        let prepared = self
            .prepare(
                character_id,
                history,
                None,
                &request.user_message,
                &request.lorebook_ids,
                None,
                request.provider.as_deref(),
                request.model.as_deref(),
                request.max_tokens,
                request.temperature,
            )
            .await?;

        let provider = Arc::clone(&prepared.provider);
        let chat_request = prepared.chat_request.clone();
        let response = with_retry(&self.settings.retry, &prepared.provider_name, move || {
            let provider = Arc::clone(&provider);
            let chat_request = chat_request.clone();
            async move { provider.complete(chat_request).await }
        })
        .await?;

        Ok((
            prepared.character_name,
            response.content,
            prepared.triggered_lore,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    async fn prepare(
        &self,
        character_id: &str,
        history: &[ChatMessage],
        session_id: Option<&str>,
        user_message: &str,
        lorebook_ids: &[String],
        attribute_state: Option<AttributeState>,
        provider: Option<&str>,
        model: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<PreparedTurn, EngineError> {
        let pool = self.db.pool();

        let character = character::get_character(pool, character_id).await?;
        let card = card_from_character(&character);

        let lore = self.gather_lore(&character, lorebook_ids).await?;

        let mut transcript = if !history.is_empty() {
            Transcript::from_messages(history.to_vec())
        } else if let Some(session_id) = session_id {
            let stored =
                session::recent_messages(pool, session_id, self.settings.max_history_turns * 2)
                    .await?;
            Transcript::from_messages(messages_from_rows(stored))
        } else {
            Transcript::new()
        };

        transcript.push(ChatMessage::user(user_message));
        transcript.trim_to_turns(self.settings.max_history_turns);

        let options = PromptOptions {
            global_instructions: self.settings.global_instructions.clone(),
            roleplay_rules: Some(self.settings.roleplay_rules.clone())
                .filter(|rules| !rules.trim().is_empty()),
            formatting_rules: self.settings.formatting_rules.clone(),
            attribute_state,
        };

        let base_prompt = build_system_prompt(&card, &options, &self.settings.user_name);
        let scan_text = transcript.scan_text(self.settings.lore_scan_messages);
        let (system_prompt, triggered_lore) = lore.augment_prompt(&base_prompt, &scan_text);

        debug!(
            character = %card.name,
            prompt_fingerprint = %fingerprint(&system_prompt),
            lore_candidates = lore.candidate_count(),
            lore_triggered = triggered_lore.len(),
            "Assembled system prompt"
        );

        if !system_prompt.is_empty() {
            transcript.set_system(system_prompt);
        }

        let (provider, model) = self.router.resolve(provider, model)?;
        let provider_name = provider.name().to_string();

        let chat_request = ChatRequest {
            model: model.clone(),
            messages: transcript.into_messages(),
            max_tokens,
            temperature,
        };

        Ok(PreparedTurn {
            provider,
            provider_name,
            model,
            chat_request,
            triggered_lore,
            character_name: card.name,
        })
    }

    async fn gather_lore(
        &self,
        character: &Character,
        extra_lorebook_ids: &[String],
    ) -> Result<LoreContext, EngineError> {
        let pool = self.db.pool();
        let mut book_ids: Vec<&str> = Vec::new();

        if let Some(id) = character.lorebook_id.as_deref() {
            book_ids.push(id);
        }
        for id in extra_lorebook_ids {
            if !book_ids.contains(&id.as_str()) {
                // Explicitly requested books must exist.
                lorebook_store::get_lorebook(pool, id).await?;
                book_ids.push(id);
            }
        }

        let mut lore = LoreContext::new();
        for id in book_ids {
            lore.add_rows(lorebook_store::list_entries(pool, id).await?);
        }

        Ok(lore)
    }
}

fn validate_user_message(user_message: &str) -> Result<(), EngineError> {
    if user_message.trim().is_empty() {
        return Err(EngineError::InvalidRequest(
            "user_message cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn card_from_character(character: &Character) -> CharacterCard {
    CharacterCard {
        name: character.name.clone(),
        description: character.description.clone(),
        personality: character.personality.clone(),
        scenario: character.scenario.clone(),
        first_message: character.first_message.clone(),
        message_example: character.message_example.clone(),
        creator_notes: character.creator_notes.clone(),
        system_prompt: character.system_prompt.clone(),
        post_history_instructions: character.post_history_instructions.clone(),
        tags: character.tags.0.clone(),
        creator: None,
        character_version: None,
    }
}

fn messages_from_rows(rows: Vec<database::ChatMessageRow>) -> Vec<ChatMessage> {
    rows.into_iter()
        .filter_map(|row| {
            let role = match row.role.as_str() {
                "system" => ChatRole::System,
                "user" => ChatRole::User,
                "assistant" => ChatRole::Assistant,
                other => {
                    warn!(role = %other, "Skipping stored message with unknown role");
                    return None;
                }
            };
            Some(ChatMessage {
                role,
                content: row.content,
            })
        })
        .collect()
}

/// Drain a turn stream into the full reply text.
///
/// A convenience for callers that open a stream but want the assembled
/// text (tests, and the gateway's post-stream persistence).
pub async fn collect_stream(stream: &mut ChatStream) -> Result<String, EngineError> {
    use futures::StreamExt;

    let mut reply = String::new();
    while let Some(event) = stream.next().await {
        match event? {
            StreamEvent::Delta(text) => reply.push_str(&text),
            StreamEvent::Done { .. } => break,
        }
    }
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::ProviderKind;
    use async_trait::async_trait;
    use chat_core::{ChatResponse, ProviderError};
    use database::models::{CharacterData, LoreEntryData, LorebookData, SessionData};
    use std::sync::Mutex;

    /// Records the last request it served; replies with a fixed string.
    struct CaptureProvider {
        reply: String,
        last_request: Mutex<Option<ChatRequest>>,
    }

    impl CaptureProvider {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                last_request: Mutex::new(None),
            })
        }

        fn last(&self) -> ChatRequest {
            self.last_request.lock().unwrap().clone().unwrap()
        }
    }

    #[async_trait]
    impl ChatProvider for CaptureProvider {
        async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
            *self.last_request.lock().unwrap() = Some(request.clone());
            Ok(ChatResponse::text(request.model, self.reply.clone()))
        }

        fn name(&self) -> &str {
            "Capture"
        }
    }

    async fn seeded_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();

        lorebook_store::create_lorebook(
            db.pool(),
            "book-1",
            &LorebookData {
                name: "Northern Reaches".to_string(),
                description: String::new(),
            },
        )
        .await
        .unwrap();

        lorebook_store::create_entry(
            db.pool(),
            "book-1",
            "entry-1",
            &LoreEntryData {
                name: "Ironhold".to_string(),
                category: Some("location".to_string()),
                keywords: vec!["ironhold".to_string()],
                content: "A dwarven fortress.".to_string(),
                importance: "high".to_string(),
                enabled: true,
            },
        )
        .await
        .unwrap();

        character::create_character(
            db.pool(),
            "char-1",
            &CharacterData {
                name: "Mara".to_string(),
                description: "{{char}} is a wry ranger guiding {{user}}.".to_string(),
                lorebook_id: Some("book-1".to_string()),
                ..CharacterData::default()
            },
        )
        .await
        .unwrap();

        db
    }

    async fn engine_with(provider: Arc<dyn ChatProvider>) -> ChatEngine {
        let db = seeded_db().await;
        let mut router = ProviderRouter::new(ProviderKind::Xai);
        router.register(ProviderKind::Xai, provider, "grok-4-1-fast");

        let settings = EngineSettings {
            retry: RetryPolicy::none(),
            ..EngineSettings::default()
        };

        ChatEngine::new(db, router, settings)
    }

    fn turn(user_message: &str) -> TurnRequest {
        TurnRequest {
            character_id: "char-1".to_string(),
            session_id: None,
            history: Vec::new(),
            user_message: user_message.to_string(),
            provider: None,
            model: None,
            lorebook_ids: Vec::new(),
            attribute_state: None,
            max_tokens: None,
            temperature: None,
        }
    }

    #[tokio::test]
    async fn test_turn_assembles_prompt_with_lore() {
        let capture = CaptureProvider::new("\"Stay close,\" she says.");
        let engine = engine_with(capture.clone()).await;

        let outcome = engine
            .run_turn(turn("Take me to Ironhold."))
            .await
            .unwrap();

        assert_eq!(outcome.reply, "\"Stay close,\" she says.");
        assert_eq!(outcome.provider, "Capture");
        assert_eq!(outcome.model, "grok-4-1-fast");
        assert_eq!(outcome.triggered_lore, vec!["Ironhold".to_string()]);

        let request = capture.last();
        let system = &request.messages[0];
        assert_eq!(system.role, ChatRole::System);
        assert!(system.content.contains("Mara is a wry ranger guiding User."));
        assert!(system.content.contains("Stay in character"));
        assert!(system.content.contains("[WORLD INFO]"));
        assert!(system.content.contains("Ironhold (location): A dwarven fortress."));

        let last = request.messages.last().unwrap();
        assert_eq!(last.role, ChatRole::User);
        assert_eq!(last.content, "Take me to Ironhold.");
    }

    #[tokio::test]
    async fn test_lore_not_injected_without_trigger() {
        let capture = CaptureProvider::new("reply");
        let engine = engine_with(capture.clone()).await;

        let outcome = engine.run_turn(turn("Good morning.")).await.unwrap();

        assert!(outcome.triggered_lore.is_empty());
        assert!(!capture.last().messages[0].content.contains("[WORLD INFO]"));
    }

    #[tokio::test]
    async fn test_lore_triggered_by_recent_history() {
        let capture = CaptureProvider::new("reply");
        let engine = engine_with(capture.clone()).await;

        let mut request = turn("What do you think?");
        request.history = vec![
            ChatMessage::user("Tell me about Ironhold."),
            ChatMessage::assistant("It lies beyond the pass."),
        ];

        let outcome = engine.run_turn(request).await.unwrap();
        assert_eq!(outcome.triggered_lore, vec!["Ironhold".to_string()]);
    }

    #[tokio::test]
    async fn test_session_history_is_loaded_and_exchange_persisted() {
        let capture = CaptureProvider::new("I remember.");
        let engine = engine_with(capture.clone()).await;
        let pool = engine.database().pool();

        session::create_session(
            pool,
            "sess-1",
            &SessionData {
                character_id: "char-1".to_string(),
                title: String::new(),
            },
        )
        .await
        .unwrap();
        session::append_message(pool, "sess-1", "user", "We met at Ironhold.")
            .await
            .unwrap();
        session::append_message(pool, "sess-1", "assistant", "Aye, in the rain.")
            .await
            .unwrap();

        let mut request = turn("Do you remember?");
        request.session_id = Some("sess-1".to_string());

        let outcome = engine.run_turn(request).await.unwrap();
        assert_eq!(outcome.session_id.as_deref(), Some("sess-1"));
        // Stored history reached the provider and the lore scan.
        assert_eq!(outcome.triggered_lore, vec!["Ironhold".to_string()]);
        let roles: Vec<ChatRole> = capture.last().messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                ChatRole::System,
                ChatRole::User,
                ChatRole::Assistant,
                ChatRole::User
            ]
        );

        // The new exchange was appended.
        let stored = session::list_messages(pool, "sess-1").await.unwrap();
        assert_eq!(stored.len(), 4);
        assert_eq!(stored[2].content, "Do you remember?");
        assert_eq!(stored[3].content, "I remember.");
    }

    #[tokio::test]
    async fn test_missing_session_errors() {
        let engine = engine_with(CaptureProvider::new("x")).await;

        let mut request = turn("hello");
        request.session_id = Some("ghost".to_string());

        let result = engine.run_turn(request).await;
        assert!(matches!(result, Err(EngineError::Database(_))));
    }

    #[tokio::test]
    async fn test_empty_user_message_rejected() {
        let engine = engine_with(CaptureProvider::new("x")).await;

        let result = engine.run_turn(turn("   ")).await;
        assert!(matches!(result, Err(EngineError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_unknown_provider_rejected() {
        let engine = engine_with(CaptureProvider::new("x")).await;

        let mut request = turn("hello");
        request.provider = Some("gemini".to_string());

        let result = engine.run_turn(request).await;
        assert!(matches!(result, Err(EngineError::UnknownProvider(_))));
    }

    #[tokio::test]
    async fn test_requested_lorebook_must_exist() {
        let engine = engine_with(CaptureProvider::new("x")).await;

        let mut request = turn("hello");
        request.lorebook_ids = vec!["missing-book".to_string()];

        let result = engine.run_turn(request).await;
        assert!(matches!(result, Err(EngineError::Database(_))));
    }

    #[tokio::test]
    async fn test_stream_turn_and_post_stream_persistence() {
        let engine = engine_with(CaptureProvider::new("streamed reply")).await;
        let pool = engine.database().pool();

        session::create_session(
            pool,
            "sess-1",
            &SessionData {
                character_id: "char-1".to_string(),
                title: String::new(),
            },
        )
        .await
        .unwrap();

        let mut request = turn("Speak.");
        request.session_id = Some("sess-1".to_string());

        let mut stream_turn = engine.run_turn_stream(request).await.unwrap();
        let reply = collect_stream(&mut stream_turn.stream).await.unwrap();
        assert_eq!(reply, "streamed reply");

        // Nothing persisted until the caller records the exchange.
        assert_eq!(session::count_messages(pool, "sess-1").await.unwrap(), 0);

        engine
            .record_exchange("sess-1", &stream_turn.user_message, &reply)
            .await
            .unwrap();
        assert_eq!(session::count_messages(pool, "sess-1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_group_turn_members_see_earlier_replies() {
        let capture = CaptureProvider::new("A reply.");
        let engine = engine_with(capture.clone()).await;

        character::create_character(
            engine.database().pool(),
            "char-2",
            &CharacterData {
                name: "Toren".to_string(),
                description: "A blacksmith.".to_string(),
                ..CharacterData::default()
            },
        )
        .await
        .unwrap();

        let request = GroupTurnRequest {
            character_ids: vec!["char-1".to_string(), "char-2".to_string()],
            user_message: "Hello, both of you.".to_string(),
            history: Vec::new(),
            provider: None,
            model: None,
            lorebook_ids: Vec::new(),
            max_tokens: None,
            temperature: None,
        };

        let replies = engine.run_group_turn(request).await.unwrap();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].character_name.as_deref(), Some("Mara"));
        assert_eq!(replies[1].character_name.as_deref(), Some("Toren"));
        assert!(replies.iter().all(|r| r.error.is_none()));

        // The second character's request contains the first one's reply.
        let last_request = capture.last();
        assert!(last_request
            .messages
            .iter()
            .any(|m| m.role == ChatRole::Assistant && m.content == "Mara: A reply."));
    }

    #[tokio::test]
    async fn test_group_turn_reports_member_failure_in_place() {
        let engine = engine_with(CaptureProvider::new("fine")).await;

        let request = GroupTurnRequest {
            character_ids: vec!["char-1".to_string(), "ghost".to_string()],
            user_message: "Hello.".to_string(),
            history: Vec::new(),
            provider: None,
            model: None,
            lorebook_ids: Vec::new(),
            max_tokens: None,
            temperature: None,
        };

        let replies = engine.run_group_turn(request).await.unwrap();
        assert_eq!(replies.len(), 2);
        assert!(replies[0].reply.is_some());
        assert!(replies[1].reply.is_none());
        assert!(replies[1].error.as_deref().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_retry_recovers_from_rate_limit() {
        use std::sync::atomic::{AtomicU32, Ordering};

        struct FlakyProvider {
            calls: AtomicU32,
        }

        #[async_trait]
        impl ChatProvider for FlakyProvider {
            async fn complete(
                &self,
                request: ChatRequest,
            ) -> Result<ChatResponse, ProviderError> {
                if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ProviderError::RateLimited)
                } else {
                    Ok(ChatResponse::text(request.model, "recovered"))
                }
            }

            fn name(&self) -> &str {
                "Flaky"
            }
        }

        let db = seeded_db().await;
        let mut router = ProviderRouter::new(ProviderKind::Xai);
        router.register(
            ProviderKind::Xai,
            Arc::new(FlakyProvider {
                calls: AtomicU32::new(0),
            }),
            "grok-4-1-fast",
        );

        let settings = EngineSettings {
            retry: RetryPolicy {
                max_retries: 2,
                initial_delay: std::time::Duration::from_millis(1),
                max_delay: std::time::Duration::from_millis(2),
                backoff_multiplier: 2.0,
            },
            ..EngineSettings::default()
        };

        let engine = ChatEngine::new(db, router, settings);
        let outcome = engine.run_turn(turn("hello")).await.unwrap();
        assert_eq!(outcome.reply, "recovered");
    }
}
