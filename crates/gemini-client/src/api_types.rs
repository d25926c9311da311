//! Gemini generateContent wire types.

use chat_core::{ChatMessage, ChatRole, TokenUsage};
use serde::{Deserialize, Serialize};

/// Request body for `generateContent` / `streamGenerateContent`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Conversation turns (user and model roles only).
    pub contents: Vec<Content>,
    /// System prompt, delivered out of band from the turns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    /// Generation parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// A content block: a role plus text parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    /// "user" or "model"; absent on system instructions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Text parts.
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// A content block with a single text part.
    pub fn text(role: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            role: role.map(|r| r.to_string()),
            parts: vec![Part { text: text.into() }],
        }
    }

    /// Concatenated text of all parts.
    pub fn joined_text(&self) -> String {
        self.parts
            .iter()
            .map(|part| part.text.as_str())
            .collect::<Vec<_>>()
            .join("")
    }
}

/// A single text part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    /// The text.
    pub text: String,
}

/// Generation parameters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Maximum output tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Response body for `generateContent`; streamed responses reuse the same
/// shape per SSE event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Candidate completions.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Token usage.
    pub usage_metadata: Option<UsageMetadata>,
}

/// A candidate completion.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Generated content.
    pub content: Option<Content>,
    /// Finish reason (e.g. "STOP").
    pub finish_reason: Option<String>,
}

/// Token usage metadata.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    /// Prompt tokens.
    #[serde(default)]
    pub prompt_token_count: u32,
    /// Completion tokens.
    #[serde(default)]
    pub candidates_token_count: u32,
    /// Total tokens.
    #[serde(default)]
    pub total_token_count: u32,
}

impl From<UsageMetadata> for TokenUsage {
    fn from(usage: UsageMetadata) -> Self {
        Self {
            prompt_tokens: usage.prompt_token_count,
            completion_tokens: usage.candidates_token_count,
            total_tokens: usage.total_token_count,
        }
    }
}

/// Error envelope returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorEnvelope {
    /// Error details.
    pub error: ApiErrorDetails,
}

/// API error details.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetails {
    /// Error message.
    pub message: String,
    /// Status string (e.g. "INVALID_ARGUMENT").
    pub status: Option<String>,
}

/// Map chat messages onto Gemini's request shape.
///
/// System messages are pulled out into a single `system_instruction`
/// block (joined in order); user messages keep the "user" role and
/// assistant messages become "model".
pub fn convert_messages(messages: &[ChatMessage]) -> (Option<Content>, Vec<Content>) {
    let mut system_texts: Vec<&str> = Vec::new();
    let mut contents: Vec<Content> = Vec::new();

    for message in messages {
        match message.role {
            ChatRole::System => system_texts.push(&message.content),
            ChatRole::User => contents.push(Content::text(Some("user"), &message.content)),
            ChatRole::Assistant => contents.push(Content::text(Some("model"), &message.content)),
        }
    }

    let system_instruction = if system_texts.is_empty() {
        None
    } else {
        Some(Content::text(None, system_texts.join("\n\n")))
    };

    (system_instruction, contents)
}
