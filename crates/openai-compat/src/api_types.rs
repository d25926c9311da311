//! Chat-completions wire types.

use chat_core::{ChatMessage, TokenUsage};
use serde::{Deserialize, Serialize};

/// A role-tagged message as it appears on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    /// Role: "system", "user", or "assistant".
    pub role: String,
    /// Message content.
    pub content: String,
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
        }
    }
}

/// Chat completion request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    /// Model to use.
    pub model: String,
    /// Messages in the conversation.
    pub messages: Vec<WireMessage>,
    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Request a streamed (SSE) response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// Chat completion response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    /// Response ID, when reported.
    pub id: Option<String>,
    /// Model used.
    pub model: Option<String>,
    /// Response choices.
    pub choices: Vec<Choice>,
    /// Token usage.
    pub usage: Option<Usage>,
}

/// A response choice.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    /// The message.
    pub message: ResponseMessage,
    /// Finish reason.
    pub finish_reason: Option<String>,
}

/// Response message.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    /// Content (may be null).
    pub content: Option<String>,
}

/// Token usage block.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Usage {
    /// Prompt tokens.
    pub prompt_tokens: u32,
    /// Completion tokens.
    pub completion_tokens: u32,
    /// Total tokens.
    pub total_tokens: u32,
}

impl From<Usage> for TokenUsage {
    fn from(usage: Usage) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

/// A streamed completion chunk.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionChunk {
    /// Chunk choices.
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

/// A choice inside a streamed chunk.
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    /// Incremental delta.
    #[serde(default)]
    pub delta: ChunkDelta,
    /// Finish reason, set on the final content chunk.
    pub finish_reason: Option<String>,
}

/// Incremental message delta.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkDelta {
    /// Content fragment, if any.
    pub content: Option<String>,
}

/// Error envelope returned by the upstream API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorEnvelope {
    /// Error details.
    pub error: ApiErrorDetails,
}

/// Upstream error details.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetails {
    /// Error message.
    pub message: String,
    /// Error type.
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    /// Error code.
    pub code: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_skips_unset_options() {
        let request = ChatCompletionRequest {
            model: "m".to_string(),
            messages: vec![WireMessage {
                role: "user".to_string(),
                content: "hi".to_string(),
            }],
            max_tokens: None,
            temperature: None,
            stream: None,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("max_tokens"));
        assert!(!json.contains("temperature"));
        assert!(!json.contains("stream"));
    }

    #[test]
    fn test_chunk_parses_with_missing_fields() {
        let chunk: ChatCompletionChunk =
            serde_json::from_str("{\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}").unwrap();
        assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("Hel"));
        assert!(chunk.choices[0].finish_reason.is_none());

        let finish: ChatCompletionChunk =
            serde_json::from_str("{\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}")
                .unwrap();
        assert_eq!(finish.choices[0].finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn test_error_envelope_parses() {
        let envelope: ApiErrorEnvelope = serde_json::from_str(
            "{\"error\":{\"message\":\"model not found\",\"type\":\"invalid_request_error\",\"code\":404}}",
        )
        .unwrap();
        assert_eq!(envelope.error.message, "model not found");
        assert_eq!(
            envelope.error.error_type.as_deref(),
            Some("invalid_request_error")
        );
    }

    #[test]
    fn test_wire_message_from_chat_message() {
        let wire = WireMessage::from(&ChatMessage::assistant("sure"));
        assert_eq!(wire.role, "assistant");
        assert_eq!(wire.content, "sure");
    }
}
