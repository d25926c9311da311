//! Echo provider - repeats the last user message.

use async_trait::async_trait;
use chat_core::{ChatProvider, ChatRequest, ChatResponse, ProviderError};

/// A provider that echoes the last user message back.
///
/// Useful for testing the request flow without any model behind it.
#[derive(Debug, Clone, Default)]
pub struct EchoProvider {
    /// Optional prefix added before the echo.
    prefix: Option<String>,
}

impl EchoProvider {
    /// Create a new EchoProvider with no prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new EchoProvider with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

#[async_trait]
impl ChatProvider for EchoProvider {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let last_user = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == chat_core::ChatRole::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let content = match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, last_user),
            None => last_user,
        };

        Ok(ChatResponse::text(request.model, content))
    }

    fn name(&self) -> &str {
        "EchoProvider"
    }
}
