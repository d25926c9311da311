//! Provider implementation for the chat-completions wire format.

use async_trait::async_trait;
use chat_core::{ChatProvider, ChatRequest, ChatResponse, ChatStream, ProviderError};
use reqwest::Client;
use reqwest_eventsource::RequestBuilderExt;
use tracing::{debug, info};

use crate::api_types::{
    ApiErrorEnvelope, ChatCompletionRequest, ChatCompletionResponse, WireMessage,
};
use crate::config::OpenAiCompatConfig;
use crate::stream::chunk_stream;

/// A [`ChatProvider`] for any chat-completions-compatible API.
///
/// One implementation serves OpenRouter, xAI and Groq; the configuration
/// preset decides which.
pub struct OpenAiCompatProvider {
    client: Client,
    config: OpenAiCompatConfig,
}

impl OpenAiCompatProvider {
    /// Create a new provider with the given configuration.
    pub fn new(config: OpenAiCompatConfig) -> Result<Self, ProviderError> {
        let client = Client::builder().build().map_err(|e| {
            ProviderError::Configuration(format!("failed to create HTTP client: {}", e))
        })?;

        info!(
            "{} provider initialized with model: {}",
            config.label, config.model
        );

        Ok(Self { client, config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &OpenAiCompatConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.api_url.trim_end_matches('/')
        )
    }

    fn build_body(&self, request: &ChatRequest, stream: bool) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: request.model.clone(),
            messages: request.messages.iter().map(WireMessage::from).collect(),
            max_tokens: request.max_tokens.or(self.config.max_tokens),
            temperature: request.temperature.or(self.config.temperature),
            stream: stream.then_some(true),
        }
    }
}

#[async_trait]
impl ChatProvider for OpenAiCompatProvider {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let body = self.build_body(&request, false);

        debug!(
            provider = %self.config.label,
            model = %body.model,
            messages = body.messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header(
                "Authorization",
                format!("Bearer {}", self.config.api_key),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(format!("failed to send request: {}", e)))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&text)
                .map(|envelope| envelope.error.message)
                .unwrap_or(text);
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("failed to parse response: {}", e)))?;

        if let Some(usage) = completion.usage {
            debug!(
                provider = %self.config.label,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "Token usage"
            );
        }

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("response has no choices".to_string()))?;

        let content = choice.message.content.ok_or_else(|| {
            ProviderError::InvalidResponse("first choice has no content".to_string())
        })?;

        Ok(ChatResponse {
            content,
            model: completion.model.unwrap_or(request.model),
            finish_reason: choice.finish_reason,
            usage: completion.usage.map(Into::into),
        })
    }

    async fn stream(&self, request: ChatRequest) -> Result<ChatStream, ProviderError> {
        let body = self.build_body(&request, true);

        debug!(
            provider = %self.config.label,
            model = %body.model,
            "Opening chat completion stream"
        );

        let source = self
            .client
            .post(self.endpoint())
            .header(
                "Authorization",
                format!("Bearer {}", self.config.api_key),
            )
            .json(&body)
            .eventsource()
            .map_err(|e| {
                ProviderError::Configuration(format!("failed to open event stream: {}", e))
            })?;

        Ok(chunk_stream(source, self.config.label.clone()))
    }

    fn name(&self) -> &str {
        &self.config.label
    }
}
