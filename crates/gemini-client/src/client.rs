//! GeminiProvider implementation.

use async_trait::async_trait;
use chat_core::{
    ChatProvider, ChatRequest, ChatResponse, ChatStream, ProviderError, StreamEvent,
};
use futures::StreamExt;
use reqwest::Client;
use reqwest_eventsource::{Event, EventSource, RequestBuilderExt};
use tracing::{debug, info, warn};

use crate::api_types::{
    convert_messages, ApiErrorEnvelope, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig,
};
use crate::config::GeminiConfig;

/// A [`ChatProvider`] backed by the Gemini API.
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    /// Create a new provider with the given configuration.
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder().build().map_err(|e| {
            ProviderError::Configuration(format!("failed to create HTTP client: {}", e))
        })?;

        info!("Gemini provider initialized with model: {}", config.model);

        Ok(Self { client, config })
    }

    /// Create a provider from environment variables.
    ///
    /// See [`GeminiConfig::from_env`] for the variables read.
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::new(GeminiConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{}",
            self.config.api_url.trim_end_matches('/'),
            model,
            method
        )
    }

    fn build_body(&self, request: &ChatRequest) -> GenerateContentRequest {
        let (system_instruction, contents) = convert_messages(&request.messages);

        GenerateContentRequest {
            contents,
            system_instruction,
            generation_config: Some(GenerationConfig {
                max_output_tokens: request.max_tokens.or(self.config.max_output_tokens),
                temperature: request.temperature.or(self.config.temperature),
            }),
        }
    }

    async fn error_from_response(response: reqwest::Response) -> ProviderError {
        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return ProviderError::RateLimited;
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorEnvelope>(&text)
            .map(|envelope| envelope.error.message)
            .unwrap_or(text);

        ProviderError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let model = request.model.clone();
        let body = self.build_body(&request);

        debug!(model = %model, contents = body.contents.len(), "Sending generateContent request");

        let response = self
            .client
            .post(self.endpoint(&model, "generateContent"))
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(format!("failed to send request: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("failed to parse response: {}", e)))?;

        if let Some(usage) = parsed.usage_metadata {
            debug!(
                prompt_tokens = usage.prompt_token_count,
                completion_tokens = usage.candidates_token_count,
                total_tokens = usage.total_token_count,
                "Token usage"
            );
        }

        let candidate = parsed.candidates.into_iter().next().ok_or_else(|| {
            ProviderError::InvalidResponse("response has no candidates".to_string())
        })?;

        let content = candidate
            .content
            .map(|content| content.joined_text())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                ProviderError::InvalidResponse("first candidate has no text".to_string())
            })?;

        Ok(ChatResponse {
            content,
            model,
            finish_reason: candidate.finish_reason,
            usage: parsed.usage_metadata.map(Into::into),
        })
    }

    async fn stream(&self, request: ChatRequest) -> Result<ChatStream, ProviderError> {
        let model = request.model.clone();
        let body = self.build_body(&request);

        debug!(model = %model, "Opening streamGenerateContent stream");

        let url = format!(
            "{}?alt=sse",
            self.endpoint(&model, "streamGenerateContent")
        );
        let source = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .eventsource()
            .map_err(|e| {
                ProviderError::Configuration(format!("failed to open event stream: {}", e))
            })?;

        Ok(event_stream(source))
    }

    fn name(&self) -> &str {
        "Gemini"
    }
}

struct SseState {
    source: EventSource,
    pending_done: Option<Option<String>>,
    finished: bool,
}

/// Convert the SSE event source into a [`ChatStream`].
///
/// Each event carries a `GenerateContentResponse`; candidate text becomes
/// a delta, the finish reason (or stream end) becomes Done. The source is
/// closed on termination so it never reconnects and replays the request.
fn event_stream(source: EventSource) -> ChatStream {
    let state = SseState {
        source,
        pending_done: None,
        finished: false,
    };

    Box::pin(futures::stream::unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }

        loop {
            match state.source.next().await {
                Some(Ok(Event::Open)) => continue,
                Some(Ok(Event::Message(message))) => {
                    let parsed: GenerateContentResponse =
                        match serde_json::from_str(&message.data) {
                            Ok(parsed) => parsed,
                            Err(err) => {
                                warn!(error = %err, "Failed to parse stream event");
                                continue;
                            }
                        };

                    let Some(candidate) = parsed.candidates.into_iter().next() else {
                        continue;
                    };

                    if let Some(reason) = candidate.finish_reason {
                        state.pending_done = Some(Some(reason));
                    }

                    let text = candidate
                        .content
                        .map(|content| content.joined_text())
                        .filter(|text| !text.is_empty());

                    match text {
                        Some(text) => return Some((Ok(StreamEvent::Delta(text)), state)),
                        None => continue,
                    }
                }
                Some(Err(reqwest_eventsource::Error::StreamEnded)) | None => {
                    state.finished = true;
                    state.source.close();
                    return Some((
                        Ok(StreamEvent::Done {
                            finish_reason: state.pending_done.take().flatten(),
                        }),
                        state,
                    ));
                }
                Some(Err(reqwest_eventsource::Error::InvalidStatusCode(status, response))) => {
                    state.finished = true;
                    state.source.close();
                    let err = status_error(status, response).await;
                    return Some((Err(err), state));
                }
                Some(Err(err)) => {
                    state.finished = true;
                    state.source.close();
                    return Some((Err(ProviderError::Network(err.to_string())), state));
                }
            }
        }
    }))
}

async fn status_error(status: reqwest::StatusCode, response: reqwest::Response) -> ProviderError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return ProviderError::RateLimited;
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message)
        .unwrap_or(body);
    ProviderError::Api {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_core::ChatMessage;

    fn provider() -> GeminiProvider {
        GeminiProvider::new(GeminiConfig::default().with_api_key("test-key")).unwrap()
    }

    #[test]
    fn test_endpoint_format() {
        let provider = provider();
        assert_eq!(
            provider.endpoint("gemini-2.0-flash", "generateContent"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_body_maps_system_and_roles() {
        let provider = provider();
        let request = ChatRequest::new(
            "gemini-2.0-flash",
            vec![
                ChatMessage::system("rules"),
                ChatMessage::user("hi"),
                ChatMessage::assistant("hello"),
            ],
        );

        let body = provider.build_body(&request);
        assert!(body.system_instruction.is_some());
        assert_eq!(body.contents.len(), 2);
        assert_eq!(body.contents[1].role.as_deref(), Some("model"));
    }

    #[test]
    fn test_body_generation_config_defaults() {
        let provider = provider();
        let request = ChatRequest::new("gemini-2.0-flash", vec![ChatMessage::user("hi")]);

        let config = provider.build_body(&request).generation_config.unwrap();
        assert_eq!(config.max_output_tokens, Some(1024));
        assert_eq!(config.temperature, Some(0.8));
    }

    #[test]
    fn test_provider_name() {
        assert_eq!(provider().name(), "Gemini");
    }
}
