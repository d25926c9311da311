//! The ChatProvider trait definition.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::message::{ChatRequest, ChatResponse, ChatStream, StreamEvent};

/// A trait for generating chat completions from an LLM backend.
///
/// Implementations range from deterministic test providers to HTTP clients
/// for hosted inference APIs. This trait is object-safe and can be used
/// with `Arc<dyn ChatProvider>`.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Generate a complete response for the request.
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError>;

    /// Generate a streamed response for the request.
    ///
    /// The default implementation runs [`complete`](Self::complete) and
    /// yields the full text as a single delta, so providers without a
    /// native streaming API still satisfy streaming callers.
    async fn stream(&self, request: ChatRequest) -> Result<ChatStream, ProviderError> {
        let response = self.complete(request).await?;
        let events = vec![
            Ok(StreamEvent::Delta(response.content)),
            Ok(StreamEvent::Done {
                finish_reason: response.finish_reason,
            }),
        ];
        Ok(Box::pin(futures::stream::iter(events)))
    }

    /// Get a human-readable name for this provider implementation.
    fn name(&self) -> &str;

    /// Check if the provider is ready to serve requests.
    ///
    /// Default implementation always returns true.
    async fn is_ready(&self) -> bool {
        true
    }
}
