//! Scripted provider - returns canned replies in order.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chat_core::{ChatProvider, ChatRequest, ChatResponse, ChatStream, ProviderError, StreamEvent};

/// A provider that yields a fixed sequence of replies.
///
/// Each call to [`complete`](ChatProvider::complete) or
/// [`stream`](ChatProvider::stream) consumes the next scripted reply; the
/// last reply repeats once the script is exhausted. Streaming yields the
/// reply word by word, which exercises delta accumulation in callers.
#[derive(Debug)]
pub struct ScriptedProvider {
    replies: Vec<String>,
    next: AtomicUsize,
}

impl ScriptedProvider {
    /// Create a provider from a reply script.
    pub fn new(replies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let replies: Vec<String> = replies.into_iter().map(Into::into).collect();
        Self {
            replies,
            next: AtomicUsize::new(0),
        }
    }

    /// Create a provider that always returns the same reply.
    pub fn always(reply: impl Into<String>) -> Self {
        let reply: String = reply.into();
        Self::new([reply])
    }

    fn next_reply(&self) -> Result<String, ProviderError> {
        if self.replies.is_empty() {
            return Err(ProviderError::InvalidResponse(
                "scripted provider has no replies".to_string(),
            ));
        }

        let index = self.next.fetch_add(1, Ordering::Relaxed);
        let index = index.min(self.replies.len() - 1);
        Ok(self.replies[index].clone())
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let reply = self.next_reply()?;
        Ok(ChatResponse::text(request.model, reply))
    }

    async fn stream(&self, _request: ChatRequest) -> Result<ChatStream, ProviderError> {
        let reply = self.next_reply()?;

        let mut events: Vec<Result<StreamEvent, ProviderError>> = reply
            .split_inclusive(' ')
            .map(|word| Ok(StreamEvent::Delta(word.to_string())))
            .collect();
        events.push(Ok(StreamEvent::Done {
            finish_reason: Some("stop".to_string()),
        }));

        Ok(Box::pin(futures::stream::iter(events)))
    }

    fn name(&self) -> &str {
        "ScriptedProvider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_core::ChatMessage;
    use futures::StreamExt;

    fn request() -> ChatRequest {
        ChatRequest::new("mock", vec![ChatMessage::user("hi")])
    }

    #[tokio::test]
    async fn test_replies_in_order_then_repeat_last() {
        let provider = ScriptedProvider::new(["first", "second"]);

        assert_eq!(provider.complete(request()).await.unwrap().content, "first");
        assert_eq!(provider.complete(request()).await.unwrap().content, "second");
        assert_eq!(provider.complete(request()).await.unwrap().content, "second");
    }

    #[tokio::test]
    async fn test_empty_script_errors() {
        let provider = ScriptedProvider::new(Vec::<String>::new());
        let err = provider.complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_stream_accumulates_to_full_reply() {
        let provider = ScriptedProvider::always("three word reply");
        let mut stream = provider.stream(request()).await.unwrap();

        let mut accumulated = String::new();
        let mut finished = false;
        while let Some(event) = stream.next().await {
            match event.unwrap() {
                StreamEvent::Delta(text) => accumulated.push_str(&text),
                StreamEvent::Done { finish_reason } => {
                    assert_eq!(finish_reason.as_deref(), Some("stop"));
                    finished = true;
                }
            }
        }

        assert!(finished);
        assert_eq!(accumulated, "three word reply");
    }
}
