//! SSE chunk stream handling for streamed completions.

use chat_core::{ChatStream, ProviderError, StreamEvent};
use futures::StreamExt;
use reqwest_eventsource::{Event, EventSource};
use tracing::warn;

use crate::api_types::{ApiErrorEnvelope, ChatCompletionChunk};

struct SseState {
    source: EventSource,
    label: String,
    // finish_reason seen on a chunk, to be emitted as the Done event
    pending_done: Option<Option<String>>,
    finished: bool,
}

/// Convert an open event source into a [`ChatStream`] of deltas.
///
/// `[DONE]` markers and chunk-level finish reasons both terminate the
/// stream; malformed chunks are skipped with a warning. The event source
/// is closed on termination so it never attempts to reconnect and replay
/// the request.
pub(crate) fn chunk_stream(source: EventSource, label: String) -> ChatStream {
    let state = SseState {
        source,
        label,
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
                    if message.data.trim() == "[DONE]" {
                        return Some((finish(&mut state), state));
                    }

                    let chunk: ChatCompletionChunk = match serde_json::from_str(&message.data) {
                        Ok(chunk) => chunk,
                        Err(err) => {
                            warn!(
                                provider = %state.label,
                                error = %err,
                                "Failed to parse stream chunk"
                            );
                            continue;
                        }
                    };

                    let Some(choice) = chunk.choices.into_iter().next() else {
                        continue;
                    };

                    if let Some(reason) = choice.finish_reason {
                        state.pending_done = Some(Some(reason));
                    }

                    // A chunk can carry both a delta and a finish reason;
                    // the delta goes out now, the Done follows at [DONE]
                    // or stream end with the recorded reason.
                    match choice.delta.content.filter(|content| !content.is_empty()) {
                        Some(content) => return Some((Ok(StreamEvent::Delta(content)), state)),
                        None => continue,
                    }
                }
                Some(Err(reqwest_eventsource::Error::StreamEnded)) | None => {
                    return Some((finish(&mut state), state));
                }
                Some(Err(err)) => {
                    state.finished = true;
                    state.source.close();
                    return Some((Err(map_stream_error(err).await), state));
                }
            }
        }
    }))
}

fn finish(state: &mut SseState) -> Result<StreamEvent, ProviderError> {
    state.finished = true;
    state.source.close();
    Ok(StreamEvent::Done {
        finish_reason: state.pending_done.take().flatten(),
    })
}

async fn map_stream_error(err: reqwest_eventsource::Error) -> ProviderError {
    match err {
        reqwest_eventsource::Error::InvalidStatusCode(status, response) => {
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
        reqwest_eventsource::Error::InvalidContentType(content_type, _) => {
            ProviderError::InvalidResponse(format!(
                "unexpected content type: {:?}",
                content_type
            ))
        }
        other => ProviderError::Network(other.to_string()),
    }
}
