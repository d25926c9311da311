//! Chat routes: single-character (JSON or SSE) and multi-character.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::{Stream, StreamExt};
use orchestrator::{ChatEngine, GroupReply, GroupTurnRequest, StreamEvent, StreamTurn, TurnRequest};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::error::Result;
use crate::state::AppState;

/// Body of a single-character chat request.
#[derive(Deserialize)]
pub struct ChatBody {
    /// The turn itself.
    #[serde(flatten)]
    pub turn: TurnRequest,
    /// Stream the reply as SSE instead of returning JSON.
    #[serde(default)]
    pub stream: bool,
}

/// Response for a multi-character turn.
#[derive(Serialize)]
pub struct MultiChatResponse {
    pub replies: Vec<GroupReply>,
}

/// Run a single-character turn.
///
/// With `"stream": true` the reply arrives as OpenAI-style SSE chunks
/// terminated by `[DONE]`; otherwise the full turn outcome is returned as
/// JSON.
pub async fn chat(State(state): State<AppState>, Json(body): Json<ChatBody>) -> Result<Response> {
    if body.stream {
        let turn = state.engine.run_turn_stream(body.turn).await?;
        let stream = reply_sse(Arc::clone(&state.engine), turn);
        Ok(Sse::new(stream).into_response())
    } else {
        let outcome = state.engine.run_turn(body.turn).await?;
        Ok(Json(outcome).into_response())
    }
}

/// Run a multi-character turn; always JSON.
pub async fn multi_chat(
    State(state): State<AppState>,
    Json(body): Json<GroupTurnRequest>,
) -> Result<Json<MultiChatResponse>> {
    let replies = state.engine.run_group_turn(body).await?;
    Ok(Json(MultiChatResponse { replies }))
}

/// An OpenAI-style streamed completion chunk.
#[derive(Serialize)]
struct ChatCompletionChunk {
    id: String,
    object: String,
    created: u64,
    model: String,
    choices: Vec<ChunkChoice>,
}

#[derive(Serialize)]
struct ChunkChoice {
    index: u32,
    delta: serde_json::Value,
    finish_reason: Option<String>,
}

enum Phase {
    Role,
    Streaming,
    Done,
    Finished,
}

struct ReplyState {
    engine: Arc<ChatEngine>,
    turn: StreamTurn,
    accumulated: String,
    chunk_id: String,
    created: u64,
    phase: Phase,
}

impl ReplyState {
    fn chunk(&self, delta: serde_json::Value, finish_reason: Option<String>) -> String {
        let chunk = ChatCompletionChunk {
            id: self.chunk_id.clone(),
            object: "chat.completion.chunk".to_string(),
            created: self.created,
            model: self.turn.model.clone(),
            choices: vec![ChunkChoice {
                index: 0,
                delta,
                finish_reason,
            }],
        };
        serde_json::to_string(&chunk).unwrap()
    }

    /// Record the finished exchange, once, when a session is attached.
    async fn persist(&mut self) {
        let Some(session_id) = self.turn.session_id.take() else {
            return;
        };

        if let Err(err) = self
            .engine
            .record_exchange(&session_id, &self.turn.user_message, &self.accumulated)
            .await
        {
            error!(session = %session_id, error = %err, "Failed to persist streamed exchange");
        }
    }
}

/// SSE payloads for a streamed reply.
///
/// Emits a role chunk, one chunk per delta, a finish chunk, and the
/// `[DONE]` marker. A mid-stream provider error finishes the reply with
/// finish_reason "error" and skips persistence (partial replies are
/// never saved).
fn reply_payloads(engine: Arc<ChatEngine>, turn: StreamTurn) -> impl Stream<Item = String> {
    let state = ReplyState {
        engine,
        turn,
        accumulated: String::new(),
        chunk_id: format!("chatcmpl-{}", Uuid::new_v4()),
        created: unix_timestamp(),
        phase: Phase::Role,
    };

    futures::stream::unfold(state, |mut state| async move {
        match state.phase {
            Phase::Role => {
                state.phase = Phase::Streaming;
                let payload = state.chunk(serde_json::json!({"role": "assistant"}), None);
                Some((payload, state))
            }
            Phase::Streaming => match state.turn.stream.next().await {
                Some(Ok(StreamEvent::Delta(text))) => {
                    state.accumulated.push_str(&text);
                    let payload = state.chunk(serde_json::json!({"content": text}), None);
                    Some((payload, state))
                }
                Some(Ok(StreamEvent::Done { finish_reason })) => {
                    state.persist().await;
                    state.phase = Phase::Done;
                    let reason = finish_reason.unwrap_or_else(|| "stop".to_string());
                    let payload = state.chunk(serde_json::json!({}), Some(reason));
                    Some((payload, state))
                }
                Some(Err(err)) => {
                    error!(error = %err, "Provider stream failed mid-reply");
                    state.phase = Phase::Done;
                    let payload =
                        state.chunk(serde_json::json!({}), Some("error".to_string()));
                    Some((payload, state))
                }
                None => {
                    state.persist().await;
                    state.phase = Phase::Done;
                    let payload = state.chunk(serde_json::json!({}), Some("stop".to_string()));
                    Some((payload, state))
                }
            },
            Phase::Done => {
                state.phase = Phase::Finished;
                Some(("[DONE]".to_string(), state))
            }
            Phase::Finished => None,
        }
    })
}

fn reply_sse(
    engine: Arc<ChatEngine>,
    turn: StreamTurn,
) -> impl Stream<Item = std::result::Result<Event, Infallible>> {
    reply_payloads(engine, turn).map(|payload| Ok(Event::default().data(payload)))
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
