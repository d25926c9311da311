//! Chat session routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use database::models::{ChatMessageRow, ChatSession, SessionData};
use database::{character, session};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::state::AppState;

/// Filter for session listing.
#[derive(Deserialize, Default)]
pub struct SessionFilter {
    /// Restrict to one character's sessions.
    pub character_id: Option<String>,
}

/// List sessions, optionally filtered by character.
pub async fn list_sessions(
    State(state): State<AppState>,
    Query(filter): Query<SessionFilter>,
) -> Result<Json<Vec<ChatSession>>> {
    let sessions = session::list_sessions(state.db.pool(), filter.character_id.as_deref()).await?;
    Ok(Json(sessions))
}

/// Create a session for a character.
pub async fn create_session(
    State(state): State<AppState>,
    Json(data): Json<SessionData>,
) -> Result<(StatusCode, Json<ChatSession>)> {
    let pool = state.db.pool();

    // 404 on a missing character rather than a foreign-key failure.
    character::get_character(pool, &data.character_id).await?;

    let id = Uuid::new_v4().to_string();
    let created = session::create_session(pool, &id, &data).await?;

    info!(session = %created.id, character = %created.character_id, "Session created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Get a session by ID.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ChatSession>> {
    let found = session::get_session(state.db.pool(), &id).await?;
    Ok(Json(found))
}

/// Delete a session and its messages.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    session::delete_session(state.db.pool(), &id).await?;

    info!(session = %id, "Session deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// List a session's messages, oldest first.
pub async fn list_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ChatMessageRow>>> {
    let pool = state.db.pool();
    // 404 on a missing session rather than an empty list.
    session::get_session(pool, &id).await?;
    let messages = session::list_messages(pool, &id).await?;
    Ok(Json(messages))
}
