//! Route handlers for the Reverie API.

pub mod characters;
pub mod chat;
pub mod health;
pub mod lorebooks;
pub mod models;
pub mod sessions;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;

use crate::error::ApiError;
use crate::state::AppState;

/// Build the router with all routes.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        // Characters
        .route(
            "/characters",
            get(characters::list_characters).post(characters::create_character),
        )
        .route(
            "/characters/:id",
            get(characters::get_character)
                .put(characters::update_character)
                .delete(characters::delete_character),
        )
        // Lorebooks and entries
        .route(
            "/lorebooks",
            get(lorebooks::list_lorebooks).post(lorebooks::create_lorebook),
        )
        .route(
            "/lorebooks/:id",
            get(lorebooks::get_lorebook)
                .put(lorebooks::update_lorebook)
                .delete(lorebooks::delete_lorebook),
        )
        .route(
            "/lorebooks/:id/entries",
            get(lorebooks::list_entries).post(lorebooks::create_entry),
        )
        .route(
            "/lorebooks/:id/entries/:entry_id",
            axum::routing::put(lorebooks::update_entry).delete(lorebooks::delete_entry),
        )
        // Sessions
        .route(
            "/sessions",
            get(sessions::list_sessions).post(sessions::create_session),
        )
        .route(
            "/sessions/:id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/sessions/:id/messages", get(sessions::list_messages))
        // Chat
        .route("/chat", post(chat::chat))
        .route("/multi-chat", post(chat::multi_chat))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_token,
        ));

    Router::new()
        .route("/health", get(health::health))
        .route("/v1/models", get(models::list_models))
        .nest("/api", api)
        .with_state(state)
}

/// Bearer-token gate for /api routes.
///
/// Disabled when no token is configured.
async fn require_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.api_token.as_deref() else {
        return Ok(next.run(request).await);
    };

    let Some(value) = request.headers().get(AUTHORIZATION) else {
        return Err(ApiError::Unauthorized);
    };

    let Ok(value) = value.to_str() else {
        return Err(ApiError::Unauthorized);
    };

    let token = value.strip_prefix("Bearer ").unwrap_or(value);
    if token != expected {
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(request).await)
}
