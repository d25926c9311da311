//! Error types for the HTTP API.
//!
//! Every failure maps onto one JSON envelope:
//! `{ "error": { "message": ..., "type": ... } }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use database::DatabaseError;
use orchestrator::{EngineError, ProviderError};
use thiserror::Error;

/// Errors that can occur while serving an API request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or wrong bearer token.
    #[error("Unauthorized")]
    Unauthorized,

    /// Chat engine failure.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Direct persistence failure (CRUD routes).
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl ApiError {
    fn status_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "auth_error"),
            ApiError::Engine(EngineError::Provider(ProviderError::RateLimited)) => {
                (StatusCode::TOO_MANY_REQUESTS, "rate_limited")
            }
            ApiError::Engine(EngineError::Provider(_)) => {
                (StatusCode::BAD_GATEWAY, "upstream_error")
            }
            ApiError::Engine(EngineError::UnknownProvider(_))
            | ApiError::Engine(EngineError::InvalidRequest(_)) => {
                (StatusCode::BAD_REQUEST, "invalid_request_error")
            }
            ApiError::Engine(EngineError::Database(err)) => database_status(err),
            ApiError::Database(err) => database_status(err),
        }
    }
}

fn database_status(err: &DatabaseError) -> (StatusCode, &'static str) {
    match err {
        DatabaseError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
        DatabaseError::AlreadyExists { .. } => (StatusCode::CONFLICT, "conflict"),
        DatabaseError::Validation(_) => (StatusCode::BAD_REQUEST, "invalid_request_error"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_type();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = %status, "{}", message);
        } else {
            tracing::warn!(status = %status, "{}", message);
        }

        let body = serde_json::json!({
            "error": {
                "message": message,
                "type": error_type,
            }
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
