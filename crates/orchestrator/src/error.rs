//! Error types for chat engine operations.

use chat_core::ProviderError;
use database::DatabaseError;
use thiserror::Error;

/// Errors that can occur while running a chat turn.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Provider call failed.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Persistence failed.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// The requested provider is not configured.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// The request is malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
