//! Application state shared across handlers.

use std::sync::Arc;

use database::Database;
use orchestrator::ChatEngine;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Chat engine.
    pub engine: Arc<ChatEngine>,
    /// Optional bearer token required on /api routes.
    pub api_token: Option<String>,
}

impl AppState {
    /// Create new application state.
    pub fn new(db: Database, engine: Arc<ChatEngine>, api_token: Option<String>) -> Self {
        Self {
            db,
            engine,
            api_token,
        }
    }
}
