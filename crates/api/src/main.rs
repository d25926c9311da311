//! Reverie HTTP API server.
//!
//! Exposes character and lorebook management, chat sessions, and the chat
//! endpoints (single and multi-character, JSON or SSE streaming).

mod config;
mod error;
mod routes;
mod state;

use std::sync::Arc;

use database::Database;
use orchestrator::{ChatEngine, EngineSettings, ProviderRouter};
use tracing::info;

use crate::config::ApiConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Load configuration
    let config = ApiConfig::from_env()?;

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    // Build the provider router and chat engine
    let router = ProviderRouter::from_env()?;
    let engine = ChatEngine::new(db.clone(), router, EngineSettings::from_env());

    // Build application state
    let state = AppState::new(db, Arc::new(engine), config.api_token.clone());

    // Build router
    let app = routes::router(state);

    // Start server
    info!(addr = %config.addr, "Reverie API listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
