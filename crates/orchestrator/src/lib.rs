//! Chat engine coordinating prompt assembly, lore injection and provider routing.
//!
//! This crate provides the [`ChatEngine`] type which runs chat turns for
//! the Reverie roleplay server.
//!
//! # Architecture
//!
//! ```text
//! Chat request (from api)
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       CHAT ENGINE                           │
//! │                                                             │
//! │  1. Load character card and lore candidates (database)      │
//! │         ↓                                                   │
//! │  2. Assemble the system prompt (persona)                    │
//! │         ↓                                                   │
//! │  3. Scan recent messages, inject triggered lore (lorebook)  │
//! │         ↓                                                   │
//! │  4. Trim history, resolve provider and model (router)       │
//! │         ↓                                                   │
//! │  5. Call the provider, retrying rate limits with backoff    │
//! │         ↓                                                   │
//! │  6. Persist the exchange when a session is attached         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Streamed turns run steps 1-4 the same way and hand the caller a delta
//! stream; the caller records the exchange after the stream completes.

mod context;
mod engine;
mod error;
mod retry;
mod router;

// Public exports
pub use context::LoreContext;
pub use engine::{
    collect_stream, ChatEngine, EngineSettings, GroupReply, GroupTurnRequest, StreamTurn,
    TurnOutcome, TurnRequest, LORE_SCAN_MESSAGES,
};
pub use error::EngineError;
pub use retry::{with_retry, RetryPolicy};
pub use router::{ProviderKind, ProviderRouter};

// Re-export commonly used types from dependencies
pub use chat_core::{ChatMessage, ChatRole, ChatStream, ProviderError, StreamEvent, TokenUsage};
pub use persona::AttributeState;
