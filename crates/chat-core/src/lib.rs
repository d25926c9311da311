//! Core trait and types for chat provider implementations.
//!
//! This crate provides the shared interface for all LLM provider
//! implementations in the Reverie roleplay server. It defines:
//!
//! - [`ChatProvider`] - The trait that all provider implementations must implement
//! - [`ChatRequest`] / [`ChatResponse`] - Completion request/response types
//! - [`StreamEvent`] / [`ChatStream`] - Incremental streaming types
//! - [`ProviderError`] - Error types for provider operations
//! - [`Transcript`] - Conversation window with turn-based trimming
//!
//! # Example
//!
//! ```rust
//! use chat_core::{ChatProvider, ChatRequest, ChatResponse, ProviderError};
//! use chat_core::async_trait;
//!
//! struct MyProvider;
//!
//! #[async_trait]
//! impl ChatProvider for MyProvider {
//!     async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
//!         Ok(ChatResponse::text(request.model, "Hello!"))
//!     }
//!
//!     fn name(&self) -> &str {
//!         "MyProvider"
//!     }
//! }
//! ```

mod error;
mod message;
mod prompt;
mod provider;
mod transcript;

pub use error::ProviderError;
pub use message::{
    ChatMessage, ChatRequest, ChatResponse, ChatRole, ChatStream, StreamEvent, TokenUsage,
};
pub use prompt::fingerprint;
pub use provider::ChatProvider;
pub use transcript::Transcript;

// Re-export async_trait for convenience
pub use async_trait::async_trait;
