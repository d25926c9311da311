//! Google Gemini client.
//!
//! Gemini speaks its own wire format (`contents`/`parts`, a separate
//! `systemInstruction`, `"model"` as the assistant role), so it gets its
//! own provider crate mapped onto the shared [`chat_core::ChatProvider`]
//! contract.

mod api_types;
mod client;
mod config;

pub use client::GeminiProvider;
pub use config::GeminiConfig;
