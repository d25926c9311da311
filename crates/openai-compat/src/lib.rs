//! Chat-completions client for OpenAI-wire-compatible providers.
//!
//! OpenRouter, xAI and Groq all speak the same chat-completions wire
//! format, so a single [`OpenAiCompatProvider`] covers all three; the
//! per-provider differences (base URL, default model, env prefix) live in
//! [`OpenAiCompatConfig`] presets.

mod api_types;
mod client;
mod config;
mod stream;

pub use api_types::{
    ApiErrorEnvelope, ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse,
    ChunkChoice, ChunkDelta, WireMessage,
};
pub use client::OpenAiCompatProvider;
pub use config::{OpenAiCompatConfig, OpenAiCompatConfigBuilder};
