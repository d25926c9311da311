//! Character cards and system-prompt assembly.
//!
//! A [`CharacterCard`] is a flat, ChubAI/SillyTavern-compatible record
//! describing a persona. [`build_system_prompt`] turns a card plus
//! per-deployment [`PromptOptions`] into the deterministic, ordered
//! system prompt the chat engine sends to providers.

mod card;
mod prompt;

pub use card::{expand_macros, CharacterCard};
pub use prompt::{
    build_system_prompt, AttributeState, PromptOptions, DEFAULT_ROLEPLAY_RULES,
};
