//! Mock provider implementations for testing chat flows.
//!
//! - [`EchoProvider`] - echoes the last user message back
//! - [`ScriptedProvider`] - returns canned replies in order, with
//!   word-by-word streaming

mod echo;
mod scripted;

pub use echo::EchoProvider;
pub use scripted::ScriptedProvider;
