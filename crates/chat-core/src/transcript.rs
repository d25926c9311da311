//! Conversation transcript with turn-based trimming.
//!
//! A [`Transcript`] is the ordered message window a chat turn operates on:
//! the system prompt (if any) followed by alternating user/assistant
//! messages. It is a plain value, built per request; persistence lives in
//! the database crate.

use crate::message::{ChatMessage, ChatRole};

/// Ordered conversation window for a single chat turn.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transcript from existing messages, preserving order.
    pub fn from_messages(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }

    /// Append a message.
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Prepend a system message, replacing any existing leading one.
    ///
    /// The system prompt is assembled fresh each turn, so a stale system
    /// message from a stored transcript must not survive alongside it.
    pub fn set_system(&mut self, content: impl Into<String>) {
        if matches!(self.messages.first(), Some(m) if m.role == ChatRole::System) {
            self.messages.remove(0);
        }
        self.messages.insert(0, ChatMessage::system(content));
    }

    /// Number of messages in the transcript.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the transcript holds no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Borrow the messages in order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Consume the transcript, yielding the messages.
    pub fn into_messages(self) -> Vec<ChatMessage> {
        self.messages
    }

    /// Trim conversation history to at most `max_turns` user/assistant pairs.
    ///
    /// System messages are always preserved; the oldest non-system
    /// messages are dropped first. A `max_turns` of 0 drops all
    /// conversation history.
    pub fn trim_to_turns(&mut self, max_turns: usize) {
        let max_messages = max_turns.saturating_mul(2);
        let conversation_len = self
            .messages
            .iter()
            .filter(|m| m.role != ChatRole::System)
            .count();

        if conversation_len <= max_messages {
            return;
        }

        let mut to_remove = conversation_len - max_messages;
        self.messages.retain(|m| {
            if m.role != ChatRole::System && to_remove > 0 {
                to_remove -= 1;
                false
            } else {
                true
            }
        });
    }

    /// Text of the most recent user message, if any.
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.as_str())
    }

    /// Concatenated text of the last `n` non-system messages.
    ///
    /// This is the scan window for keyword-triggered lore matching.
    pub fn scan_text(&self, n: usize) -> String {
        let recent: Vec<&str> = self
            .messages
            .iter()
            .filter(|m| m.role != ChatRole::System)
            .rev()
            .take(n)
            .map(|m| m.content.as_str())
            .collect();

        recent
            .into_iter()
            .rev()
            .collect::<Vec<_>>()
            .join("\n")
    }
}
