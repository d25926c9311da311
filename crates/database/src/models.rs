//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A stored character card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Character {
    /// Character UUID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Who the character is.
    pub description: String,
    /// How the character behaves.
    pub personality: String,
    /// The situation the conversation starts in.
    pub scenario: String,
    /// Greeting for a new chat.
    pub first_message: String,
    /// Example dialogue.
    pub message_example: String,
    /// Author notes.
    pub creator_notes: String,
    /// Card-supplied system prompt.
    pub system_prompt: String,
    /// Instructions placed after conversation-derived sections.
    pub post_history_instructions: String,
    /// Free-form tags, stored as JSON.
    pub tags: Json<Vec<String>>,
    /// Linked lorebook, if any.
    pub lorebook_id: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// Mutable character fields, as accepted on create/update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CharacterData {
    /// Display name.
    pub name: String,
    /// Who the character is.
    #[serde(default)]
    pub description: String,
    /// How the character behaves.
    #[serde(default)]
    pub personality: String,
    /// The situation the conversation starts in.
    #[serde(default)]
    pub scenario: String,
    /// Greeting for a new chat.
    #[serde(default)]
    pub first_message: String,
    /// Example dialogue.
    #[serde(default)]
    pub message_example: String,
    /// Author notes.
    #[serde(default)]
    pub creator_notes: String,
    /// Card-supplied system prompt.
    #[serde(default)]
    pub system_prompt: String,
    /// Instructions placed after conversation-derived sections.
    #[serde(default)]
    pub post_history_instructions: String,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Linked lorebook, if any.
    #[serde(default)]
    pub lorebook_id: Option<String>,
}

/// A stored lorebook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LorebookRow {
    /// Lorebook UUID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// Mutable lorebook fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LorebookData {
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
}

/// A stored lore entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct LoreEntryRow {
    /// Entry UUID.
    pub id: String,
    /// Owning lorebook.
    pub lorebook_id: String,
    /// Display name.
    pub name: String,
    /// Optional category.
    pub category: Option<String>,
    /// Trigger keywords, stored as JSON.
    pub keywords: Json<Vec<String>>,
    /// The fact itself.
    pub content: String,
    /// Importance tier ("low", "medium", "high", "critical").
    pub importance: String,
    /// Whether the entry can trigger.
    pub enabled: bool,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// Mutable lore entry fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoreEntryData {
    /// Display name.
    pub name: String,
    /// Optional category.
    #[serde(default)]
    pub category: Option<String>,
    /// Trigger keywords.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// The fact itself.
    #[serde(default)]
    pub content: String,
    /// Importance tier.
    #[serde(default = "default_importance")]
    pub importance: String,
    /// Whether the entry can trigger.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_importance() -> String {
    "medium".to_string()
}

fn default_enabled() -> bool {
    true
}

impl Default for LoreEntryData {
    fn default() -> Self {
        Self {
            name: String::new(),
            category: None,
            keywords: Vec::new(),
            content: String::new(),
            importance: default_importance(),
            enabled: true,
        }
    }
}

/// A stored chat session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ChatSession {
    /// Session UUID.
    pub id: String,
    /// Character the session belongs to.
    pub character_id: String,
    /// User-facing title.
    pub title: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// Mutable session fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SessionData {
    /// Character the session belongs to.
    pub character_id: String,
    /// User-facing title.
    #[serde(default)]
    pub title: String,
}

/// A stored chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ChatMessageRow {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Owning session.
    pub session_id: String,
    /// Role: "system", "user", or "assistant".
    pub role: String,
    /// Message content.
    pub content: String,
    /// Creation timestamp.
    pub created_at: String,
}
