//! Character card type and macro expansion.

use serde::{Deserialize, Serialize};

/// A character card in the ChubAI/SillyTavern flat layout.
///
/// Every prompt-source field may be empty; empty fields simply produce no
/// section in the assembled prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CharacterCard {
    /// Character name, substituted for `{{char}}` in card text.
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
    /// Greeting shown when a new chat begins.
    #[serde(default)]
    pub first_message: String,
    /// Example dialogue demonstrating the character's voice.
    #[serde(default)]
    pub message_example: String,
    /// Out-of-band notes from the card author.
    #[serde(default)]
    pub creator_notes: String,
    /// Card-supplied system prompt.
    #[serde(default)]
    pub system_prompt: String,
    /// Instructions placed after the conversation-derived sections.
    #[serde(default)]
    pub post_history_instructions: String,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Card author, if known.
    #[serde(default)]
    pub creator: Option<String>,
    /// Card revision, if known.
    #[serde(default)]
    pub character_version: Option<String>,
}

impl CharacterCard {
    /// Create a card with only a name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Expand `{{char}}` and `{{user}}` placeholders in card text.
///
/// Matching is case-insensitive and tolerates whitespace inside the
/// braces; unknown placeholders are left untouched.
pub fn expand_macros(text: &str, char_name: &str, user_name: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        match after.find("}}") {
            Some(end) => {
                let token = after[..end].trim().to_ascii_lowercase();
                match token.as_str() {
                    "char" => output.push_str(char_name),
                    "user" => output.push_str(user_name),
                    _ => output.push_str(&rest[start..start + 2 + end + 2]),
                }
                rest = &after[end + 2..];
            }
            None => {
                // Unterminated braces; emit as-is.
                output.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    output.push_str(rest);
    output
}
