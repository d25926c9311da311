//! System-prompt assembly.
//!
//! The prompt is a deterministic, ordered concatenation of up to twelve
//! optional sections. Order is fixed and significant: later sections can
//! reference earlier ones in the resulting prompt.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::card::{expand_macros, CharacterCard};

/// Baseline roleplay rules applied when a deployment does not override them.
pub const DEFAULT_ROLEPLAY_RULES: &str = "\
Stay in character at all times. Write in third person for actions and \
first person for dialogue. Never speak or act for the user. Keep replies \
grounded in the established scenario and world information.";

/// The character's current attribute state (mood, stats), rendered in
/// insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct AttributeState {
    attributes: IndexMap<String, String>,
}

impl AttributeState {
    /// Create an empty attribute state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute, preserving first-insertion order.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Whether any attributes are set.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    fn render(&self) -> String {
        self.attributes
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Per-deployment inputs to prompt assembly, beyond the card itself.
#[derive(Debug, Clone, Default)]
pub struct PromptOptions {
    /// Instructions applied to every character.
    pub global_instructions: Option<String>,
    /// Core roleplay rules; see [`DEFAULT_ROLEPLAY_RULES`].
    pub roleplay_rules: Option<String>,
    /// Output formatting rules.
    pub formatting_rules: Option<String>,
    /// The character's current attribute state.
    pub attribute_state: Option<AttributeState>,
}

/// Assemble the character system prompt.
///
/// Each section is included only when its source is non-empty, in this
/// fixed order: global instructions, character system prompt, roleplay
/// rules, description, personality, scenario, dialogue examples, creator
/// notes, tags, current attribute state, post-history instructions,
/// formatting rules. Card-sourced text has `{{char}}`/`{{user}}`
/// placeholders expanded. Pure data transformation; an empty card with
/// empty options yields an empty string.
pub fn build_system_prompt(
    card: &CharacterCard,
    options: &PromptOptions,
    user_name: &str,
) -> String {
    let expand = |text: &str| expand_macros(text, &card.name, user_name);
    let mut sections: Vec<String> = Vec::new();

    let push_raw = |sections: &mut Vec<String>, text: &str| {
        let text = text.trim();
        if !text.is_empty() {
            sections.push(text.to_string());
        }
    };
    let push_block = |sections: &mut Vec<String>, header: &str, text: &str| {
        let text = text.trim();
        if !text.is_empty() {
            sections.push(format!("[{}]\n{}", header, text));
        }
    };

    if let Some(global) = options.global_instructions.as_deref() {
        push_raw(&mut sections, global);
    }
    push_raw(&mut sections, &expand(&card.system_prompt));
    if let Some(rules) = options.roleplay_rules.as_deref() {
        push_raw(&mut sections, rules);
    }
    push_block(&mut sections, "DESCRIPTION", &expand(&card.description));
    push_block(&mut sections, "PERSONALITY", &expand(&card.personality));
    push_block(&mut sections, "SCENARIO", &expand(&card.scenario));
    push_block(
        &mut sections,
        "EXAMPLE DIALOGUE",
        &expand(&card.message_example),
    );
    push_block(&mut sections, "CREATOR NOTES", &card.creator_notes);
    push_block(&mut sections, "TAGS", &card.tags.join(", "));
    if let Some(state) = options.attribute_state.as_ref() {
        push_block(&mut sections, "CURRENT STATE", &state.render());
    }
    push_raw(&mut sections, &expand(&card.post_history_instructions));
    if let Some(formatting) = options.formatting_rules.as_deref() {
        push_block(&mut sections, "FORMATTING", formatting);
    }

    sections.join("\n\n")
}
