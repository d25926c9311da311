//! Lorebooks: world knowledge injected into chat prompts.
//!
//! A [`Lorebook`] is a named collection of [`LoreEntry`] records. Each
//! entry carries trigger keywords and an [`Importance`] tier; when a
//! keyword appears in the recent conversation text the entry is injected
//! into the system prompt as part of a world-info block.

mod entry;
mod matcher;

pub use entry::{Importance, LoreEntry, Lorebook, ParseImportanceError};
pub use matcher::{format_lore_block, match_entries, MAX_ACTIVE_ENTRIES};
