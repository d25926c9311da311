//! Lore context gathered for a chat turn.
//!
//! Candidate entries come from the character's linked lorebook plus any
//! lorebooks named on the request; the matcher then selects what the
//! recent conversation actually triggered.

use database::LoreEntryRow;
use lorebook::{format_lore_block, match_entries, Importance, LoreEntry};
use tracing::warn;

/// Candidate lore entries for a single turn.
#[derive(Debug, Default)]
pub struct LoreContext {
    entries: Vec<LoreEntry>,
}

impl LoreContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add stored entries to the candidate set.
    pub fn add_rows(&mut self, rows: Vec<LoreEntryRow>) {
        for row in rows {
            self.entries.push(entry_from_row(row));
        }
    }

    /// Number of candidate entries.
    pub fn candidate_count(&self) -> usize {
        self.entries.len()
    }

    /// Entries triggered by the given scan text, in injection order.
    pub fn matches(&self, scan_text: &str) -> Vec<&LoreEntry> {
        match_entries(scan_text, &self.entries)
    }

    /// Append the triggered world-info block to a system prompt.
    ///
    /// Returns the prompt unchanged when nothing triggered, and the names
    /// of the injected entries alongside the augmented prompt.
    pub fn augment_prompt(&self, system_prompt: &str, scan_text: &str) -> (String, Vec<String>) {
        let matches = self.matches(scan_text);
        let names: Vec<String> = matches.iter().map(|entry| entry.name.clone()).collect();

        let prompt = match format_lore_block(&matches) {
            Some(block) if system_prompt.trim().is_empty() => block,
            Some(block) => format!("{}\n\n{}", system_prompt.trim_end(), block),
            None => system_prompt.to_string(),
        };

        (prompt, names)
    }
}

fn entry_from_row(row: LoreEntryRow) -> LoreEntry {
    let importance = row.importance.parse().unwrap_or_else(|_| {
        // Writes are validated, so this only fires on hand-edited rows.
        warn!(entry = %row.id, importance = %row.importance, "Unknown importance tier, using medium");
        Importance::Medium
    });

    LoreEntry {
        id: row.id,
        name: row.name,
        category: row.category,
        keywords: row.keywords.0,
        content: row.content,
        importance,
        enabled: row.enabled,
    }
}
