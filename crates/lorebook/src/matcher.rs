//! Keyword-triggered lore relevance matching.
//!
//! A single synchronous pass: lowercase the scan text once, keep every
//! enabled entry whose keywords appear in it, order by importance and cap
//! the result. Entries with no keywords never trigger.

use std::cmp::Reverse;

use crate::entry::LoreEntry;

/// Maximum number of entries injected into a single prompt.
pub const MAX_ACTIVE_ENTRIES: usize = 10;

/// Select the lore entries triggered by the given conversation text.
///
/// Matching is a case-insensitive substring check of each keyword against
/// the text. Retained entries are sorted by importance (critical first,
/// stable for ties) and truncated to [`MAX_ACTIVE_ENTRIES`].
pub fn match_entries<'a>(text: &str, entries: &'a [LoreEntry]) -> Vec<&'a LoreEntry> {
    if text.is_empty() || entries.is_empty() {
        return Vec::new();
    }

    let haystack = text.to_lowercase();

    let mut matched: Vec<&LoreEntry> = entries
        .iter()
        .filter(|entry| entry.enabled && triggers(entry, &haystack))
        .collect();

    // sort_by_key is stable, so ties keep their candidate order
    matched.sort_by_key(|entry| Reverse(entry.importance));
    matched.truncate(MAX_ACTIVE_ENTRIES);
    matched
}

fn triggers(entry: &LoreEntry, haystack: &str) -> bool {
    entry.keywords.iter().any(|keyword| {
        let keyword = keyword.trim();
        !keyword.is_empty() && haystack.contains(&keyword.to_lowercase())
    })
}

/// Format matched entries into a world-info prompt block.
///
/// Returns `None` when nothing matched, so callers can skip the section
/// entirely.
pub fn format_lore_block(matches: &[&LoreEntry]) -> Option<String> {
    if matches.is_empty() {
        return None;
    }

    let mut block = String::from("[WORLD INFO]\n");
    for entry in matches {
        match entry.category.as_deref() {
            Some(category) if !category.trim().is_empty() => {
                block.push_str(&format!("{} ({}): {}\n", entry.name, category, entry.content));
            }
            _ => {
                block.push_str(&format!("{}: {}\n", entry.name, entry.content));
            }
        }
    }

    Some(block.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{Importance, LoreEntry};

    fn entry(id: &str, keywords: &[&str], importance: Importance) -> LoreEntry {
        LoreEntry {
            id: id.to_string(),
            name: format!("Entry {}", id),
            category: None,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            content: format!("Content for {}", id),
            importance,
            enabled: true,
        }
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let entries = vec![entry("a", &["Ironhold"], Importance::Medium)];

        let hits = match_entries("we rode toward IRONHOLD at dawn", &entries);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
    }

    #[test]
    fn test_substring_match() {
        let entries = vec![entry("a", &["dragon"], Importance::Medium)];

        let hits = match_entries("the dragonlord stirred", &entries);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_no_keywords_never_triggers() {
        let entries = vec![entry("a", &[], Importance::Critical)];

        let hits = match_entries("anything at all", &entries);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_blank_keyword_never_triggers() {
        let entries = vec![entry("a", &["  "], Importance::Critical)];

        let hits = match_entries("anything at all", &entries);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_disabled_entry_never_triggers() {
        let mut e = entry("a", &["dragon"], Importance::High);
        e.enabled = false;

        let entries = [e];
        let hits = match_entries("a dragon appears", &entries);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_duplicate_keyword_includes_both() {
        let entries = vec![
            entry("a", &["dragon"], Importance::Medium),
            entry("b", &["dragon"], Importance::Medium),
        ];

        let hits = match_entries("a dragon appears", &entries);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_sorted_by_importance_critical_first() {
        let entries = vec![
            entry("low", &["gate"], Importance::Low),
            entry("critical", &["gate"], Importance::Critical),
            entry("medium", &["gate"], Importance::Medium),
            entry("high", &["gate"], Importance::High),
        ];

        let hits = match_entries("they reached the gate", &entries);
        let ids: Vec<&str> = hits.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["critical", "high", "medium", "low"]);
    }

    #[test]
    fn test_sort_is_stable_within_tier() {
        let entries = vec![
            entry("first", &["gate"], Importance::High),
            entry("second", &["gate"], Importance::High),
        ];

        let hits = match_entries("the gate opened", &entries);
        let ids: Vec<&str> = hits.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn test_truncated_to_cap() {
        let entries: Vec<LoreEntry> = (0..15)
            .map(|i| {
                let importance = if i < 12 { Importance::Medium } else { Importance::Critical };
                entry(&format!("{}", i), &["gate"], importance)
            })
            .collect();

        let hits = match_entries("the gate opened", &entries);
        assert_eq!(hits.len(), MAX_ACTIVE_ENTRIES);
        // Critical entries survive the cut even though they were listed last.
        assert_eq!(hits[0].importance, Importance::Critical);
        assert_eq!(hits[1].importance, Importance::Critical);
        assert_eq!(hits[2].importance, Importance::Critical);
    }

    #[test]
    fn test_empty_candidates() {
        let hits = match_entries("anything", &[]);
        assert!(hits.is_empty());
        assert_eq!(format_lore_block(&hits), None);
    }

    #[test]
    fn test_empty_text() {
        let entries = vec![entry("a", &["dragon"], Importance::Medium)];
        assert!(match_entries("", &entries).is_empty());
    }

    #[test]
    fn test_format_lore_block() {
        let mut with_category = entry("a", &["x"], Importance::High);
        with_category.name = "Ironhold".to_string();
        with_category.category = Some("location".to_string());
        with_category.content = "A dwarven fortress in the north.".to_string();

        let mut without_category = entry("b", &["y"], Importance::Medium);
        without_category.name = "Queen Mara".to_string();
        without_category.content = "Rules the southern reaches.".to_string();

        let matches = vec![&with_category, &without_category];
        let block = format_lore_block(&matches).unwrap();

        assert!(block.starts_with("[WORLD INFO]"));
        assert!(block.contains("Ironhold (location): A dwarven fortress in the north."));
        assert!(block.contains("Queen Mara: Rules the southern reaches."));
        assert!(!block.ends_with('\n'));
    }
}
