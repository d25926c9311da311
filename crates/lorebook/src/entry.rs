//! Lore entry and lorebook types.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Importance tier of a lore entry.
///
/// Ordering is significant: matched entries are injected critical-first,
/// and lower tiers are the first to fall off the cap.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    /// Background flavor.
    Low,
    /// Ordinary world facts.
    #[default]
    Medium,
    /// Facts the model should rarely ignore.
    High,
    /// Facts that must always win a slot when triggered.
    Critical,
}

impl Importance {
    /// Stable string form used in storage and APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Importance::Low => "low",
            Importance::Medium => "medium",
            Importance::High => "high",
            Importance::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Importance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown importance tier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown importance tier: {0}")]
pub struct ParseImportanceError(pub String);

impl FromStr for Importance {
    type Err = ParseImportanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Importance::Low),
            "medium" => Ok(Importance::Medium),
            "high" => Ok(Importance::High),
            "critical" => Ok(Importance::Critical),
            other => Err(ParseImportanceError(other.to_string())),
        }
    }
}

/// A single fact about the world, injected when triggered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoreEntry {
    /// Entry identifier.
    pub id: String,
    /// Display name, used as the prompt-block label.
    pub name: String,
    /// Optional category shown alongside the name.
    pub category: Option<String>,
    /// Keywords that trigger this entry (case-insensitive substrings).
    pub keywords: Vec<String>,
    /// The fact itself.
    pub content: String,
    /// Importance tier for slot ordering.
    pub importance: Importance,
    /// Disabled entries never trigger.
    pub enabled: bool,
}

impl LoreEntry {
    /// Create an enabled entry with the given name and content.
    pub fn new(id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: None,
            keywords: Vec::new(),
            content: content.into(),
            importance: Importance::default(),
            enabled: true,
        }
    }
}

/// A named collection of lore entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Lorebook {
    /// Lorebook identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Entries in the book.
    pub entries: Vec<LoreEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_importance_ordering() {
        assert!(Importance::Critical > Importance::High);
        assert!(Importance::High > Importance::Medium);
        assert!(Importance::Medium > Importance::Low);
    }

    #[test]
    fn test_importance_round_trip() {
        for tier in [
            Importance::Low,
            Importance::Medium,
            Importance::High,
            Importance::Critical,
        ] {
            assert_eq!(tier.as_str().parse::<Importance>().unwrap(), tier);
        }
    }

    #[test]
    fn test_importance_parse_is_lenient_on_case() {
        assert_eq!("Critical".parse::<Importance>().unwrap(), Importance::Critical);
        assert_eq!(" HIGH ".parse::<Importance>().unwrap(), Importance::High);
    }

    #[test]
    fn test_importance_parse_unknown() {
        let err = "urgent".parse::<Importance>().unwrap_err();
        assert_eq!(err, ParseImportanceError("urgent".to_string()));
    }
}
