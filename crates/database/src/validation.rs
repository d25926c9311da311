//! Input validation for stored records.

use std::fmt;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Empty value where one is required.
    Empty(String),
    /// Value too long.
    TooLong {
        field: String,
        max: usize,
        actual: usize,
    },
    /// Too many items in a list field.
    TooMany {
        field: String,
        max: usize,
        actual: usize,
    },
    /// Unknown importance tier.
    InvalidImportance(String),
    /// Unknown message role.
    InvalidRole(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::TooMany { field, max, actual } => {
                write!(f, "{} has too many items ({}, max {})", field, actual, max)
            }
            ValidationError::InvalidImportance(value) => {
                write!(f, "unknown importance tier: {}", value)
            }
            ValidationError::InvalidRole(value) => write!(f, "unknown message role: {}", value),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for display names.
pub const MAX_NAME_LENGTH: usize = 120;

/// Maximum number of keywords per lore entry.
pub const MAX_KEYWORDS: usize = 50;

/// Maximum allowed length for a single keyword.
pub const MAX_KEYWORD_LENGTH: usize = 80;

/// Maximum allowed length for free-text fields (descriptions, lore content).
pub const MAX_TEXT_LENGTH: usize = 20_000;

/// Valid importance tiers, matching the lorebook crate.
const IMPORTANCE_TIERS: [&str; 4] = ["low", "medium", "high", "critical"];

/// Valid chat message roles.
const ROLES: [&str; 3] = ["system", "user", "assistant"];

/// Validate a display name (characters, lorebooks, lore entries).
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Empty("name".to_string()));
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LENGTH,
            actual: name.len(),
        });
    }

    Ok(())
}

/// Validate a free-text field against the size cap.
pub fn validate_text(field: &'static str, text: &str) -> Result<(), ValidationError> {
    if text.len() > MAX_TEXT_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LENGTH,
            actual: text.len(),
        });
    }

    Ok(())
}

/// Validate a lore entry keyword list.
pub fn validate_keywords(keywords: &[String]) -> Result<(), ValidationError> {
    if keywords.len() > MAX_KEYWORDS {
        return Err(ValidationError::TooMany {
            field: "keywords".to_string(),
            max: MAX_KEYWORDS,
            actual: keywords.len(),
        });
    }

    for keyword in keywords {
        if keyword.len() > MAX_KEYWORD_LENGTH {
            return Err(ValidationError::TooLong {
                field: "keyword".to_string(),
                max: MAX_KEYWORD_LENGTH,
                actual: keyword.len(),
            });
        }
    }

    Ok(())
}

/// Validate an importance tier string.
pub fn validate_importance(importance: &str) -> Result<(), ValidationError> {
    if IMPORTANCE_TIERS.contains(&importance) {
        Ok(())
    } else {
        Err(ValidationError::InvalidImportance(importance.to_string()))
    }
}

/// Validate a chat message role string.
pub fn validate_role(role: &str) -> Result<(), ValidationError> {
    if ROLES.contains(&role) {
        Ok(())
    } else {
        Err(ValidationError::InvalidRole(role.to_string()))
    }
}
