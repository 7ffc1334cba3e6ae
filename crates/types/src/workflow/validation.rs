//! Identifier validation shared across workflow consumers.
//!
//! Step and workflow identifiers are embedded in expressions such as
//! `$steps.<stepId>.outputs.<name>`, so they are restricted to the character set
//! the expression scanner treats as part of an identifier.

use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_\-]+$").expect("valid identifier pattern"));

/// Returns true when `character` may appear inside a step or workflow identifier.
pub fn is_identifier_char(character: char) -> bool {
    character.is_ascii_alphanumeric() || character == '_' || character == '-'
}

/// Validate a candidate step or workflow identifier.
pub fn validate_identifier(candidate: &str) -> Result<(), String> {
    if candidate.is_empty() {
        return Err("identifier must not be empty".to_string());
    }
    if !IDENTIFIER_PATTERN.is_match(candidate) {
        return Err(format!(
            "identifier '{}' may only contain letters, numbers, underscores, or hyphens",
            candidate
        ));
    }
    Ok(())
}
