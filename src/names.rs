//! XSD name sanitization
//!
//! Type names come from page titles and field names from table cells, so
//! neither is guaranteed to be a usable XML name. [`sanitize_xsd_name`] turns
//! any string into one.

use crate::text::remove_zero_width;
use once_cell::sync::Lazy;
use regex::Regex;

/// Prefix added when a name does not start with a letter or underscore
pub const NAME_PREFIX: &str = "field_";

/// Substitute for names that sanitize to nothing
pub const PLACEHOLDER_NAME: &str = "unknown_field";

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]").unwrap());

static UNDERSCORE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").unwrap());

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[A-Za-z]|_[A-Za-z0-9])(?:[A-Za-z0-9]|_[A-Za-z0-9])*$").unwrap());

/// Check if a string is already in sanitized form
///
/// Sanitized names start with a letter or underscore, use only ASCII word
/// characters, and have no runs of underscores and no trailing underscore.
pub fn is_xsd_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Clean a name to be valid for XSD element and type names
///
/// Never fails and never returns an empty string. Applying it twice gives the
/// same result as applying it once.
pub fn sanitize_xsd_name(name: &str) -> String {
    if is_xsd_identifier(name) {
        return name.to_string();
    }
    let visible = remove_zero_width(name);
    let replaced = NON_WORD.replace_all(&visible, "_");

    let first = replaced.chars().next();
    let prefixed = match first {
        Some(c) if !c.is_ascii_alphabetic() && c != '_' => format!("{}{}", NAME_PREFIX, replaced),
        _ => replaced.into_owned(),
    };

    let collapsed = UNDERSCORE_RUN.replace_all(&prefixed, "_");
    let trimmed = collapsed.trim_end_matches('_');

    if trimmed.is_empty() {
        PLACEHOLDER_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}
