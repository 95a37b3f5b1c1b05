//! Text cleaning and escaping helpers
//!
//! Used on both sides of the pipeline: the extractor normalizes text pulled
//! out of reference pages, the generator escapes it back into XML.

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// Characters outside the XML 1.0 Char production that can appear in scraped text
static INVALID_XML_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").unwrap());

static ZERO_WIDTH_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\u{200B}-\u{200D}\u{FEFF}]").unwrap());

/// Collapse every whitespace run to a single space and trim
pub fn clean_text(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}

/// Remove zero-width spaces, joiners and byte-order marks
pub fn remove_zero_width(text: &str) -> String {
    ZERO_WIDTH_CHARS.replace_all(text, "").into_owned()
}

/// Remove control characters that are not allowed in XML text
pub fn strip_invalid_xml_chars(text: &str) -> String {
    INVALID_XML_CHARS.replace_all(text, "").into_owned()
}

/// Escape text for use in XML character data or attribute values
///
/// Disallowed control characters and zero-width characters are removed, then
/// `&`, `<`, `>`, `"` and `'` are replaced by their predefined entities.
pub fn escape_xml(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let stripped = strip_invalid_xml_chars(&remove_zero_width(text));
    quick_xml::escape::escape(stripped.as_str()).into_owned()
}
