//! Error types for metadata-catalog
//!
//! This module defines all error types used throughout the library.
//! Each tool decides for itself which of these are fatal: the scraper and
//! the generator abort on the first one, the extractor records them per file.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using metadata-catalog Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for metadata-catalog operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// JSON encoding/decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error (connection, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("unexpected HTTP status {status} from {url}")]
    Status {
        /// Status code returned by the server
        status: u16,
        /// Requested URL
        url: String,
    },

    /// TOC response did not contain a `toc` field
    #[error("no TOC structure found in API response")]
    MissingToc,

    /// A run produced nothing to write
    #[error("no metadata types found: {0}")]
    EmptyResult(String),

    /// Invalid or missing configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Missing input file or directory
    #[error("input not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// URL parsing error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let err = Error::Status {
            status: 503,
            url: "https://example.com/toc".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("503"));
        assert!(msg.contains("https://example.com/toc"));
    }

    #[test]
    fn test_missing_input_display() {
        let err = Error::MissingInput(PathBuf::from("/nowhere/map.json"));
        assert_eq!(format!("{}", err), "input not found: /nowhere/map.json");
    }

    #[test]
    fn test_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
