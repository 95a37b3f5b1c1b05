//! Limits for reading reference documents
//!
//! The extractor parses every file in a corpus it does not control, so each
//! document is checked against a size and nesting budget before and while it
//! is parsed. Exceeding either makes that one file fail.

use crate::error::{Error, Result};

/// Parsing limits for a single reference document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum element nesting depth
    pub max_xml_depth: usize,

    /// Maximum XML file size in bytes
    pub max_xml_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_xml_depth: 1000,
            max_xml_size: 100 * 1024 * 1024, // 100 MB
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum nesting depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_xml_depth = depth;
        self
    }

    /// Set the maximum file size
    pub fn with_max_size(mut self, size: usize) -> Self {
        self.max_xml_size = size;
        self
    }

    /// Check if XML depth is within limits
    pub fn check_xml_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_xml_depth {
            Err(Error::LimitExceeded(format!(
                "XML depth {} exceeds maximum {}",
                depth, self.max_xml_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if XML size is within limits
    pub fn check_xml_size(&self, size: usize) -> Result<()> {
        if size > self.max_xml_size {
            Err(Error::LimitExceeded(format!(
                "XML size {} bytes exceeds maximum {} bytes",
                size, self.max_xml_size
            )))
        } else {
            Ok(())
        }
    }
}
