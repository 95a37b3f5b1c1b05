//! Metadata type catalog model
//!
//! The catalog is the artifact shared by the extractor (which writes it) and
//! the generator (which reads it). Its JSON form is a map keyed by type name:
//!
//! ```json
//! {
//!   "ApexClass": {
//!     "fields": [
//!       { "Description": "...", "Field Name": "apiVersion", "Field Type": "double" }
//!     ],
//!     "short_description": "Represents an Apex class.",
//!     "url": "https://developer.salesforce.com/docs/.../meta_classes.htm"
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// One row of a field table
///
/// Members are declared in key order so serialized objects come out sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEntry {
    /// Field description
    #[serde(rename = "Description", default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Field name as written in the documentation
    #[serde(rename = "Field Name", default, deserialize_with = "null_as_default")]
    pub field_name: String,
    /// Free-text type label
    #[serde(rename = "Field Type", default, deserialize_with = "null_as_default")]
    pub field_type: String,
}

impl FieldEntry {
    /// Create a new field entry
    pub fn new(
        field_name: impl Into<String>,
        field_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            field_type: field_type.into(),
            description: description.into(),
        }
    }
}

/// Description of one metadata type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataTypeEntry {
    /// Fields in source order
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: Vec<FieldEntry>,
    /// Plain-text summary
    #[serde(default, deserialize_with = "null_as_default")]
    pub short_description: String,
    /// Documentation page
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
}

impl MetadataTypeEntry {
    /// Create an entry without fields
    pub fn new(short_description: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            fields: Vec::new(),
            short_description: short_description.into(),
            url: url.into(),
        }
    }

    /// Set the fields
    pub fn with_fields(mut self, fields: Vec<FieldEntry>) -> Self {
        self.fields = fields;
        self
    }
}

// Hand-edited catalogs may carry `null` where a member is empty.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Type name to entry, sorted by name
pub type MetadataCatalog = BTreeMap<String, MetadataTypeEntry>;

/// Type name to documentation URL, sorted by name
pub type NameUrlMapping = BTreeMap<String, String>;

/// Serialize a sorted map as 2-space indented JSON
pub fn to_json_string<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Write a sorted map to a JSON file
pub fn write_json<T: Serialize>(value: &T, path: impl AsRef<Path>) -> Result<()> {
    let json = to_json_string(value)?;
    fs::write(path.as_ref(), json)?;
    Ok(())
}

/// Load a catalog from a JSON file
pub fn read_catalog(path: impl AsRef<Path>) -> Result<MetadataCatalog> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::MissingInput(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    parse_catalog(&content)
}

/// Parse a catalog from JSON text
pub fn parse_catalog(json: &str) -> Result<MetadataCatalog> {
    Ok(serde_json::from_str(json)?)
}
