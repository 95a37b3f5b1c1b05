//! # metadata-catalog
//!
//! Build a catalog of Metadata API types from their reference documentation
//! and turn it into an XSD for editor hover help.
//!
//! The crate is three batch tools sharing file artifacts:
//!
//! - [`scraper`] reads the documentation table of contents and maps type
//!   names to reference page URLs.
//! - [`extractor`] reads a directory of XML reference pages into a
//!   [`MetadataCatalog`] of descriptions and field tables.
//! - [`generator`] writes that catalog as an XSD.
//!
//! ## Example
//!
//! ```rust,no_run
//! use metadata_catalog::config::{ExtractConfig, GenerateConfig};
//! use metadata_catalog::{extractor, generator};
//!
//! let report = extractor::run(&ExtractConfig::new("api_meta/xml").with_output("map.json"))?;
//! println!("{} types", report.catalog.len());
//!
//! generator::run(&GenerateConfig::new("map.json").with_output("metadata.xsd"))?;
//! # Ok::<(), metadata_catalog::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;
pub mod config;

// Shared model and helpers
pub mod catalog;
pub mod names;
pub mod text;
pub mod xsd_types;
pub mod documents;

// Tools
pub mod scraper;
pub mod extractor;
pub mod generator;

// Re-exports for convenience
pub use catalog::{FieldEntry, MetadataCatalog, MetadataTypeEntry, NameUrlMapping};
pub use error::{Error, Result};

/// Version of the metadata-catalog library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
