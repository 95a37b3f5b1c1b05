//! Run configuration for the three tools
//!
//! Every path and URL a tool touches is an explicit parameter. Each config
//! has defaults matching the documentation site and a `validate` that fails
//! before any work when an input is missing or a URL does not parse.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::limits::Limits;

/// Endpoint serving the documentation table of contents as JSON
pub const DEFAULT_TOC_ENDPOINT: &str =
    "https://developer.salesforce.com/docs/get_document/atlas.en-us.api_meta.meta";

/// Directory holding the per-type reference pages
pub const DEFAULT_DOC_BASE_URL: &str =
    "https://developer.salesforce.com/docs/atlas.en-us.api_meta.meta/api_meta/";

/// Browser-like user agent sent with the TOC request
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Accept header sent with the TOC request
pub const DEFAULT_ACCEPT: &str = "application/json, text/plain, */*";

/// Referer sent with the TOC request
pub const DEFAULT_REFERER: &str =
    "https://developer.salesforce.com/docs/atlas.en-us.api_meta.meta/api_meta/meta_types_list.htm";

/// Default scraper output
pub const DEFAULT_MAPPING_OUTPUT: &str = "metadata_types_mapping.json";

/// Default extractor output
pub const DEFAULT_CATALOG_OUTPUT: &str = "metadata_types_map.json";

/// Default generator output
pub const DEFAULT_XSD_OUTPUT: &str = "salesforce_metadata_api_clean.xsd";

/// Extension of reference pages
pub const DEFAULT_EXTENSION: &str = "xml";

/// Base URL that reference page names are appended to
///
/// The base is parsed once to reject malformed URLs; page URLs are then the
/// normalized base text followed by the page name, with no resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocBase(String);

impl DocBase {
    /// Parse a base URL; a missing trailing slash is added
    pub fn parse(base: &str) -> Result<Self> {
        let mut url = Url::parse(base)?;
        if url.cannot_be_a_base() {
            return Err(Error::Config(format!("'{}' cannot be used as a base URL", base)));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(Self(url.into()))
    }

    /// Full URL of a page below the base
    pub fn page(&self, page: &str) -> String {
        format!("{}{}", self.0, page)
    }
}

/// Configuration for the TOC scraper
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// TOC endpoint
    pub endpoint: String,
    /// Base URL for resolving TOC hrefs
    pub base_url: String,
    /// Output JSON file
    pub output: PathBuf,
    /// Request timeout
    pub timeout: Duration,
    /// User-Agent header
    pub user_agent: String,
    /// Accept header
    pub accept: String,
    /// Referer header
    pub referer: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_TOC_ENDPOINT.to_string(),
            base_url: DEFAULT_DOC_BASE_URL.to_string(),
            output: PathBuf::from(DEFAULT_MAPPING_OUTPUT),
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
            referer: DEFAULT_REFERER.to_string(),
        }
    }
}

impl ScrapeConfig {
    /// Create a new scraper configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the TOC endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the documentation base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the output file
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Parsed endpoint URL
    pub fn endpoint_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.endpoint)?)
    }

    /// Parsed base URL
    pub fn doc_base(&self) -> Result<DocBase> {
        DocBase::parse(&self.base_url)
    }

    /// Check the configuration before running
    pub fn validate(&self) -> Result<()> {
        self.endpoint_url()?;
        self.doc_base()?;
        if self.timeout.is_zero() {
            return Err(Error::Config("timeout must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Configuration for the XML catalog extractor
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Directory of reference pages
    pub input_dir: PathBuf,
    /// Output JSON file
    pub output: PathBuf,
    /// File extension to pick up, without the dot
    pub extension: String,
    /// Base URL for reference page links
    pub base_url: String,
    /// Per-document parsing limits
    pub limits: Limits,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output: PathBuf::from(DEFAULT_CATALOG_OUTPUT),
            extension: DEFAULT_EXTENSION.to_string(),
            base_url: DEFAULT_DOC_BASE_URL.to_string(),
            limits: Limits::default(),
        }
    }
}

impl ExtractConfig {
    /// Create a new extractor configuration for a directory
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            ..Default::default()
        }
    }

    /// Set the output file
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    /// Set the file extension
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    /// Set the documentation base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the parsing limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Parsed base URL
    pub fn doc_base(&self) -> Result<DocBase> {
        DocBase::parse(&self.base_url)
    }

    /// Check the configuration before running
    pub fn validate(&self) -> Result<()> {
        if !self.input_dir.is_dir() {
            return Err(Error::MissingInput(self.input_dir.clone()));
        }
        if self.extension.is_empty() {
            return Err(Error::Config("file extension must not be empty".to_string()));
        }
        self.doc_base()?;
        Ok(())
    }
}

/// Configuration for the XSD generator
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Input catalog JSON
    pub input: PathBuf,
    /// Output XSD file
    pub output: PathBuf,
}

impl GenerateConfig {
    /// Create a new generator configuration
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: PathBuf::from(DEFAULT_XSD_OUTPUT),
        }
    }

    /// Set the output file
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    /// Check the configuration before running
    pub fn validate(&self) -> Result<()> {
        if !self.input.is_file() {
            return Err(Error::MissingInput(self.input.clone()));
        }
        Ok(())
    }
}
