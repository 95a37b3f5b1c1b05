//! Table-of-contents scraper
//!
//! The documentation site serves its navigation tree as JSON. Every node
//! linking to a `meta_<token>.htm` page is a metadata type candidate; the
//! scraper walks the tree, filters out navigation pages and derives a type
//! name per candidate, keeping the first URL seen for each name.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, REFERER, USER_AGENT};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};
use url::Url;

use crate::catalog::{write_json, NameUrlMapping};
use crate::config::{DocBase, ScrapeConfig};
use crate::error::{Error, Result};

/// Prefix of metadata type page hrefs
pub const HREF_PREFIX: &str = "meta_";

/// Suffix of metadata type page hrefs
pub const HREF_SUFFIX: &str = ".htm";

/// Pages under `meta_` that describe the API rather than a type
pub const SKIP_PATTERNS: &[&str] = &[
    "meta_intro",
    "meta_types_list",
    "meta_metadata",
    "meta_unsupported",
    "meta_coverage",
    "meta_deploy",
    "meta_retrieve",
    "meta_file",
    "meta_crud",
    "meta_result",
    "meta_standardvalueset",
    "meta_quick_start",
    "meta_whats_new",
    "meta_headers",
    "meta_call",
    "meta_session",
    "meta_debugging",
    "meta_allornone",
    "meta_rns",
    "meta_support_policy",
    "meta_quickstart",
    "meta_use_cases",
    "meta_editions",
    "meta_developer_tools",
    "meta_dev_platforms",
    "meta_standards",
    "meta_api_eol",
    "meta_related_resources",
    "meta_user_references",
    "meta_rest_intro",
    "meta_rest_deploy",
    "meta_error_handling",
    "meta_utility_calls",
    "meta_objects_intro",
    "meta_special_behavior",
    "meta_data_cloud_types",
    "meta_field_types",
    "meta_settings",
];

/// Href tokens whose page title is not the type name
pub const KNOWN_NAMES: &[(&str, &str)] = &[
    ("classes", "ApexClass"),
    ("trigger", "ApexTrigger"),
    ("pages", "ApexPage"),
    ("components", "ApexComponent"),
    ("customobject", "CustomObject"),
    ("customfield", "CustomField"),
    ("customapplication", "CustomApplication"),
    ("customtab", "CustomTab"),
    ("customlabel", "CustomLabel"),
    ("custommetadata", "CustomMetadata"),
    ("permissionset", "PermissionSet"),
    ("remotesitesetting", "RemoteSiteSetting"),
    ("emailtemplate", "EmailTemplate"),
    ("staticresource", "StaticResource"),
];

static TYPE_NAME_TEXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").unwrap());

/// Link attributes of a TOC node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnchorAttrs {
    /// Link target, relative to the documentation base
    pub href: Option<String>,
}

/// One node of the navigation tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TocNode {
    /// Link attributes
    pub a_attr: Option<AnchorAttrs>,
    /// Display text
    pub text: Option<String>,
    /// Nested nodes in display order
    pub children: Vec<TocNode>,
}

impl TocNode {
    /// Create a link node
    pub fn link(href: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            a_attr: Some(AnchorAttrs {
                href: Some(href.into()),
            }),
            text: Some(text.into()),
            children: Vec::new(),
        }
    }

    /// Set the children
    pub fn with_children(mut self, children: Vec<TocNode>) -> Self {
        self.children = children;
        self
    }

    /// Link target, if the node has one
    pub fn href(&self) -> Option<&str> {
        self.a_attr.as_ref()?.href.as_deref()
    }

    /// Node without children from a JSON object; mistyped members read as absent
    fn from_object(object: &mut Map<String, Value>) -> Self {
        let a_attr = match object.remove("a_attr") {
            Some(Value::Object(attrs)) => Some(AnchorAttrs {
                href: attrs.get("href").and_then(Value::as_str).map(str::to_string),
            }),
            _ => None,
        };
        let text = match object.remove("text") {
            Some(Value::String(text)) => Some(text),
            _ => None,
        };
        Self {
            a_attr,
            text,
            children: Vec::new(),
        }
    }
}

/// Entries of a `toc` or `children` member: a list, a lone object, or nothing
fn entries(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        _ => Vec::new(),
    }
}

/// A node whose children are still being converted
struct PendingNode {
    node: TocNode,
    rest: std::vec::IntoIter<Value>,
}

/// Convert TOC entries to typed nodes without recursing
///
/// Entries that are not objects are dropped; their siblings and the
/// children of mistyped nodes are kept.
fn toc_nodes(toc: Value) -> Vec<TocNode> {
    let mut roots = Vec::new();
    let mut top_level = entries(toc).into_iter();
    let mut stack: Vec<PendingNode> = Vec::new();

    loop {
        let next = match stack.last_mut() {
            Some(pending) => pending.rest.next(),
            None => top_level.next(),
        };
        match next {
            Some(Value::Object(mut object)) => {
                let children = object.remove("children").map(entries).unwrap_or_default();
                stack.push(PendingNode {
                    node: TocNode::from_object(&mut object),
                    rest: children.into_iter(),
                });
            }
            Some(_) => {}
            None => match stack.pop() {
                Some(done) => match stack.last_mut() {
                    Some(parent) => parent.node.children.push(done.node),
                    None => roots.push(done.node),
                },
                None => break,
            },
        }
    }

    roots
}

/// Parse JSON of any nesting depth
fn parse_json(body: &str) -> Result<Value> {
    let mut deserializer = serde_json::Deserializer::from_str(body);
    deserializer.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut deserializer))?;
    deserializer.end()?;
    Ok(value)
}

/// Parse a TOC response body into its top-level nodes
pub fn parse_toc(body: &str) -> Result<Vec<TocNode>> {
    let mut document = parse_json(body)?;
    let toc = match document.get_mut("toc").map(Value::take) {
        Some(Value::Null) | None => return Err(Error::MissingToc),
        Some(toc) => toc,
    };
    Ok(toc_nodes(toc))
}

/// Check whether an href points at a metadata type page
pub fn is_metadata_href(href: &str) -> bool {
    href.starts_with(HREF_PREFIX) && href.ends_with(HREF_SUFFIX)
}

/// Check whether an href is one of the known navigation pages
pub fn is_skipped(href: &str) -> bool {
    SKIP_PATTERNS.iter().any(|pattern| href.contains(pattern))
}

/// Strip the page prefix and suffix from an href
pub fn href_token(href: &str) -> String {
    href.replace(HREF_PREFIX, "").replace(HREF_SUFFIX, "")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Convert `snake_case` to `PascalCase`
pub fn snake_to_pascal(token: &str) -> String {
    token.split('_').map(capitalize).collect()
}

/// Derive a metadata type name for a TOC link
///
/// Returns `None` when nothing usable is left once the href is stripped.
pub fn derive_type_name(href: &str, text: Option<&str>) -> Option<String> {
    let token = href_token(href);

    if let Some((_, name)) = KNOWN_NAMES.iter().find(|(known, _)| *known == token) {
        return Some((*name).to_string());
    }

    if let Some(text) = text {
        if text.chars().count() > 2 && TYPE_NAME_TEXT.is_match(text) {
            return Some(text.to_string());
        }
    }

    let name = snake_to_pascal(&token);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Walk the tree pre-order and build the name to URL mapping
pub fn collect_mapping(toc: &[TocNode], base: &DocBase) -> NameUrlMapping {
    let mut mapping = NameUrlMapping::new();
    let mut stack: Vec<&TocNode> = toc.iter().rev().collect();

    while let Some(node) = stack.pop() {
        if let Some(href) = node.href() {
            if is_metadata_href(href) && !is_skipped(href) {
                if let Some(name) = derive_type_name(href, node.text.as_deref()) {
                    if !mapping.contains_key(&name) {
                        debug!("Found: {}", name);
                        mapping.insert(name, base.page(href));
                    }
                }
            }
        }
        stack.extend(node.children.iter().rev());
    }

    mapping
}

/// Source of the raw TOC document
pub trait TocSource {
    /// Fetch the TOC response body
    fn fetch_toc(&self) -> Result<String>;

    /// Where the TOC comes from, for progress messages
    fn describe(&self) -> String;
}

/// Fetches the TOC with one blocking HTTP GET
#[derive(Debug, Clone)]
pub struct HttpTocSource {
    client: Client,
    endpoint: Url,
}

impl HttpTocSource {
    /// Build a client with the configured headers and timeout
    pub fn new(config: &ScrapeConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value(&config.user_agent)?);
        headers.insert(ACCEPT, header_value(&config.accept)?);
        headers.insert(REFERER, header_value(&config.referer)?);

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint_url()?,
        })
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| Error::Config(format!("invalid header value '{}': {}", value, e)))
}

impl TocSource for HttpTocSource {
    fn fetch_toc(&self) -> Result<String> {
        let response = self.client.get(self.endpoint.clone()).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: self.endpoint.to_string(),
            });
        }
        let body = response.text()?;
        info!("Fetched API data ({} characters)", body.len());
        Ok(body)
    }

    fn describe(&self) -> String {
        self.endpoint.to_string()
    }
}

/// Fetch, parse and walk the TOC
///
/// An empty mapping is an error: there is nothing worth writing.
pub fn scrape(source: &dyn TocSource, base: &DocBase) -> Result<NameUrlMapping> {
    info!("Reading TOC from {}", source.describe());
    let body = source.fetch_toc()?;
    let toc = parse_toc(&body)?;
    info!("Parsing table of contents ({} top-level nodes)", toc.len());

    let mapping = collect_mapping(&toc, base);
    if mapping.is_empty() {
        return Err(Error::EmptyResult(format!(
            "the TOC from {} has no metadata type pages",
            source.describe()
        )));
    }
    info!("Extracted {} metadata types", mapping.len());
    Ok(mapping)
}

/// Run the scraper end to end and write the mapping
pub fn run(config: &ScrapeConfig) -> Result<NameUrlMapping> {
    config.validate()?;
    let source = HttpTocSource::new(config)?;
    let mapping = scrape(&source, &config.doc_base()?)?;
    write_json(&mapping, &config.output)?;
    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_DOC_BASE_URL;

    struct StaticToc(&'static str);

    impl TocSource for StaticToc {
        fn fetch_toc(&self) -> Result<String> {
            Ok(self.0.to_string())
        }

        fn describe(&self) -> String {
            "static".to_string()
        }
    }

    struct FailingToc;

    impl TocSource for FailingToc {
        fn fetch_toc(&self) -> Result<String> {
            Err(Error::Status {
                status: 500,
                url: "static".to_string(),
            })
        }

        fn describe(&self) -> String {
            "failing".to_string()
        }
    }

    fn base() -> DocBase {
        DocBase::parse(DEFAULT_DOC_BASE_URL).unwrap()
    }

    #[test]
    fn test_is_metadata_href() {
        assert!(is_metadata_href("meta_classes.htm"));
        assert!(!is_metadata_href("meta_classes.html"));
        assert!(!is_metadata_href("classes.htm"));
    }

    #[test]
    fn test_skip_patterns() {
        assert_eq!(SKIP_PATTERNS.len(), 38);
        assert!(is_skipped("meta_types_list.htm"));
        assert!(is_skipped("meta_settings_intro.htm"));
        assert!(!is_skipped("meta_classes.htm"));
    }

    #[test]
    fn test_derive_known_name() {
        assert_eq!(
            derive_type_name("meta_classes.htm", Some("Apex classes")),
            Some("ApexClass".to_string())
        );
        assert_eq!(KNOWN_NAMES.len(), 14);
    }

    #[test]
    fn test_derive_from_text() {
        assert_eq!(
            derive_type_name("meta_flow.htm", Some("Flow")),
            Some("Flow".to_string())
        );
        // Too short or not identifier-like falls through to the token
        assert_eq!(
            derive_type_name("meta_ai_app.htm", Some("AI")),
            Some("AiApp".to_string())
        );
        assert_eq!(
            derive_type_name("meta_sharing_rules.htm", Some("Sharing Rules")),
            Some("SharingRules".to_string())
        );
    }

    #[test]
    fn test_derive_empty_token() {
        assert_eq!(derive_type_name("meta_.htm", None), None);
        assert_eq!(derive_type_name("meta_.htm", Some("")), None);
    }

    #[test]
    fn test_snake_to_pascal() {
        assert_eq!(snake_to_pascal("custom_OBJECT_translation"), "CustomObjectTranslation");
        assert_eq!(snake_to_pascal("a__b"), "AB");
        assert_eq!(snake_to_pascal(""), "");
    }

    #[test]
    fn test_parse_toc_lenient() {
        let toc = parse_toc(
            r#"{"toc": [
                "stray string",
                {"text": "Types", "children": [
                    {"a_attr": {"href": "meta_flow.htm", "id": "x"}, "text": "Flow", "children": null},
                    42
                ]}
            ]}"#,
        )
        .unwrap();

        assert_eq!(toc.len(), 1);
        assert_eq!(toc[0].href(), None);
        assert_eq!(toc[0].children.len(), 1);
        assert_eq!(toc[0].children[0].href(), Some("meta_flow.htm"));
    }

    #[test]
    fn test_parse_toc_missing() {
        assert!(matches!(parse_toc(r#"{"title": "x"}"#), Err(Error::MissingToc)));
        assert!(matches!(parse_toc(r#"{"toc": null}"#), Err(Error::MissingToc)));
        assert!(matches!(parse_toc("[1, 2]"), Err(Error::MissingToc)));
        assert!(matches!(parse_toc("<html>"), Err(Error::Json(_))));
    }

    #[test]
    fn test_parse_toc_deeply_nested_body() {
        let depth = 1000;
        let mut body = String::from(r#"{"toc": ["#);
        for _ in 0..depth {
            body.push_str(r#"{"text": "Group", "children": ["#);
        }
        body.push_str(r#"{"a_attr": {"href": "meta_deep_type.htm"}, "text": "DeepType"}"#);
        for _ in 0..depth {
            body.push_str("]}");
        }
        body.push_str("]}");

        let toc = parse_toc(&body).unwrap();
        let mapping = collect_mapping(&toc, &base());
        assert_eq!(
            mapping["DeepType"],
            format!("{}meta_deep_type.htm", DEFAULT_DOC_BASE_URL)
        );
    }

    #[test]
    fn test_parse_toc_mistyped_members_keep_children() {
        let toc = parse_toc(
            r#"{"toc": [
                {"a_attr": "x", "text": 5, "children": [
                    {"a_attr": {"href": "meta_flow.htm"}, "text": "Flow"}
                ]},
                {"a_attr": {"href": 7}, "text": ["Layout"], "children": {
                    "a_attr": {"href": "meta_layout.htm"}, "text": "Layout"
                }}
            ]}"#,
        )
        .unwrap();

        assert_eq!(toc.len(), 2);
        assert_eq!(toc[0].a_attr, None);
        assert_eq!(toc[0].text, None);
        assert_eq!(toc[1].href(), None);

        let mapping = collect_mapping(&toc, &base());
        let names: Vec<&str> = mapping.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Flow", "Layout"]);
    }

    #[test]
    fn test_collect_mapping_first_wins_in_pre_order() {
        let toc = vec![
            TocNode::default().with_children(vec![TocNode::link(
                "meta_flow.htm",
                "Flow",
            )]),
            TocNode::link("meta_flow_alt.htm", "Flow"),
        ];

        let mapping = collect_mapping(&toc, &base());
        assert_eq!(mapping.len(), 1);
        assert_eq!(
            mapping["Flow"],
            format!("{}meta_flow.htm", DEFAULT_DOC_BASE_URL)
        );
    }

    #[test]
    fn test_collect_mapping_parent_before_children() {
        let toc = vec![TocNode::link("meta_workflow.htm", "Workflow").with_children(vec![
            TocNode::link("meta_workflow_child.htm", "Workflow"),
            TocNode::link("meta_types_list.htm", "Types"),
            TocNode::link("index.htm", "Index"),
        ])];

        let mapping = collect_mapping(&toc, &base());
        assert_eq!(mapping.len(), 1);
        assert!(mapping["Workflow"].ends_with("/meta_workflow.htm"));
    }

    #[test]
    fn test_collect_mapping_deep_tree() {
        let mut node = TocNode::link("meta_deep_type.htm", "DeepType");
        for _ in 0..200 {
            node = TocNode::default().with_children(vec![node]);
        }
        let mapping = collect_mapping(std::slice::from_ref(&node), &base());
        assert!(mapping.contains_key("DeepType"));
    }

    #[test]
    fn test_scrape_with_static_source() {
        let source = StaticToc(
            r#"{"toc": [
                {"a_attr": {"href": "meta_intro.htm"}, "text": "Introduction"},
                {"a_attr": {"href": "meta_classes.htm"}, "text": "ApexClass"},
                {"a_attr": {"href": "meta_custom_site.htm"}, "text": "Custom Site"}
            ]}"#,
        );

        let mapping = scrape(&source, &base()).unwrap();
        let names: Vec<&str> = mapping.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["ApexClass", "CustomSite"]);
    }

    #[test]
    fn test_scrape_empty_is_error() {
        let source = StaticToc(r#"{"toc": [{"a_attr": {"href": "meta_intro.htm"}}]}"#);
        assert!(matches!(scrape(&source, &base()), Err(Error::EmptyResult(_))));
    }

    #[test]
    fn test_scrape_transport_error() {
        assert!(matches!(
            scrape(&FailingToc, &base()),
            Err(Error::Status { status: 500, .. })
        ));
    }
}
