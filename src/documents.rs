//! XML document tree for reference pages
//!
//! This module parses a reference document into an owned element tree that
//! keeps mixed content in document order, so text can be reassembled across
//! inline markup such as `<codeph>` or `<parmname>`.
//!
//! Parsing and every traversal helper are iterative; deeply nested documents
//! are bounded by [`Limits::max_xml_depth`] instead of the call stack.

use crate::error::{Error, Result};
use crate::limits::Limits;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// A child of an element: either a nested element or a run of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Nested element
    Element(Element),
    /// Character data (text or CDATA), already unescaped
    Text(String),
}

/// XML Element in the document tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Local name of the element (prefix stripped)
    pub name: String,
    /// Attributes as (local name, value) in source order
    pub attributes: Vec<(String, String)>,
    /// Child nodes in document order
    pub children: Vec<Node>,
}

impl Element {
    /// Create a new element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &str {
        &self.name
    }

    /// Get an attribute value by local name
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Iterate over direct child elements
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Find direct child elements by local name
    pub fn find_children(&self, local_name: &str) -> Vec<&Element> {
        self.elements()
            .filter(|e| e.local_name() == local_name)
            .collect()
    }

    /// Iterate over this element and all its descendants in document order
    pub fn iter(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// First element named `local_name` in document order, this one included
    pub fn find_first(&self, local_name: &str) -> Option<&Element> {
        self.iter().find(|e| e.local_name() == local_name)
    }

    /// All elements named `local_name` in document order, this one included
    pub fn find_all(&self, local_name: &str) -> Vec<&Element> {
        self.iter().filter(|e| e.local_name() == local_name).collect()
    }

    /// Concatenate all text below this element in document order
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![self.children.iter()];
        while let Some(top) = stack.last_mut() {
            match top.next() {
                Some(Node::Text(text)) => out.push_str(text),
                Some(Node::Element(child)) => stack.push(child.children.iter()),
                None => {
                    stack.pop();
                }
            }
        }
        out
    }
}

/// Pre-order iterator over an element subtree
#[derive(Debug)]
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        // Push in reverse so the first child is visited next.
        self.stack.extend(
            current
                .children
                .iter()
                .rev()
                .filter_map(|node| match node {
                    Node::Element(e) => Some(e),
                    Node::Text(_) => None,
                }),
        );
        Some(current)
    }
}

/// XML Document representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Root element of the document
    pub root: Element,
}

impl Document {
    /// Parse an XML document from a string with default limits
    pub fn from_string(xml: &str) -> Result<Self> {
        Self::parse(xml, &Limits::default())
    }

    /// Parse an XML document from a string
    pub fn parse(xml: &str, limits: &Limits) -> Result<Self> {
        limits.check_xml_size(xml.len())?;

        let mut reader = Reader::from_str(xml);
        let mut element_stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    Self::ensure_single_root(&root, &reader)?;
                    element_stack.push(Self::parse_element(&e)?);
                    limits.check_xml_depth(element_stack.len())?;
                }
                Ok(Event::End(_)) => {
                    if let Some(current) = element_stack.pop() {
                        match element_stack.last_mut() {
                            Some(parent) => parent.children.push(Node::Element(current)),
                            None => root = Some(current),
                        }
                    }
                }
                Ok(Event::Empty(e)) => {
                    Self::ensure_single_root(&root, &reader)?;
                    let element = Self::parse_element(&e)?;
                    match element_stack.last_mut() {
                        Some(parent) => parent.children.push(Node::Element(element)),
                        None => root = Some(element),
                    }
                }
                Ok(Event::Text(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        let text = e
                            .unescape()
                            .map_err(|e| Error::Xml(format!("Failed to unescape text: {}", e)))?;
                        Self::push_text(current, &text);
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        let raw = e.into_inner();
                        let text = std::str::from_utf8(&raw)
                            .map_err(|e| Error::Xml(format!("Invalid CDATA: {}", e)))?;
                        Self::push_text(current, text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "Error parsing XML at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {} // Declarations, DOCTYPE, comments, processing instructions
            }
        }

        if let Some(open) = element_stack.last() {
            return Err(Error::Xml(format!(
                "Unexpected end of document inside <{}>",
                open.name
            )));
        }

        root.map(|root| Document { root })
            .ok_or_else(|| Error::Xml("Document has no root element".to_string()))
    }

    fn ensure_single_root(root: &Option<Element>, reader: &Reader<&[u8]>) -> Result<()> {
        if root.is_some() {
            return Err(Error::Xml(format!(
                "Junk after document element at position {}",
                reader.buffer_position()
            )));
        }
        Ok(())
    }

    fn push_text(element: &mut Element, text: &str) {
        if text.is_empty() {
            return;
        }
        // Adjacent runs (text next to CDATA) merge into one node.
        if let Some(Node::Text(last)) = element.children.last_mut() {
            last.push_str(text);
        } else {
            element.children.push(Node::Text(text.to_string()));
        }
    }

    /// Parse element from BytesStart event
    fn parse_element(start: &BytesStart) -> Result<Element> {
        let local = start.local_name();
        let name = std::str::from_utf8(local.as_ref())
            .map_err(|e| Error::Xml(format!("Invalid element name: {}", e)))?;

        let mut element = Element::new(name);

        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| Error::Xml(format!("Failed to parse attribute: {}", e)))?;

            let key = attr.key.local_name();
            let attr_name = std::str::from_utf8(key.as_ref())
                .map_err(|e| Error::Xml(format!("Invalid attribute name: {}", e)))?;

            // Namespace declarations are not attributes of interest here
            if attr.key.as_namespace_binding().is_some() {
                continue;
            }

            let attr_value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(format!("Failed to unescape attribute value: {}", e)))?
                .to_string();

            element.attributes.push((attr_name.to_string(), attr_value));
        }

        Ok(element)
    }

    /// Get the root element
    pub fn root(&self) -> &Element {
        &self.root
    }
}
