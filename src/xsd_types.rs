//! Mapping of documentation type labels to XSD built-in types
//!
//! Field types in the reference pages are free text ("string", "DateTime",
//! "ProfileFieldLevelSecurity[]", ...). They are matched against an ordered
//! table of rules; the first rule whose predicate holds decides the type.

use std::fmt;

/// XSD built-in types the generator emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XsdType {
    /// xsd:string
    String,
    /// xsd:boolean
    Boolean,
    /// xsd:int
    Int,
    /// xsd:double
    Double,
    /// xsd:date
    Date,
    /// xsd:dateTime
    DateTime,
    /// xsd:base64Binary
    Base64Binary,
    /// xsd:anyURI
    AnyUri,
}

impl XsdType {
    /// Prefixed name as written in the schema
    pub fn as_str(&self) -> &'static str {
        match self {
            XsdType::String => "xsd:string",
            XsdType::Boolean => "xsd:boolean",
            XsdType::Int => "xsd:int",
            XsdType::Double => "xsd:double",
            XsdType::Date => "xsd:date",
            XsdType::DateTime => "xsd:dateTime",
            XsdType::Base64Binary => "xsd:base64Binary",
            XsdType::AnyUri => "xsd:anyURI",
        }
    }
}

impl fmt::Display for XsdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Test applied to a normalized (trimmed, lower-cased) type label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelPredicate {
    /// Label contains at least one of the needles
    ContainsAny(&'static [&'static str]),
    /// Label contains every needle
    ContainsAll(&'static [&'static str]),
    /// Label ends with the suffix
    EndsWith(&'static str),
}

impl LabelPredicate {
    /// Evaluate against a normalized label
    pub fn matches(&self, label: &str) -> bool {
        match self {
            LabelPredicate::ContainsAny(needles) => needles.iter().any(|n| label.contains(n)),
            LabelPredicate::ContainsAll(needles) => needles.iter().all(|n| label.contains(n)),
            LabelPredicate::EndsWith(suffix) => label.ends_with(suffix),
        }
    }
}

/// Ordered rule table; the compound date+time rule must precede plain date
pub const TYPE_RULES: &[(LabelPredicate, XsdType)] = &[
    (LabelPredicate::ContainsAny(&["string", "text"]), XsdType::String),
    (LabelPredicate::ContainsAny(&["boolean"]), XsdType::Boolean),
    (LabelPredicate::ContainsAny(&["int", "integer"]), XsdType::Int),
    (
        LabelPredicate::ContainsAny(&["double", "decimal", "number"]),
        XsdType::Double,
    ),
    (LabelPredicate::ContainsAll(&["date", "time"]), XsdType::DateTime),
    (LabelPredicate::ContainsAny(&["date"]), XsdType::Date),
    (LabelPredicate::ContainsAny(&["base64"]), XsdType::Base64Binary),
    (
        LabelPredicate::ContainsAny(&[
            "reference",
            "picklist",
            "enumeration",
            "multipicklist",
            "email",
            "phone",
        ]),
        XsdType::String,
    ),
    (LabelPredicate::ContainsAny(&["url"]), XsdType::AnyUri),
    (LabelPredicate::EndsWith("[]"), XsdType::String),
];

/// Type used when no rule matches
pub const DEFAULT_TYPE: XsdType = XsdType::String;

/// Map a documentation type label to an XSD built-in type
pub fn map_field_type(label: &str) -> XsdType {
    let normalized = label.trim().to_lowercase();
    TYPE_RULES
        .iter()
        .find(|(predicate, _)| predicate.matches(&normalized))
        .map(|(_, xsd_type)| *xsd_type)
        .unwrap_or(DEFAULT_TYPE)
}
