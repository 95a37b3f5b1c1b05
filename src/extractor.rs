//! Catalog extraction from XML reference pages
//!
//! Each reference page describes one metadata type:
//!
//! ```xml
//! <reference id="meta_foo">
//!   <title>Foo</title>
//!   <shortdesc>Represents a foo.</shortdesc>
//!   <refbody>
//!     <table>
//!       <tgroup cols="3">
//!         <thead><row><entry>Field Name</entry><entry>Field Type</entry><entry>Description</entry></row></thead>
//!         <tbody><row><entry><parmname>bar</parmname></entry><entry>string</entry><entry>A bar.</entry></row></tbody>
//!       </tgroup>
//!     </table>
//!   </refbody>
//! </reference>
//! ```
//!
//! A page contributes at most one catalog entry, keyed by its title. A page
//! that cannot be read or parsed is recorded in the [`ExtractReport`] and the
//! run moves on to the next file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::catalog::{write_json, FieldEntry, MetadataCatalog, MetadataTypeEntry};
use crate::config::{DocBase, ExtractConfig};
use crate::documents::{Document, Element};
use crate::error::Result;
use crate::limits::Limits;
use crate::text::clean_text;

/// Root element of pages that link back to the documentation site
pub const REFERENCE_ROOT: &str = "reference";

/// Column headers of a field table, normalized
const FIELD_NAME_HEADER: &str = "fieldname";
const FIELD_TYPE_HEADER: &str = "fieldtype";
const DESCRIPTION_HEADER: &str = "description";

/// A file that contributed nothing because of an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    /// File that failed
    pub path: PathBuf,
    /// Error message
    pub error: String,
}

/// A title seen in more than one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateTitle {
    /// Shared title
    pub title: String,
    /// File whose entry was replaced
    pub replaced: PathBuf,
    /// File whose entry was kept
    pub kept: PathBuf,
}

/// Outcome of extracting a directory
#[derive(Debug, Clone, Default)]
pub struct ExtractReport {
    /// Extracted entries keyed by title
    pub catalog: MetadataCatalog,
    /// Number of matching files examined
    pub files_scanned: usize,
    /// Files that failed to read or parse
    pub failures: Vec<FileFailure>,
    /// Files without a usable title
    pub untitled: Vec<PathBuf>,
    /// Titles that appeared more than once; the later file wins
    pub duplicates: Vec<DuplicateTitle>,
}

impl ExtractReport {
    /// Total number of extracted fields across all entries
    pub fn field_count(&self) -> usize {
        self.catalog.values().map(|entry| entry.fields.len()).sum()
    }
}

/// Cleaned text of the first element named `name`, or empty
fn first_text(root: &Element, name: &str) -> String {
    root.find_first(name)
        .map(|e| clean_text(&e.text_content()))
        .unwrap_or_default()
}

fn cell_texts(row: &Element) -> Vec<String> {
    row.find_children("entry")
        .iter()
        .map(|cell| clean_text(&cell.text_content()))
        .collect()
}

fn normalize_header(text: &str) -> String {
    text.replace(' ', "").to_lowercase()
}

/// Check whether a header row names the field table columns
pub fn is_field_header(cells: &[String]) -> bool {
    match cells {
        [name, ty, desc, ..] => {
            normalize_header(name) == FIELD_NAME_HEADER
                && normalize_header(ty) == FIELD_TYPE_HEADER
                && normalize_header(desc).contains(DESCRIPTION_HEADER)
        }
        _ => false,
    }
}

/// Header cells of a table: the entries of the first row of its `thead`
fn header_cells(table: &Element) -> Option<Vec<String>> {
    let thead = table.find_first("thead")?;
    let row = thead.find_children("row").into_iter().next()?;
    Some(cell_texts(row))
}

/// Check whether a table is a field table
pub fn is_field_table(table: &Element) -> bool {
    header_cells(table).is_some_and(|cells| is_field_header(&cells))
}

fn field_from_row(row: &Element) -> Option<FieldEntry> {
    let cells = row.find_children("entry");
    let [name_cell, type_cell, desc_cell, ..] = cells.as_slice() else {
        return None;
    };

    let name = match name_cell.find_first("parmname") {
        Some(parm) => clean_text(&parm.text_content()),
        None => clean_text(&name_cell.text_content()),
    };
    let field_type = clean_text(&type_cell.text_content());
    if name.is_empty() || field_type.is_empty() {
        return None;
    }

    Some(FieldEntry::new(
        name,
        field_type,
        clean_text(&desc_cell.text_content()),
    ))
}

/// Fields of one table, empty unless the table is a field table
pub fn table_fields(table: &Element) -> Vec<FieldEntry> {
    if !is_field_table(table) {
        return Vec::new();
    }
    table
        .find_all("tbody")
        .into_iter()
        .flat_map(|tbody| tbody.find_children("row"))
        .filter_map(field_from_row)
        .collect()
}

/// Fields of every field table in the page, in document order
pub fn extract_fields(root: &Element) -> Vec<FieldEntry> {
    root.find_all("table")
        .into_iter()
        .flat_map(table_fields)
        .collect()
}

/// Documentation link for a page, or empty when the page has none
pub fn reference_url(root: &Element, base: &DocBase) -> String {
    if root.local_name() != REFERENCE_ROOT {
        return String::new();
    }
    match root.get_attribute("id") {
        Some(id) if !id.is_empty() => base.page(&format!("{}.htm", id)),
        _ => String::new(),
    }
}

/// Extract the entry for one parsed page
///
/// Returns `None` when the page has no non-empty title.
pub fn extract_document(doc: &Document, base: &DocBase) -> Option<(String, MetadataTypeEntry)> {
    let root = doc.root();
    let title = first_text(root, "title");
    if title.is_empty() {
        return None;
    }

    let entry = MetadataTypeEntry::new(first_text(root, "shortdesc"), reference_url(root, base))
        .with_fields(extract_fields(root));
    Some((title, entry))
}

/// Read, parse and extract one file
pub fn extract_file(
    path: &Path,
    base: &DocBase,
    limits: &Limits,
) -> Result<Option<(String, MetadataTypeEntry)>> {
    let size = fs::metadata(path)?.len();
    limits.check_xml_size(usize::try_from(size).unwrap_or(usize::MAX))?;

    let content = fs::read_to_string(path)?;
    let doc = Document::parse(&content, limits)?;
    Ok(extract_document(&doc, base))
}

/// Files directly inside `dir` with the given extension, sorted by name
pub fn list_input_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Extract every matching file in the configured directory
pub fn extract_directory(config: &ExtractConfig) -> Result<ExtractReport> {
    config.validate()?;
    let base = config.doc_base()?;
    let files = list_input_files(&config.input_dir, &config.extension)?;
    info!(
        "Processing {} .{} files in {}",
        files.len(),
        config.extension,
        config.input_dir.display()
    );

    let mut report = ExtractReport {
        files_scanned: files.len(),
        ..Default::default()
    };
    let mut sources: BTreeMap<String, PathBuf> = BTreeMap::new();

    for path in files {
        match extract_file(&path, &base, &config.limits) {
            Ok(Some((title, entry))) => {
                if let Some(previous) = sources.insert(title.clone(), path.clone()) {
                    warn!(
                        "Duplicate title '{}': {} replaces {}",
                        title,
                        path.display(),
                        previous.display()
                    );
                    report.duplicates.push(DuplicateTitle {
                        title: title.clone(),
                        replaced: previous,
                        kept: path.clone(),
                    });
                }
                report.catalog.insert(title, entry);
            }
            Ok(None) => {
                warn!("No title found in {}", path.display());
                report.untitled.push(path);
            }
            Err(e) => {
                warn!("Error processing {}: {}", path.display(), e);
                report.failures.push(FileFailure {
                    path,
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        "Extracted {} metadata types with {} fields",
        report.catalog.len(),
        report.field_count()
    );
    Ok(report)
}

/// Run the extractor end to end and write the catalog
pub fn run(config: &ExtractConfig) -> Result<ExtractReport> {
    let report = extract_directory(config)?;
    write_json(&report.catalog, &config.output)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_DOC_BASE_URL;
    use tempfile::TempDir;

    const FOO_PAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE reference PUBLIC "-//OASIS//DTD DITA Reference//EN" "reference.dtd">
<reference id="meta_foo" xml:lang="en-us">
  <title>Foo
     Object</title>
  <shortdesc>Represents a <codeph>Foo</codeph>
     object.</shortdesc>
  <refbody>
    <section>
      <table>
        <tgroup cols="3">
          <thead>
            <row><entry>Field Name</entry><entry>Field Type</entry><entry>Field Description</entry></row>
          </thead>
          <tbody>
            <row>
              <entry><p><parmname>bar</parmname> (required)</p></entry>
              <entry>boolean</entry>
              <entry>Whether the <codeph>bar</codeph> is set.</entry>
            </row>
            <row><entry>baz</entry><entry>string</entry><entry></entry></row>
            <row><entry>noType</entry><entry/><entry>skipped</entry></row>
            <row><entry>short</entry><entry>string</entry></row>
          </tbody>
        </tgroup>
      </table>
      <table>
        <tgroup cols="3">
          <thead><row><entry>Name</entry><entry>Type</entry><entry>Desc</entry></row></thead>
          <tbody><row><entry>ignored</entry><entry>string</entry><entry>x</entry></row></tbody>
        </tgroup>
      </table>
    </section>
  </refbody>
</reference>
"#;

    fn base() -> DocBase {
        DocBase::parse(DEFAULT_DOC_BASE_URL).unwrap()
    }

    fn parse(xml: &str) -> Document {
        Document::from_string(xml).unwrap()
    }

    #[test]
    fn test_extract_document() {
        let (title, entry) = extract_document(&parse(FOO_PAGE), &base()).unwrap();

        assert_eq!(title, "Foo Object");
        assert_eq!(entry.short_description, "Represents a Foo object.");
        assert_eq!(
            entry.url,
            format!("{}meta_foo.htm", DEFAULT_DOC_BASE_URL)
        );
        assert_eq!(
            entry.fields,
            vec![
                FieldEntry::new("bar", "boolean", "Whether the bar is set."),
                FieldEntry::new("baz", "string", ""),
            ]
        );
    }

    #[test]
    fn test_header_requires_exact_labels() {
        let cells = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert!(is_field_header(&cells(&["Field Name", "Field Type", "Description"])));
        assert!(is_field_header(&cells(&["FIELD NAME", "FieldType", "Description", "Extra"])));
        assert!(!is_field_header(&cells(&["Name", "Type", "Desc"])));
        assert!(!is_field_header(&cells(&["Field Type", "Field Name", "Description"])));
        assert!(!is_field_header(&cells(&["Field Name", "Field Type"])));
    }

    #[test]
    fn test_non_field_table_yields_nothing() {
        let xml = r#"<reference id="meta_x"><title>X</title><table><tgroup>
            <thead><row><entry>Name</entry><entry>Type</entry><entry>Desc</entry></row></thead>
            <tbody><row><entry>a</entry><entry>string</entry><entry>b</entry></row></tbody>
        </tgroup></table></reference>"#;
        let (_, entry) = extract_document(&parse(xml), &base()).unwrap();
        assert!(entry.fields.is_empty());
    }

    #[test]
    fn test_table_without_thead_is_ignored() {
        let xml = r#"<table><tgroup><tbody>
            <row><entry>Field Name</entry><entry>Field Type</entry><entry>Description</entry></row>
            <row><entry>a</entry><entry>string</entry><entry>b</entry></row>
        </tbody></tgroup></table>"#;
        assert!(table_fields(parse(xml).root()).is_empty());
    }

    #[test]
    fn test_fields_from_several_tables_in_order() {
        let table = |name: &str| {
            format!(
                "<table><thead><row><entry>Field Name</entry><entry>Field Type</entry><entry>Description</entry></row></thead>\
                 <tbody><row><entry>{}</entry><entry>int</entry><entry>d</entry></row></tbody></table>",
                name
            )
        };
        let xml = format!("<concept><title>T</title>{}{}</concept>", table("first"), table("second"));
        let fields = extract_fields(parse(&xml).root());
        let names: Vec<&str> = fields.iter().map(|f| f.field_name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_url_requires_reference_root_and_id() {
        let concept = parse(r#"<concept id="meta_foo"><title>Foo</title></concept>"#);
        assert_eq!(reference_url(concept.root(), &base()), "");

        let no_id = parse(r#"<reference><title>Foo</title></reference>"#);
        assert_eq!(reference_url(no_id.root(), &base()), "");
    }

    #[test]
    fn test_url_interpolates_id_verbatim() {
        let up = parse(r#"<reference id="../meta_up"><title>Up</title></reference>"#);
        assert_eq!(
            reference_url(up.root(), &base()),
            format!("{}../meta_up.htm", DEFAULT_DOC_BASE_URL)
        );

        let host = parse(r#"<reference id="//evil.example/meta_z"><title>Z</title></reference>"#);
        assert_eq!(
            reference_url(host.root(), &base()),
            format!("{}//evil.example/meta_z.htm", DEFAULT_DOC_BASE_URL)
        );

        let spaced = parse(r#"<reference id="meta_a b"><title>A</title></reference>"#);
        assert_eq!(
            reference_url(spaced.root(), &base()),
            format!("{}meta_a b.htm", DEFAULT_DOC_BASE_URL)
        );
    }

    #[test]
    fn test_empty_title() {
        let doc = parse("<reference id=\"meta_x\"><title>  \n </title></reference>");
        assert!(extract_document(&doc, &base()).is_none());

        let doc = parse("<reference id=\"meta_x\"><shortdesc>no title</shortdesc></reference>");
        assert!(extract_document(&doc, &base()).is_none());
    }

    #[test]
    fn test_extract_directory_isolates_failures() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a_foo.xml"), FOO_PAGE).unwrap();
        fs::write(dir.path().join("b_broken.xml"), "<reference><title>Broken</reference>").unwrap();
        fs::write(dir.path().join("c_untitled.xml"), "<reference/>").unwrap();
        fs::write(dir.path().join("d_notes.txt"), "<reference><title>Ignored</title></reference>").unwrap();
        fs::create_dir(dir.path().join("nested.xml")).unwrap();

        let report = extract_directory(&ExtractConfig::new(dir.path())).unwrap();

        assert_eq!(report.files_scanned, 3);
        assert_eq!(report.catalog.len(), 1);
        assert!(report.catalog.contains_key("Foo Object"));
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].path.ends_with("b_broken.xml"));
        assert_eq!(report.untitled.len(), 1);
        assert_eq!(report.field_count(), 2);
    }

    #[test]
    fn test_duplicate_title_last_file_wins() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("1.xml"),
            "<reference id=\"meta_one\"><title>Same</title><shortdesc>first</shortdesc></reference>",
        )
        .unwrap();
        fs::write(
            dir.path().join("2.xml"),
            "<reference id=\"meta_two\"><title>Same</title><shortdesc>second</shortdesc></reference>",
        )
        .unwrap();

        let report = extract_directory(&ExtractConfig::new(dir.path())).unwrap();

        assert_eq!(report.catalog["Same"].short_description, "second");
        assert_eq!(report.duplicates.len(), 1);
        assert!(report.duplicates[0].replaced.ends_with("1.xml"));
        assert!(report.duplicates[0].kept.ends_with("2.xml"));
    }

    #[test]
    fn test_size_limit_is_per_file_failure() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("big.xml"), FOO_PAGE).unwrap();
        let config = ExtractConfig::new(dir.path()).with_limits(Limits::new().with_max_size(16));

        let report = extract_directory(&config).unwrap();
        assert!(report.catalog.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].error.contains("limit exceeded"));
    }

    #[test]
    fn test_run_writes_catalog() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("pages");
        fs::create_dir(&input).unwrap();
        fs::write(input.join("foo.xml"), FOO_PAGE).unwrap();
        let output = dir.path().join("map.json");

        run(&ExtractConfig::new(&input).with_output(&output)).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(json["Foo Object"]["fields"][0]["Field Name"], "bar");
        assert_eq!(json["Foo Object"]["fields"][0]["Field Type"], "boolean");
    }
}
