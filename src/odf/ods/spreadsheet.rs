//! Spreadsheet documents.
//!
//! A [`Spreadsheet`] owns the package it was read from. Only `content.xml` is
//! parsed; every other part is carried along and written back unchanged.

use crate::common::{Error, Result};
use crate::odf::core::{OdfStructure, Package};
use crate::odf::{OdfFormat, detect_format_from_mime};
use crate::odf::elements::{Element, ElementKind, Node, OdfElement};
use crate::odf::ods::cell::CellValue;
use crate::odf::ods::config::{TableCleanup, WriteOptions};
use crate::odf::ods::named_range::{self, NAMED_EXPRESSIONS_TAG, NamedRange};
use crate::odf::ods::table::Table;
use std::borrow::Cow;
use std::path::Path;
use tracing::debug;

const CONTENT_PATH: &str = "content.xml";
const STYLES_PATH: &str = "styles.xml";
const META_PATH: &str = "meta.xml";
const SPREADSHEET_TAG: &str = "office:spreadsheet";

/// An OpenDocument spreadsheet (.ods).
///
/// # Examples
///
/// ```no_run
/// use longan::odf::ods::{Spreadsheet, Table};
///
/// # fn main() -> longan::Result<()> {
/// let mut doc = Spreadsheet::open("data.ods")?;
/// if let Some(table) = doc.table_by_name_mut("Sheet1") {
///     table.set_value("B2", 42.0)?;
/// }
/// doc.append_table(Table::new("Summary", 2, 2))?;
/// doc.save("data-out.ods")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Spreadsheet {
    package: Package,
    /// `office:document-content` with the spreadsheet body emptied
    content: Element,
    tables: Vec<Table>,
    named_ranges: Vec<NamedRange>,
    /// Named expressions other than ranges
    named_expressions: Vec<Node>,
    /// Body children before the first table
    prelude: Vec<Node>,
    /// Body children after the tables
    epilogue: Vec<Node>,
}

impl Default for Spreadsheet {
    fn default() -> Self {
        Self::new()
    }
}

impl Spreadsheet {
    /// An empty spreadsheet without tables
    pub fn new() -> Self {
        Self {
            package: Package::new(OdfStructure::SPREADSHEET_MIMETYPE),
            content: OdfStructure::default_content(),
            tables: Vec::new(),
            named_ranges: Vec::new(),
            named_expressions: Vec::new(),
            prelude: Vec::new(),
            epilogue: Vec::new(),
        }
    }

    /// Open an ODS file from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    /// Read an ODS document from a byte buffer
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_package(Package::from_bytes(bytes)?)
    }

    /// Read the spreadsheet body of an already opened package
    pub fn from_package(package: Package) -> Result<Self> {
        let mimetype = package.mimetype();
        if detect_format_from_mime(mimetype) != Some(OdfFormat::Spreadsheet) {
            return Err(Error::InvalidFormat(format!(
                "Not an ODS file: MIME type is {}",
                mimetype
            )));
        }

        let mut content = Element::from_bytes(package.get_file(CONTENT_PATH)?)?;
        let body = content.find_mut(SPREADSHEET_TAG).ok_or_else(|| {
            Error::ComponentNotFound(format!("<{}> in {}", SPREADSHEET_TAG, CONTENT_PATH))
        })?;

        let mut doc = Self {
            package,
            content: Element::default(),
            tables: Vec::new(),
            named_ranges: Vec::new(),
            named_expressions: Vec::new(),
            prelude: Vec::new(),
            epilogue: Vec::new(),
        };
        for node in body.take_children() {
            let element = match node {
                Node::Element(element) => element,
                other if other.is_blank_text() => continue,
                other => {
                    doc.keep_other(other);
                    continue;
                },
            };
            match ElementKind::of(&element) {
                ElementKind::Table => doc.tables.push(Table::wrap(element)),
                ElementKind::NamedExpressions => {
                    let (ranges, others) = named_range::parse_named_expressions(&element);
                    doc.named_ranges.extend(ranges);
                    doc.named_expressions.extend(others);
                },
                _ => doc.keep_other(Node::Element(element)),
            }
        }
        doc.content = content;

        debug!(
            tables = doc.tables.len(),
            named_ranges = doc.named_ranges.len(),
            "loaded spreadsheet"
        );
        Ok(doc)
    }

    fn keep_other(&mut self, node: Node) {
        if self.tables.is_empty() {
            self.prelude.push(node);
        } else {
            self.epilogue.push(node);
        }
    }

    /// The underlying package
    pub fn package(&self) -> &Package {
        &self.package
    }

    // Tables

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn tables_mut(&mut self) -> &mut [Table] {
        &mut self.tables
    }

    pub fn table(&self, index: usize) -> Option<&Table> {
        self.tables.get(index)
    }

    pub fn table_mut(&mut self, index: usize) -> Option<&mut Table> {
        self.tables.get_mut(index)
    }

    pub fn table_by_name(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name() == name)
    }

    pub fn table_by_name_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.name() == name)
    }

    /// Append a table. Table names must be unique within the document.
    pub fn append_table(&mut self, table: Table) -> Result<&mut Table> {
        if table.name().is_empty() {
            return Err(Error::InvalidFormat("table name must not be empty".to_string()));
        }
        if self.table_by_name(table.name()).is_some() {
            return Err(Error::InvalidFormat(format!(
                "a table named '{}' already exists",
                table.name()
            )));
        }
        self.tables.push(table);
        let index = self.tables.len() - 1;
        Ok(&mut self.tables[index])
    }

    /// Remove the table at `index`, together with the named ranges pointing
    /// into it
    pub fn delete_table(&mut self, index: usize) -> Result<Table> {
        if index >= self.tables.len() {
            return Err(Error::OutOfRange {
                position: index,
                len: self.tables.len(),
            });
        }
        let table = self.tables.remove(index);
        self.named_ranges.retain(|r| r.table_name() != table.name());
        Ok(table)
    }

    // Named ranges

    pub fn named_ranges(&self) -> &[NamedRange] {
        &self.named_ranges
    }

    pub fn named_range(&self, name: &str) -> Option<&NamedRange> {
        self.named_ranges.iter().find(|r| r.name() == name)
    }

    /// Add a named range, replacing any range with the same name
    pub fn set_named_range(&mut self, range: NamedRange) {
        match self.named_ranges.iter_mut().find(|r| r.name() == range.name()) {
            Some(existing) => *existing = range,
            None => self.named_ranges.push(range),
        }
    }

    /// Remove a named range, returning it if it existed
    pub fn delete_named_range(&mut self, name: &str) -> Option<NamedRange> {
        let pos = self.named_ranges.iter().position(|r| r.name() == name)?;
        Some(self.named_ranges.remove(pos))
    }

    /// Values of the area a named range points to
    pub fn named_range_values(&self, name: &str) -> Result<Vec<Vec<CellValue>>> {
        let range = self
            .named_range(name)
            .ok_or_else(|| Error::ComponentNotFound(format!("named range '{}'", name)))?;
        let table = self.table_by_name(range.table_name()).ok_or_else(|| {
            Error::ComponentNotFound(format!("table '{}'", range.table_name()))
        })?;
        table.values_in(range.area())
    }

    // Serialization

    /// Rebuild the `content.xml` root
    pub fn content_element(&self) -> Element {
        self.content_with(&self.tables)
    }

    fn content_with(&self, tables: &[Table]) -> Element {
        let mut content = self.content.clone();
        if content.find(SPREADSHEET_TAG).is_none() {
            match content.first_child_mut("office:body") {
                Some(body) => body.push_child(Element::new(SPREADSHEET_TAG)),
                None => content.push_child(
                    Element::new("office:body").with_child(Element::new(SPREADSHEET_TAG)),
                ),
            }
        }
        if let Some(body) = content.find_mut(SPREADSHEET_TAG) {
            body.children_mut().extend(self.prelude.iter().cloned());
            for table in tables {
                body.push_child(table.to_element());
            }
            if !self.named_ranges.is_empty() || !self.named_expressions.is_empty() {
                let mut expressions = Element::new(NAMED_EXPRESSIONS_TAG);
                for range in &self.named_ranges {
                    expressions.push_child(range.to_element());
                }
                expressions
                    .children_mut()
                    .extend(self.named_expressions.iter().cloned());
                body.push_child(expressions);
            }
            body.children_mut().extend(self.epilogue.iter().cloned());
        }
        content
    }

    /// Serialize with default options
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.to_bytes_with(&WriteOptions::default())
    }

    /// Serialize the document to ODS bytes
    pub fn to_bytes_with(&self, options: &WriteOptions) -> Result<Vec<u8>> {
        let tables: Cow<'_, [Table]> = match options.cleanup {
            TableCleanup::None => Cow::Borrowed(&self.tables),
            cleanup => {
                let mut tables = self.tables.clone();
                for table in &mut tables {
                    cleanup.apply(table);
                }
                Cow::Owned(tables)
            },
        };

        let mut package = self.package.clone();
        let content = self.content_with(&tables).to_xml_document();
        package.set_file(CONTENT_PATH, content.into_bytes());
        if !package.has_file(STYLES_PATH) {
            package.set_file(STYLES_PATH, OdfStructure::default_styles_xml().into_bytes());
        }
        if !package.has_file(META_PATH) {
            package.set_file(
                META_PATH,
                OdfStructure::default_meta_xml(&options.generator).into_bytes(),
            );
        }

        debug!(tables = tables.len(), cleanup = ?options.cleanup, "writing spreadsheet");
        package.to_bytes(options.compression_level)
    }

    /// Save with default options
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.save_with(path, &WriteOptions::default())
    }

    pub fn save_with<P: AsRef<Path>>(&self, path: P, options: &WriteOptions) -> Result<()> {
        let bytes = self.to_bytes_with(options)?;
        std::fs::write(path.as_ref(), bytes)?;
        Ok(())
    }
}
