//! Registry mapping ODF tags to the node kinds the table engine understands.

use crate::common::{Error, Result};
use crate::odf::elements::element::Element;
use once_cell::sync::Lazy;
use phf::{Map, phf_map};
use std::collections::HashMap;

/// Node kinds with dedicated handling. Everything else is [`ElementKind::Other`]
/// and is carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Spreadsheet,
    Table,
    TableColumn,
    TableColumns,
    TableHeaderColumns,
    TableColumnGroup,
    TableRow,
    TableRows,
    TableHeaderRows,
    TableRowGroup,
    TableCell,
    CoveredTableCell,
    NamedExpressions,
    NamedRange,
    Paragraph,
    Other,
}

static TAG_KINDS: Map<&'static str, ElementKind> = phf_map! {
    "office:spreadsheet" => ElementKind::Spreadsheet,
    "table:table" => ElementKind::Table,
    "table:table-column" => ElementKind::TableColumn,
    "table:table-columns" => ElementKind::TableColumns,
    "table:table-header-columns" => ElementKind::TableHeaderColumns,
    "table:table-column-group" => ElementKind::TableColumnGroup,
    "table:table-row" => ElementKind::TableRow,
    "table:table-rows" => ElementKind::TableRows,
    "table:table-header-rows" => ElementKind::TableHeaderRows,
    "table:table-row-group" => ElementKind::TableRowGroup,
    "table:table-cell" => ElementKind::TableCell,
    "table:covered-table-cell" => ElementKind::CoveredTableCell,
    "table:named-expressions" => ElementKind::NamedExpressions,
    "table:named-range" => ElementKind::NamedRange,
    "text:p" => ElementKind::Paragraph,
};

/// Reverse of [`TAG_KINDS`], built on first use
static KIND_TAGS: Lazy<HashMap<ElementKind, &'static str>> =
    Lazy::new(|| TAG_KINDS.entries().map(|(tag, kind)| (*kind, *tag)).collect());

impl ElementKind {
    /// Classify a qualified tag name
    pub fn from_tag(tag: &str) -> Self {
        TAG_KINDS.get(tag).copied().unwrap_or(ElementKind::Other)
    }

    /// Classify an element by its tag
    pub fn of(element: &Element) -> Self {
        Self::from_tag(element.tag())
    }

    /// Canonical tag for this kind; `None` for [`ElementKind::Other`]
    pub fn tag(self) -> Option<&'static str> {
        KIND_TAGS.get(&self).copied()
    }

    /// Containers whose column children are flattened into the table's column list
    pub fn is_column_container(self) -> bool {
        matches!(
            self,
            ElementKind::TableColumns
                | ElementKind::TableHeaderColumns
                | ElementKind::TableColumnGroup
        )
    }

    /// Containers whose row children are flattened into the table's row list
    pub fn is_row_container(self) -> bool {
        matches!(
            self,
            ElementKind::TableRows | ElementKind::TableHeaderRows | ElementKind::TableRowGroup
        )
    }

    /// Either cell flavour
    pub fn is_cell(self) -> bool {
        matches!(self, ElementKind::TableCell | ElementKind::CoveredTableCell)
    }
}

/// A typed view over an [`Element`] of one or more known kinds.
pub trait OdfElement: Sized {
    /// Kinds accepted by [`OdfElement::from_element`]
    const KINDS: &'static [ElementKind];

    /// Wrap an element after checking its kind
    fn from_element(element: Element) -> Result<Self> {
        let kind = ElementKind::of(&element);
        if !Self::KINDS.contains(&kind) {
            return Err(Error::InvalidFormat(format!(
                "unexpected element <{}>",
                element.tag()
            )));
        }
        Ok(Self::wrap(element))
    }

    /// Wrap an element whose kind is already known to be acceptable
    fn wrap(element: Element) -> Self;

    /// Rebuild the XML element, including all children
    fn to_element(&self) -> Element;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_round_trip() {
        for kind in [
            ElementKind::Table,
            ElementKind::TableRow,
            ElementKind::TableCell,
            ElementKind::CoveredTableCell,
            ElementKind::TableHeaderRows,
            ElementKind::NamedRange,
        ] {
            assert_eq!(ElementKind::from_tag(kind.tag().unwrap()), kind);
        }
        assert_eq!(ElementKind::from_tag("table:shapes"), ElementKind::Other);
        assert_eq!(ElementKind::Other.tag(), None);
    }

    #[test]
    fn test_container_classes() {
        assert!(ElementKind::TableRowGroup.is_row_container());
        assert!(!ElementKind::TableRow.is_row_container());
        assert!(ElementKind::TableHeaderColumns.is_column_container());
        assert!(ElementKind::CoveredTableCell.is_cell());
    }
}
