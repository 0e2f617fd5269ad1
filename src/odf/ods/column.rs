//! Column definitions of an ODS table.

use crate::odf::elements::{Element, ElementBase, ElementKind, OdfElement};
use crate::odf::ods::cell::COLUMNS_REPEATED;
use crate::odf::ods::store::Repeated;

pub(crate) const COLUMN_TAG: &str = "table:table-column";

/// A `table:table-column`, possibly standing for several identical columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    element: Element,
    header: bool,
}

impl Default for Column {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementBase for Column {
    fn element(&self) -> &Element {
        &self.element
    }

    fn element_mut(&mut self) -> &mut Element {
        &mut self.element
    }
}

impl OdfElement for Column {
    const KINDS: &'static [ElementKind] = &[ElementKind::TableColumn];

    fn wrap(element: Element) -> Self {
        Self {
            element,
            header: false,
        }
    }

    fn to_element(&self) -> Element {
        self.element.clone()
    }
}

impl Repeated for Column {
    fn repeated(&self) -> usize {
        self.get_usize_attribute(COLUMNS_REPEATED)
            .unwrap_or(1)
            .max(1)
    }

    fn set_repeated(&mut self, repeat: usize) {
        self.set_count_attribute(COLUMNS_REPEATED, repeat);
    }
}

impl Column {
    pub fn new() -> Self {
        Self::wrap(Element::new(COLUMN_TAG))
    }

    /// Column with `table:style-name` set
    pub fn with_style(style: &str) -> Self {
        let mut column = Self::new();
        column.set_style(Some(style));
        column
    }

    /// Builder-style repeat setter
    pub fn repeated_by(mut self, repeat: usize) -> Self {
        self.set_repeated(repeat);
        self
    }

    pub fn style(&self) -> Option<&str> {
        self.get_attribute("table:style-name")
    }

    pub fn set_style(&mut self, style: Option<&str>) {
        match style {
            Some(s) => self.set_attribute("table:style-name", s),
            None => {
                self.remove_attribute("table:style-name");
            },
        }
    }

    /// Style applied to cells of this column that have none of their own
    pub fn default_cell_style(&self) -> Option<&str> {
        self.get_attribute("table:default-cell-style-name")
    }

    pub fn set_default_cell_style(&mut self, style: Option<&str>) {
        match style {
            Some(s) => self.set_attribute("table:default-cell-style-name", s),
            None => {
                self.remove_attribute("table:default-cell-style-name");
            },
        }
    }

    /// Member of `table:table-header-columns`
    pub fn is_header(&self) -> bool {
        self.header
    }

    pub fn set_header(&mut self, header: bool) {
        self.header = header;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_attributes() {
        let xml = r#"<table:table-column table:style-name="co1" table:number-columns-repeated="5" table:default-cell-style-name="Default"/>"#;
        let column = Column::from_element(Element::parse(xml).unwrap()).unwrap();
        assert_eq!(column.repeated(), 5);
        assert_eq!(column.style(), Some("co1"));
        assert_eq!(column.default_cell_style(), Some("Default"));
        assert!(!column.is_header());
        assert_eq!(column.to_element().to_xml_string(), xml);
    }

    #[test]
    fn test_column_builders() {
        let mut column = Column::with_style("co2").repeated_by(3);
        assert_eq!(column.repeated(), 3);
        column.set_style(None);
        column.set_repeated(1);
        assert_eq!(column.to_element().to_xml_string(), "<table:table-column/>");
    }
}
