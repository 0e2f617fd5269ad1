//! Named ranges (`table:named-range`).
//!
//! A named range binds a name to a rectangular area of one table, written as
//! `$Sheet1.$A$1:.$B$3` in `table:cell-range-address`.

use crate::common::{Error, Result};
use crate::odf::coordinates::{CellCoord, CellRange};
use crate::odf::elements::{Element, ElementBase, ElementKind, Node};
use tracing::debug;

pub(crate) const NAMED_RANGE_TAG: &str = "table:named-range";
pub(crate) const NAMED_EXPRESSIONS_TAG: &str = "table:named-expressions";

/// A name bound to an area of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedRange {
    name: String,
    table_name: String,
    area: CellRange,
    usage: Option<String>,
}

impl NamedRange {
    /// Create a named range over `area` of table `table_name`
    pub fn new(name: &str, table_name: &str, area: CellRange) -> Result<Self> {
        validate_name(name)?;
        Ok(Self {
            name: name.to_string(),
            table_name: table_name.to_string(),
            area,
            usage: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Rename the table the range points to
    pub fn set_table_name(&mut self, table_name: &str) {
        self.table_name = table_name.to_string();
    }

    pub fn area(&self) -> CellRange {
        self.area
    }

    pub fn set_area(&mut self, area: CellRange) {
        self.area = area;
    }

    /// `table:range-usable-as`, e.g. `print-range repeat-row`
    pub fn usage(&self) -> Option<&str> {
        self.usage.as_deref()
    }

    pub fn set_usage(&mut self, usage: Option<&str>) {
        self.usage = usage.map(str::to_string);
    }

    /// `table:cell-range-address` form of the range
    pub fn range_address(&self) -> String {
        let table = quote_table_name(&self.table_name);
        if self.area.is_single() {
            format!("{}.{}", table, absolute(self.area.start()))
        } else {
            format!(
                "{}.{}:.{}",
                table,
                absolute(self.area.start()),
                absolute(self.area.end())
            )
        }
    }

    /// Read a `table:named-range` element
    pub fn from_element(element: &Element) -> Result<Self> {
        if ElementKind::of(element) != ElementKind::NamedRange {
            return Err(Error::InvalidFormat(format!(
                "unexpected element <{}>",
                element.tag()
            )));
        }
        let name = element
            .get_attribute("table:name")
            .ok_or_else(|| Error::InvalidFormat("named range without a name".to_string()))?;
        let address = element
            .get_attribute("table:cell-range-address")
            .ok_or_else(|| Error::InvalidFormat(format!("named range '{}' has no address", name)))?;
        let (table_name, area) = parse_range_address(address)?;

        let mut range = Self::new(name, &table_name, area)?;
        range.usage = element
            .get_attribute("table:range-usable-as")
            .filter(|usage| *usage != "none")
            .map(str::to_string);
        Ok(range)
    }

    /// Build the `table:named-range` element
    pub fn to_element(&self) -> Element {
        let base = format!("{}.{}", quote_table_name(&self.table_name), absolute(self.area.start()));
        let mut element = Element::new(NAMED_RANGE_TAG)
            .with_attribute("table:name", &self.name)
            .with_attribute("table:base-cell-address", &base)
            .with_attribute("table:cell-range-address", &self.range_address());
        if let Some(usage) = &self.usage {
            element.set_attribute("table:range-usable-as", usage);
        }
        element
    }
}

/// Names must be non-empty and contain no whitespace or address separators
fn validate_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '.' | ':' | '$' | '\'' | '"'));
    if invalid {
        return Err(Error::InvalidFormat(format!("invalid named range name '{}'", name)));
    }
    Ok(())
}

fn absolute(coord: CellCoord) -> String {
    let a1 = coord.to_a1();
    let split = a1.find(|c: char| c.is_ascii_digit()).unwrap_or(a1.len());
    format!("${}${}", &a1[..split], &a1[split..])
}

fn quote_table_name(name: &str) -> String {
    if name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        format!("${}", name)
    } else {
        format!("$'{}'", name.replace('\'', "''"))
    }
}

/// Split `[$]Table.[$]A[$]1` into the table name (if any) and the cell part
fn split_reference(reference: &str) -> Result<(Option<String>, &str)> {
    let reference = reference.trim().trim_start_matches('$');
    if let Some(quoted) = reference.strip_prefix('\'') {
        // Quoted name, '' escapes a quote
        let mut name = String::new();
        let mut chars = quoted.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if c == '\'' {
                if matches!(chars.peek(), Some((_, '\''))) {
                    chars.next();
                    name.push('\'');
                    continue;
                }
                let rest = &quoted[i + 1..];
                let cell = rest.strip_prefix('.').ok_or_else(|| {
                    Error::InvalidCoordinate(format!("missing '.' after table name in '{}'", reference))
                })?;
                return Ok((Some(name), cell));
            }
            name.push(c);
        }
        return Err(Error::InvalidCoordinate(format!("unterminated table name in '{}'", reference)));
    }

    match reference.rsplit_once('.') {
        Some((table, cell)) if table.is_empty() => Ok((None, cell)),
        Some((table, cell)) => Ok((Some(table.to_string()), cell)),
        None => Ok((None, reference)),
    }
}

/// Parse a `table:cell-range-address` such as `$Sheet1.$A$1:.$B$3`
pub fn parse_range_address(address: &str) -> Result<(String, CellRange)> {
    let (start, end) = split_quoted_range(address);
    let (table, start_cell) = split_reference(start)?;
    let table = table.ok_or_else(|| {
        Error::InvalidCoordinate(format!("range address '{}' names no table", address))
    })?;
    let start_coord: CellCoord = start_cell.parse()?;
    let area = match end {
        Some(end) => {
            let (end_table, end_cell) = split_reference(end)?;
            if end_table.as_deref().is_some_and(|t| t != table) {
                return Err(Error::InvalidCoordinate(format!(
                    "range address '{}' spans several tables",
                    address
                )));
            }
            CellRange::new(start_coord, end_cell.parse()?)
        },
        None => CellRange::single(start_coord),
    };
    Ok((table, area))
}

/// Split at the first ':' that is outside a quoted table name
fn split_quoted_range(address: &str) -> (&str, Option<&str>) {
    let mut quoted = false;
    for (i, c) in address.char_indices() {
        match c {
            '\'' => quoted = !quoted,
            ':' if !quoted => return (&address[..i], Some(&address[i + 1..])),
            _ => {},
        }
    }
    (address, None)
}

/// Parse a `table:named-expressions` element. Named expressions, and named
/// ranges this model cannot hold (such as ranges over several tables), are
/// returned as they are.
pub(crate) fn parse_named_expressions(element: &Element) -> (Vec<NamedRange>, Vec<Node>) {
    let mut ranges = Vec::new();
    let mut others = Vec::new();
    for node in element.children() {
        match node.as_element() {
            Some(child) if ElementKind::of(child) == ElementKind::NamedRange => {
                match NamedRange::from_element(child) {
                    Ok(range) => ranges.push(range),
                    Err(err) => {
                        debug!(
                            name = child.get_attribute("table:name").unwrap_or_default(),
                            %err,
                            "keeping named range verbatim"
                        );
                        others.push(node.clone());
                    },
                }
            },
            _ if node.is_blank_text() => {},
            _ => others.push(node.clone()),
        }
    }
    (ranges, others)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range_addresses() {
        let (table, area) = parse_range_address("$Sheet1.$A$1:.$B$3").unwrap();
        assert_eq!(table, "Sheet1");
        assert_eq!(area, CellRange::from_bounds(0, 0, 1, 2));

        let (table, area) = parse_range_address("Sheet2.C4").unwrap();
        assert_eq!(table, "Sheet2");
        assert!(area.is_single());

        let (table, area) = parse_range_address("$'My: ''Sheet'''.$B$2:$'My: ''Sheet'''.$C$3").unwrap();
        assert_eq!(table, "My: 'Sheet'");
        assert_eq!(area, CellRange::from_bounds(1, 1, 2, 2));

        assert!(parse_range_address("$A$1:$B$2").is_err());
        assert!(parse_range_address("$S1.$A$1:$S2.$B$2").is_err());
        assert!(parse_range_address("$'open.$A$1").is_err());
    }

    #[test]
    fn test_element_round_trip() {
        let mut range = NamedRange::new("totals", "My Sheet", "B2:D9".parse().unwrap()).unwrap();
        range.set_usage(Some("print-range"));
        let element = range.to_element();
        assert_eq!(
            element.get_attribute("table:cell-range-address"),
            Some("$'My Sheet'.$B$2:.$D$9")
        );
        assert_eq!(element.get_attribute("table:base-cell-address"), Some("$'My Sheet'.$B$2"));
        assert_eq!(NamedRange::from_element(&element).unwrap(), range);
    }

    #[test]
    fn test_invalid_names() {
        let area = CellRange::from_bounds(0, 0, 0, 0);
        assert!(NamedRange::new("", "S", area).is_err());
        assert!(NamedRange::new("a b", "S", area).is_err());
        assert!(NamedRange::new("a.b", "S", area).is_err());
        assert!(NamedRange::new("ok_name", "S", area).is_ok());
    }

    #[test]
    fn test_parse_named_expressions_keeps_expressions() {
        let xml = r#"<table:named-expressions>
  <table:named-range table:name="r" table:base-cell-address="$S.$A$1" table:cell-range-address="$S.$A$1:.$A$2" table:range-usable-as="none"/>
  <table:named-expression table:name="e" table:expression="of:=1+1"/>
</table:named-expressions>"#;
        let element = Element::parse(xml).unwrap();
        let (ranges, others) = parse_named_expressions(&element);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].usage(), None);
        assert_eq!(others.len(), 1);
    }

    #[test]
    fn test_multi_table_range_kept_verbatim() {
        let xml = r#"<table:named-expressions><table:named-range table:name="cube" table:base-cell-address="$S1.$A$1" table:cell-range-address="$S1.$A$1:$S2.$B$2"/></table:named-expressions>"#;
        let element = Element::parse(xml).unwrap();
        let (ranges, others) = parse_named_expressions(&element);
        assert!(ranges.is_empty());
        assert_eq!(others.len(), 1);
        let kept = others[0].as_element().unwrap();
        assert_eq!(kept.get_attribute("table:cell-range-address"), Some("$S1.$A$1:$S2.$B$2"));
    }
}
