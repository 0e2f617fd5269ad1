//! Cells of an ODS table.

use crate::common::Result;
use crate::odf::datatype::OdfValue;
use crate::odf::elements::{Element, ElementBase, ElementKind, Node, OdfElement};
use crate::odf::ods::store::Repeated;
use chrono::{Duration, NaiveDate, NaiveDateTime};

pub(crate) const CELL_TAG: &str = "table:table-cell";
pub(crate) const COVERED_TAG: &str = "table:covered-table-cell";
pub(crate) const COLUMNS_REPEATED: &str = "table:number-columns-repeated";
pub(crate) const COLUMNS_SPANNED: &str = "table:number-columns-spanned";
pub(crate) const ROWS_SPANNED: &str = "table:number-rows-spanned";

const STYLE_NAME: &str = "table:style-name";
const FORMULA: &str = "table:formula";

/// Attributes that carry the typed value of a cell
const VALUE_ATTRIBUTES: &[&str] = &[
    "office:value-type",
    "calcext:value-type",
    "office:value",
    "office:date-value",
    "office:time-value",
    "office:boolean-value",
    "office:string-value",
    "office:currency",
];

/// Cell data types supported by ODF spreadsheets.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Empty cell
    #[default]
    Empty,
    /// Text string
    Text(String),
    /// Numeric value
    Number(f64),
    /// Boolean value
    Boolean(bool),
    /// Calendar date
    Date(NaiveDate),
    /// Date with time of day
    DateTime(NaiveDateTime),
    /// Time duration (`office:time-value`)
    Duration(Duration),
    /// Currency value with currency code
    Currency(f64, String),
    /// Percentage value, stored as a fraction (0.5 is 50%)
    Percentage(f64),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Numeric content of Number, Currency and Percentage values
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) | CellValue::Currency(n, _) | CellValue::Percentage(n) => Some(*n),
            _ => None,
        }
    }

    /// Text shown in the cell's paragraph
    pub fn display_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => n.encode(),
            CellValue::Boolean(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
            CellValue::Date(d) => d.encode(),
            CellValue::DateTime(dt) => dt.encode(),
            CellValue::Duration(d) => d.encode(),
            CellValue::Currency(n, code) => format!("{} {}", n.encode(), code),
            CellValue::Percentage(n) => format!("{}%", (n * 100.0).encode()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(f64::from(n))
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::DateTime(dt)
    }
}

impl From<Duration> for CellValue {
    fn from(d: Duration) -> Self {
        CellValue::Duration(d)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Empty, Into::into)
    }
}

/// A table cell, plain or covered by a span.
///
/// A cell with `table:number-columns-repeated="n"` stands for `n` identical
/// cells in a row.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    element: Element,
}

impl Default for Cell {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementBase for Cell {
    fn element(&self) -> &Element {
        &self.element
    }

    fn element_mut(&mut self) -> &mut Element {
        &mut self.element
    }
}

impl OdfElement for Cell {
    const KINDS: &'static [ElementKind] = &[ElementKind::TableCell, ElementKind::CoveredTableCell];

    fn wrap(element: Element) -> Self {
        Self { element }
    }

    fn to_element(&self) -> Element {
        self.element.clone()
    }
}

impl Repeated for Cell {
    fn repeated(&self) -> usize {
        self.get_usize_attribute(COLUMNS_REPEATED)
            .unwrap_or(1)
            .max(1)
    }

    fn set_repeated(&mut self, repeat: usize) {
        self.set_count_attribute(COLUMNS_REPEATED, repeat);
    }
}

impl Cell {
    /// An empty cell
    pub fn new() -> Self {
        Self {
            element: Element::new(CELL_TAG),
        }
    }

    /// A cell holding `value`
    pub fn with_value(value: impl Into<CellValue>) -> Self {
        let mut cell = Self::new();
        cell.set_value(value);
        cell
    }

    /// An empty covered cell
    pub fn covered() -> Self {
        Self {
            element: Element::new(COVERED_TAG),
        }
    }

    /// Builder-style repeat setter
    pub fn repeated_by(mut self, repeat: usize) -> Self {
        self.set_repeated(repeat);
        self
    }

    /// Builder-style style setter
    pub fn with_style(mut self, style: &str) -> Self {
        self.set_style(Some(style));
        self
    }

    /// Consume the cell, returning its element
    pub fn into_element(self) -> Element {
        self.element
    }

    /// Typed value of the cell.
    ///
    /// Cells without `office:value-type` report their paragraph text, if any.
    pub fn value(&self) -> Result<CellValue> {
        let value_type = self.get_attribute("office:value-type");
        let number = |attr: &str| -> Result<f64> {
            f64::decode(self.get_attribute(attr).unwrap_or("0"))
        };

        Ok(match value_type {
            Some("float") => CellValue::Number(number("office:value")?),
            Some("percentage") => CellValue::Percentage(number("office:value")?),
            Some("currency") => CellValue::Currency(
                number("office:value")?,
                self.get_attribute("office:currency").unwrap_or_default().to_string(),
            ),
            Some("boolean") => {
                CellValue::Boolean(bool::decode(self.get_attribute("office:boolean-value").unwrap_or("false"))?)
            },
            Some("date") => {
                let raw = self.get_attribute("office:date-value").unwrap_or_default();
                if raw.contains('T') {
                    CellValue::DateTime(NaiveDateTime::decode(raw)?)
                } else {
                    CellValue::Date(NaiveDate::decode(raw)?)
                }
            },
            Some("time") => {
                CellValue::Duration(Duration::decode(self.get_attribute("office:time-value").unwrap_or("PT0S"))?)
            },
            Some(_) => match self.get_attribute("office:string-value") {
                Some(s) => CellValue::Text(s.to_string()),
                None => CellValue::Text(self.text()),
            },
            None => {
                let text = self.text();
                if text.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(text)
                }
            },
        })
    }

    /// Replace the value and the displayed paragraph text.
    ///
    /// Style, formula and span attributes are kept. An empty string clears
    /// the value.
    pub fn set_value(&mut self, value: impl Into<CellValue>) {
        let value = value.into();
        self.clear_value();

        let value_type = match &value {
            CellValue::Empty => return,
            CellValue::Text(s) if s.is_empty() => return,
            CellValue::Text(_) => "string",
            CellValue::Number(n) => {
                self.set_attribute("office:value", &n.encode());
                "float"
            },
            CellValue::Boolean(b) => {
                self.set_attribute("office:boolean-value", &b.encode());
                "boolean"
            },
            CellValue::Date(d) => {
                self.set_attribute("office:date-value", &d.encode());
                "date"
            },
            CellValue::DateTime(dt) => {
                self.set_attribute("office:date-value", &dt.encode());
                "date"
            },
            CellValue::Duration(d) => {
                self.set_attribute("office:time-value", &d.encode());
                "time"
            },
            CellValue::Currency(n, code) => {
                self.set_attribute("office:value", &n.encode());
                self.set_attribute("office:currency", code);
                "currency"
            },
            CellValue::Percentage(n) => {
                self.set_attribute("office:value", &n.encode());
                "percentage"
            },
        };
        self.set_attribute("office:value-type", value_type);
        self.set_text(&value.display_text());
    }

    /// Remove the typed value and the paragraphs, keeping anything else
    pub fn clear_value(&mut self) {
        self.element
            .retain_attributes(|name| !VALUE_ATTRIBUTES.contains(&name));
        self.remove_paragraphs();
    }

    /// Numeric content of the cell, if it holds a number-like value
    pub fn numeric_value(&self) -> Result<Option<f64>> {
        Ok(self.value()?.as_f64())
    }

    /// Displayed text: every paragraph joined by newlines
    pub fn text(&self) -> String {
        self.element
            .child_elements()
            .filter(|e| matches!(e.tag(), "text:p" | "text:h"))
            .map(Element::text_content)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Replace the paragraphs with `text`, one paragraph per line
    pub fn set_text(&mut self, text: &str) {
        self.remove_paragraphs();
        if text.is_empty() {
            return;
        }
        for line in text.split('\n') {
            self.element.push_child(paragraph(line));
        }
    }

    fn remove_paragraphs(&mut self) {
        self.element.children_mut().retain(|node| match node {
            Node::Element(e) => !matches!(e.tag(), "text:p" | "text:h"),
            Node::Text(_) => false,
        });
    }

    /// `table:style-name`
    pub fn style(&self) -> Option<&str> {
        self.get_attribute(STYLE_NAME)
    }

    pub fn set_style(&mut self, style: Option<&str>) {
        match style {
            Some(s) => self.set_attribute(STYLE_NAME, s),
            None => {
                self.remove_attribute(STYLE_NAME);
            },
        }
    }

    /// `table:formula`, e.g. `of:=SUM([.A1:.A3])`
    pub fn formula(&self) -> Option<&str> {
        self.get_attribute(FORMULA)
    }

    pub fn set_formula(&mut self, formula: Option<&str>) {
        match formula {
            Some(f) => self.set_attribute(FORMULA, f),
            None => {
                self.remove_attribute(FORMULA);
            },
        }
    }

    /// True for `table:covered-table-cell`
    pub fn is_covered(&self) -> bool {
        self.element.tag() == COVERED_TAG
    }

    /// Switch between plain and covered cell. Covered cells never carry a span.
    pub fn set_covered(&mut self, covered: bool) {
        if covered {
            self.element.set_tag(COVERED_TAG);
            self.clear_span();
        } else {
            self.element.set_tag(CELL_TAG);
        }
    }

    /// Span extent as `(columns, rows)`, `(1, 1)` when not spanned
    pub fn span(&self) -> (usize, usize) {
        (
            self.get_usize_attribute(COLUMNS_SPANNED).unwrap_or(1).max(1),
            self.get_usize_attribute(ROWS_SPANNED).unwrap_or(1).max(1),
        )
    }

    /// Make this cell the origin of a `columns` x `rows` span
    pub fn set_span(&mut self, columns: usize, rows: usize) {
        let mut buf = itoa::Buffer::new();
        self.set_attribute(COLUMNS_SPANNED, buf.format(columns.max(1)));
        self.set_attribute(ROWS_SPANNED, buf.format(rows.max(1)));
    }

    /// Remove the span extent attributes
    pub fn clear_span(&mut self) {
        self.remove_attribute(COLUMNS_SPANNED);
        self.remove_attribute(ROWS_SPANNED);
    }

    /// True when this cell carries span extent attributes
    pub fn has_span(&self) -> bool {
        self.has_attribute(COLUMNS_SPANNED) || self.has_attribute(ROWS_SPANNED)
    }

    /// True when this cell is the origin of a span covering more than itself
    pub fn is_spanned(&self) -> bool {
        self.span() != (1, 1)
    }

    /// Remove value, formula and content; style and span state are kept
    pub fn clear(&mut self) {
        self.clear_value();
        self.remove_attribute(FORMULA);
        self.element.clear_children();
    }

    /// A cell is empty when it has no value, formula, content or span state.
    ///
    /// A style alone makes a cell non-empty unless `aggressive` is set.
    pub fn is_empty(&self, aggressive: bool) -> bool {
        if self.is_covered() || self.has_span() {
            return false;
        }
        if self.has_attribute("office:value-type") || self.formula().is_some() {
            return false;
        }
        if self.element.children().iter().any(|n| !n.is_blank_text()) {
            return false;
        }
        aggressive || self.style().is_none()
    }
}

/// Build a `text:p` element, encoding tabs and runs of spaces as ODF
/// whitespace elements.
pub(crate) fn paragraph(line: &str) -> Element {
    let mut p = Element::new("text:p");
    let mut pending = String::new();
    let mut chars = line.chars().peekable();
    let mut at_start = true;

    while let Some(c) = chars.next() {
        match c {
            '\t' => {
                p.push_text(&std::mem::take(&mut pending));
                p.push_child(Element::new("text:tab"));
            },
            ' ' => {
                let mut count = 1;
                while chars.peek() == Some(&' ') {
                    chars.next();
                    count += 1;
                }
                // A single space survives unless it starts or ends the paragraph.
                let keep_one = !at_start && chars.peek().is_some();
                if keep_one {
                    pending.push(' ');
                    count -= 1;
                }
                if count > 0 {
                    p.push_text(&std::mem::take(&mut pending));
                    let mut space = Element::new("text:s");
                    if count > 1 {
                        space.set_attribute("text:c", itoa::Buffer::new().format(count));
                    }
                    p.push_child(space);
                }
            },
            _ => pending.push(c),
        }
        at_start = false;
    }
    p.push_text(&pending);
    p
}
