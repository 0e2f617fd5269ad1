//! Rows of an ODS table.
//!
//! A [`Row`] owns its cells as a [`RunStore`], so a row of thousands of
//! identical empty cells is a single stored cell. Cells past the stored width
//! read as empty; writes past it grow the row first.

use crate::common::Result;
use crate::odf::coordinates::AxisIndex;
use crate::odf::elements::{Element, ElementBase, ElementKind, Node, OdfElement};
use crate::odf::ods::cell::{Cell, CellValue};
use crate::odf::ods::store::{Repeated, RunMut, RunStore};

pub(crate) const ROW_TAG: &str = "table:table-row";
pub(crate) const ROWS_REPEATED: &str = "table:number-rows-repeated";

/// A `table:table-row`, possibly standing for several identical rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    element: Element,
    cells: RunStore<Cell>,
    header: bool,
}

impl Default for Row {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementBase for Row {
    fn element(&self) -> &Element {
        &self.element
    }

    fn element_mut(&mut self) -> &mut Element {
        &mut self.element
    }
}

impl OdfElement for Row {
    const KINDS: &'static [ElementKind] = &[ElementKind::TableRow];

    fn wrap(mut element: Element) -> Self {
        let cells = element
            .take_children()
            .into_iter()
            .filter_map(|node| match node {
                Node::Element(e) if ElementKind::of(&e).is_cell() => {
                    Some(Cell::wrap(e))
                },
                _ => None,
            })
            .collect();
        Self {
            element,
            cells,
            header: false,
        }
    }

    fn to_element(&self) -> Element {
        let mut element = self.element.clone();
        for cell in self.cells.runs() {
            element.push_child(cell.to_element());
        }
        element
    }
}

impl Repeated for Row {
    fn repeated(&self) -> usize {
        self.get_usize_attribute(ROWS_REPEATED).unwrap_or(1).max(1)
    }

    fn set_repeated(&mut self, repeat: usize) {
        self.set_count_attribute(ROWS_REPEATED, repeat);
    }
}

impl Row {
    /// A row without cells
    pub fn new() -> Self {
        Self {
            element: Element::new(ROW_TAG),
            cells: RunStore::new(),
            header: false,
        }
    }

    /// A row of `width` empty cells, stored as one run
    pub fn with_width(width: usize) -> Self {
        let mut row = Self::new();
        row.force_width(width);
        row
    }

    /// A row holding the given values from column 0 on
    pub fn from_values<V: Into<CellValue>>(values: impl IntoIterator<Item = V>) -> Self {
        let mut row = Self::new();
        for value in values {
            row.append_cell(Cell::with_value(value));
        }
        row
    }

    /// Builder-style repeat setter
    pub fn repeated_by(mut self, repeat: usize) -> Self {
        self.set_repeated(repeat);
        self
    }

    /// Number of logical cells stored in the row
    pub fn width(&self) -> usize {
        self.cells.len()
    }

    /// Stored cell runs
    pub fn cell_runs(&self) -> &RunStore<Cell> {
        &self.cells
    }

    /// Every logical cell in order
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// The stored cell covering `x`, `None` past the row width
    pub fn cell_ref(&self, x: usize) -> Option<&Cell> {
        self.cells.get(x)
    }

    /// Copy of the cell at `x`, with a repeat of 1.
    ///
    /// Past the row width an empty cell is returned.
    pub fn cell<X: AxisIndex>(&self, x: X) -> Result<Cell> {
        let x = x.resolve(self.width())?;
        Ok(self
            .cells
            .get(x)
            .map_or_else(Cell::new, |cell| cell.with_repeated(1)))
    }

    /// The cell at `x` as a run of its own, growing the row when needed.
    ///
    /// Changing the repeat of the returned cell shifts the cells after it.
    pub fn cell_mut<X: AxisIndex>(&mut self, x: X) -> Result<RunMut<'_, Cell>> {
        let x = x.resolve(self.width())?;
        self.grow_to(x + 1);
        self.cells.isolate(x)
    }

    /// Overwrite the positions starting at `x` with `cell` (all of its repeats)
    pub fn set_cell<X: AxisIndex>(&mut self, x: X, cell: Cell) -> Result<()> {
        let x = x.resolve(self.width())?;
        self.grow_to(x + 1);
        self.cells.set(x, cell)
    }

    /// Insert `cell` before `x`, shifting the following cells right
    pub fn insert_cell<X: AxisIndex>(&mut self, x: X, cell: Cell) -> Result<()> {
        let x = x.resolve(self.width())?;
        self.grow_to(x);
        self.cells.insert(x, cell)
    }

    /// Add `cell` after the last stored cell
    pub fn append_cell(&mut self, cell: Cell) {
        self.cells.append(cell);
    }

    /// Remove the cell at `x`, shifting the following cells left.
    /// Positions past the row width are already empty and left alone.
    pub fn delete_cell<X: AxisIndex>(&mut self, x: X) -> Result<()> {
        let x = x.resolve(self.width())?;
        if x >= self.width() {
            return Ok(());
        }
        self.cells.delete(x)
    }

    /// Value of the cell at `x`
    pub fn value<X: AxisIndex>(&self, x: X) -> Result<CellValue> {
        let x = x.resolve(self.width())?;
        match self.cells.get(x) {
            Some(cell) => cell.value(),
            None => Ok(CellValue::Empty),
        }
    }

    /// Set the value at `x`, keeping the cell's style
    pub fn set_value<X: AxisIndex>(&mut self, x: X, value: impl Into<CellValue>) -> Result<()> {
        let x = x.resolve(self.width())?;
        self.grow_to(x + 1);
        self.cells.isolate_in_place(x)?.set_value(value);
        Ok(())
    }

    /// Values of every logical cell
    pub fn values(&self) -> Result<Vec<CellValue>> {
        let mut values = Vec::with_capacity(self.width());
        for cell in self.cells.runs() {
            let value = cell.value()?;
            values.extend(std::iter::repeat_n(value, cell.repeated()));
        }
        Ok(values)
    }

    /// Set consecutive values starting at `x`
    pub fn set_values<X, V, I>(&mut self, x: X, values: I) -> Result<()>
    where
        X: AxisIndex,
        V: Into<CellValue>,
        I: IntoIterator<Item = V>,
    {
        let x = x.resolve(self.width())?;
        for (offset, value) in values.into_iter().enumerate() {
            self.set_value(x + offset, value)?;
        }
        Ok(())
    }

    /// Drop trailing empty cells
    pub fn rstrip(&mut self, aggressive: bool) {
        while self
            .cells
            .runs()
            .last()
            .is_some_and(|cell| cell.is_empty(aggressive))
        {
            self.cells.pop_run();
        }
    }

    /// Width once trailing empty cells are ignored
    pub fn minimized_width(&self) -> usize {
        self.cells
            .iter_runs()
            .filter(|(_, cell)| !cell.is_empty(false))
            .last()
            .map_or(0, |(start, cell)| start + cell.repeated())
    }

    /// Pad with empty cells or cut the row to exactly `width` cells
    pub fn force_width(&mut self, width: usize) {
        let current = self.width();
        if width > current {
            self.cells.append(Cell::new().repeated_by(width - current));
        } else {
            self.cells.truncate(width);
        }
    }

    fn grow_to(&mut self, width: usize) {
        if width > self.width() {
            self.force_width(width);
        }
    }

    /// True when every cell is empty
    pub fn is_empty(&self, aggressive: bool) -> bool {
        self.cells.runs().iter().all(|cell| cell.is_empty(aggressive))
    }

    /// `table:style-name`
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

    /// Member of `table:table-header-rows`
    pub fn is_header(&self) -> bool {
        self.header
    }

    pub fn set_header(&mut self, header: bool) {
        self.header = header;
    }

    /// Remove every cell
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Merge adjacent identical cell runs
    pub fn coalesce(&mut self) {
        self.cells.coalesce();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> Row {
        Row::from_element(Element::parse(xml).unwrap()).unwrap()
    }

    #[test]
    fn test_load_repeated_cells() {
        let row = parse(
            r#"<table:table-row table:number-rows-repeated="2"><table:table-cell office:value-type="float" office:value="1"><text:p>1</text:p></table:table-cell><table:table-cell table:number-columns-repeated="3"/><table:covered-table-cell/></table:table-row>"#,
        );
        assert_eq!(row.repeated(), 2);
        assert_eq!(row.width(), 5);
        assert_eq!(row.cell_runs().run_count(), 3);
        assert_eq!(row.value(0).unwrap(), CellValue::Number(1.0));
        assert_eq!(row.value(3).unwrap(), CellValue::Empty);
        assert!(row.cell(-1).unwrap().is_covered());
    }

    #[test]
    fn test_reads_past_width_are_empty() {
        let row = Row::from_values(["a"]);
        assert_eq!(row.value(10).unwrap(), CellValue::Empty);
        assert!(row.cell(10).unwrap().is_empty(true));
        assert!(row.value(-2).is_err());
    }

    #[test]
    fn test_set_value_splits_repeated_cell() {
        let mut row = Row::with_width(6);
        row.set_value(2, "x").unwrap();
        assert_eq!(row.width(), 6);
        assert_eq!(row.cell_runs().run_count(), 3);
        let values = row.values().unwrap();
        assert_eq!(values[2], CellValue::from("x"));
        assert!(values.iter().enumerate().all(|(i, v)| i == 2 || v.is_empty()));
    }

    #[test]
    fn test_write_past_width_grows() {
        let mut row = Row::from_values([1, 2]);
        row.set_value(5, 6).unwrap();
        assert_eq!(row.width(), 6);
        assert_eq!(row.value(4).unwrap(), CellValue::Empty);
        assert_eq!(row.value(-1).unwrap(), CellValue::Number(6.0));
    }

    #[test]
    fn test_insert_and_delete_cells() {
        let mut row = Row::from_values(["a", "b", "c"]);
        row.insert_cell(1, Cell::with_value("x")).unwrap();
        assert_eq!(row.values().unwrap(), ["a", "x", "b", "c"].map(CellValue::from));
        row.delete_cell(0).unwrap();
        row.delete_cell(-1).unwrap();
        assert_eq!(row.values().unwrap(), ["x", "b"].map(CellValue::from));
        row.delete_cell(10).unwrap();
        assert_eq!(row.width(), 2);

        row.insert_cell(4, Cell::with_value("z")).unwrap();
        assert_eq!(row.width(), 5);
        assert_eq!(row.value(4).unwrap(), CellValue::from("z"));
    }

    #[test]
    fn test_set_value_keeps_style_of_repeated_cell() {
        let mut row = Row::new();
        row.append_cell(Cell::new().with_style("ce1").repeated_by(4));
        row.set_value(1, 3.5).unwrap();
        assert_eq!(row.cell(1).unwrap().style(), Some("ce1"));
        assert_eq!(row.cell(0).unwrap().value().unwrap(), CellValue::Empty);
        assert_eq!(row.cell_runs().run_count(), 3);
    }

    #[test]
    fn test_rstrip_and_minimized_width() {
        let mut row = Row::from_values(["a"]);
        row.append_cell(Cell::new().with_style("ce1"));
        row.append_cell(Cell::new().repeated_by(1000));
        assert_eq!(row.width(), 1002);
        assert_eq!(row.minimized_width(), 2);

        let mut lenient = row.clone();
        lenient.rstrip(false);
        assert_eq!(lenient.width(), 2);

        row.rstrip(true);
        assert_eq!(row.width(), 1);
        assert!(!row.is_empty(true));
        row.clear();
        assert!(row.is_empty(false));
    }

    #[test]
    fn test_cell_repeat_change_shifts_following_cells() {
        let mut row = Row::from_values(["a", "b"]);
        row.cell_mut(0).unwrap().set_repeated(3);
        assert_eq!(row.width(), 4);
        assert_eq!(row.values().unwrap(), ["a", "a", "a", "b"].map(CellValue::from));
        row.set_value(-1, "c").unwrap();
        assert_eq!(row.value(3).unwrap(), CellValue::from("c"));
        row.cell_runs().check().unwrap();
    }

    #[test]
    fn test_force_width() {
        let mut row = Row::from_values(["a", "b", "c"]);
        row.force_width(5);
        assert_eq!(row.width(), 5);
        assert_eq!(row.cell_runs().run_count(), 4);
        row.force_width(2);
        assert_eq!(row.values().unwrap(), ["a", "b"].map(CellValue::from));
    }

    #[test]
    fn test_to_element_writes_runs() {
        let mut row = Row::with_width(4);
        row.set_value(0, "a").unwrap();
        let xml = row.to_element().to_xml_string();
        assert_eq!(
            xml,
            r#"<table:table-row><table:table-cell office:value-type="string"><text:p>a</text:p></table:table-cell><table:table-cell table:number-columns-repeated="3"/></table:table-row>"#
        );
    }
}
