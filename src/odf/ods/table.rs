//! Tables of an ODS spreadsheet.
//!
//! A [`Table`] keeps two run stores: one for column definitions and one for
//! rows, each row holding its own run store of cells. Logical coordinates are
//! resolved through the position indexes, so reads and writes never expand
//! the repeated runs of the file.
//!
//! # Examples
//!
//! ```
//! use longan::odf::ods::{CellValue, Table};
//!
//! let mut table = Table::new("Sheet1", 3, 1000);
//! assert_eq!(table.size(), (3, 1000));
//!
//! table.set_value((1, 0), "x").unwrap();
//! table.set_value("C4", 2.5).unwrap();
//! assert_eq!(table.value((-1, 3)).unwrap(), CellValue::Number(2.5));
//!
//! table.rstrip(false);
//! assert_eq!(table.size(), (3, 4));
//! ```

use crate::common::Result;
use crate::odf::coordinates::{AxisIndex, CellCoord, CellRange, IntoArea, IntoCoord};
use crate::odf::elements::{Element, ElementBase, ElementKind, Node, OdfElement};
use crate::odf::ods::cell::{Cell, CellValue};
use crate::odf::ods::column::Column;
use crate::odf::ods::row::Row;
use crate::odf::ods::store::{Repeated, RunMut, RunStore};
use tracing::{debug, trace};

pub(crate) const TABLE_TAG: &str = "table:table";

/// A `table:table` element with run-length compressed rows and columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    element: Element,
    /// Children placed before the column definitions
    prelude: Vec<Node>,
    /// Children placed after the rows
    epilogue: Vec<Node>,
    columns: RunStore<Column>,
    rows: RunStore<Row>,
}

impl ElementBase for Table {
    fn element(&self) -> &Element {
        &self.element
    }

    fn element_mut(&mut self) -> &mut Element {
        &mut self.element
    }
}

impl OdfElement for Table {
    const KINDS: &'static [ElementKind] = &[ElementKind::Table];

    fn wrap(mut element: Element) -> Self {
        let mut table = Self {
            prelude: Vec::new(),
            epilogue: Vec::new(),
            columns: RunStore::new(),
            rows: RunStore::new(),
            element: Element::default(),
        };
        let mut columns = Vec::new();
        let mut rows = Vec::new();
        for node in element.take_children() {
            table.load_node(node, false, &mut columns, &mut rows);
        }
        table.element = element;
        table.columns = RunStore::from_items(columns);
        table.rows = RunStore::from_items(rows);

        let max_row_width = table.rows.runs().iter().map(Row::width).max().unwrap_or(0);
        table.update_width(max_row_width);

        debug!(
            table = table.name(),
            width = table.width(),
            height = table.height(),
            row_runs = table.rows.run_count(),
            column_runs = table.columns.run_count(),
            "loaded table"
        );
        table
    }

    fn to_element(&self) -> Element {
        let mut element = self.element.clone();
        element.children_mut().extend(self.prelude.iter().cloned());

        let width = self.width();
        let mut header_columns: Option<Element> = None;
        for column in self.columns.runs() {
            let child = column.to_element();
            if column.is_header() {
                header_columns
                    .get_or_insert_with(|| Element::new("table:table-header-columns"))
                    .push_child(child);
            } else {
                if let Some(group) = header_columns.take() {
                    element.push_child(group);
                }
                element.push_child(child);
            }
        }
        if let Some(group) = header_columns.take() {
            element.push_child(group);
        }

        let mut header_rows: Option<Element> = None;
        for row in self.rows.runs() {
            let mut child = row.to_element();
            // A row must hold at least one cell.
            if row.width() == 0 {
                child.push_child(Cell::new().repeated_by(width.max(1)).into_element());
            }
            if row.is_header() {
                header_rows
                    .get_or_insert_with(|| Element::new("table:table-header-rows"))
                    .push_child(child);
            } else {
                if let Some(group) = header_rows.take() {
                    element.push_child(group);
                }
                element.push_child(child);
            }
        }
        if let Some(group) = header_rows.take() {
            element.push_child(group);
        }

        element.children_mut().extend(self.epilogue.iter().cloned());
        element
    }
}

impl Table {
    /// A table of `width` x `height` empty cells, stored as single runs
    pub fn new(name: &str, width: usize, height: usize) -> Self {
        let mut table = Self {
            element: Element::new(TABLE_TAG).with_attribute("table:name", name),
            prelude: Vec::new(),
            epilogue: Vec::new(),
            columns: RunStore::new(),
            rows: RunStore::new(),
        };
        if width > 0 {
            table.columns.append(Column::new().repeated_by(width));
        }
        if height > 0 {
            table
                .rows
                .append(Row::with_width(width).repeated_by(height));
        }
        table
    }

    fn load_node(&mut self, node: Node, header: bool, columns: &mut Vec<Column>, rows: &mut Vec<Row>) {
        let element = match node {
            Node::Element(e) => e,
            Node::Text(ref t) if t.trim().is_empty() => return,
            other => {
                self.keep_other(other, columns, rows);
                return;
            },
        };

        let kind = ElementKind::of(&element);
        match kind {
            ElementKind::TableColumn => {
                let mut column = Column::wrap(element);
                column.set_header(header);
                columns.push(column);
            },
            ElementKind::TableRow => {
                let mut row = Row::wrap(element);
                row.set_header(header);
                rows.push(row);
            },
            _ if kind.is_column_container() || kind.is_row_container() => {
                let nested = header
                    || matches!(
                        kind,
                        ElementKind::TableHeaderColumns | ElementKind::TableHeaderRows
                    );
                let mut element = element;
                for child in element.take_children() {
                    self.load_node(child, nested, columns, rows);
                }
            },
            _ => self.keep_other(Node::Element(element), columns, rows),
        }
    }

    fn keep_other(&mut self, node: Node, columns: &[Column], rows: &[Row]) {
        if columns.is_empty() && rows.is_empty() {
            self.prelude.push(node);
        } else {
            self.epilogue.push(node);
        }
    }

    /// Serialize the table element
    pub fn to_xml_string(&self) -> String {
        self.to_element().to_xml_string()
    }

    /// `table:name`
    pub fn name(&self) -> &str {
        self.get_attribute("table:name").unwrap_or_default()
    }

    pub fn set_name(&mut self, name: &str) {
        self.set_attribute("table:name", name);
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

    /// Number of logical rows
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of logical columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// `(width, height)`
    pub fn size(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    /// Stored row runs
    pub fn row_runs(&self) -> &RunStore<Row> {
        &self.rows
    }

    /// Stored column runs
    pub fn column_runs(&self) -> &RunStore<Column> {
        &self.columns
    }

    /// Every logical row in order
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    /// Every logical column in order
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    /// True when every cell is empty
    pub fn is_empty(&self, aggressive: bool) -> bool {
        self.rows.runs().iter().all(|row| row.is_empty(aggressive))
    }

    /// Remove every row and column
    pub fn clear(&mut self) {
        self.rows.clear();
        self.columns.clear();
    }

    /// Append column definitions until the table is at least `width` wide.
    /// The width never shrinks here.
    pub fn update_width(&mut self, width: usize) {
        let current = self.width();
        if width > current {
            trace!(from = current, to = width, "extending table columns");
            self.columns.append(Column::new().repeated_by(width - current));
        }
    }

    fn grow_rows_to(&mut self, height: usize) {
        let current = self.height();
        if height > current {
            let filler = Row::with_width(self.width()).repeated_by(height - current);
            self.rows.append(filler);
        }
    }

    fn grow_columns_to(&mut self, width: usize) {
        self.update_width(width);
    }

    // Rows

    /// The stored row covering `y`, `None` past the table height
    pub fn row_ref(&self, y: usize) -> Option<&Row> {
        self.rows.get(y)
    }

    /// Copy of the row at `y` with a repeat of 1; an empty row past the height
    pub fn row<Y: AxisIndex>(&self, y: Y) -> Result<Row> {
        let y = y.resolve(self.height())?;
        Ok(self
            .rows
            .get(y)
            .map_or_else(Row::new, |row| row.with_repeated(1)))
    }

    /// The row at `y` as a run of its own, growing the table when needed.
    ///
    /// Setting the repeat of the returned row changes the table height.
    /// Column definitions are not updated for cells added through the
    /// returned row; call [`Table::update_width`] afterwards if needed.
    pub fn row_mut<Y: AxisIndex>(&mut self, y: Y) -> Result<RunMut<'_, Row>> {
        let y = y.resolve(self.height())?;
        self.grow_rows_to(y + 1);
        self.rows.isolate(y)
    }

    fn stored_row_mut(&mut self, y: usize) -> Result<&mut Row> {
        self.grow_rows_to(y + 1);
        self.rows.isolate_in_place(y)
    }

    /// Overwrite the rows starting at `y` with `row` (all of its repeats).
    ///
    /// Header membership belongs to the position: the new rows are header
    /// rows exactly when the row previously at `y` was one.
    pub fn set_row<Y: AxisIndex>(&mut self, y: Y, mut row: Row) -> Result<()> {
        let y = y.resolve(self.height())?;
        self.grow_rows_to(y + 1);
        row.set_header(self.rows.get(y).is_some_and(Row::is_header));
        let width = row.width();
        self.rows.set(y, row)?;
        self.update_width(width);
        Ok(())
    }

    /// Insert `row` before `y`, shifting the following rows down
    pub fn insert_row<Y: AxisIndex>(&mut self, y: Y, row: Row) -> Result<()> {
        let y = y.resolve(self.height())?;
        self.grow_rows_to(y);
        let width = row.width();
        self.rows.insert(y, row)?;
        self.update_width(width);
        Ok(())
    }

    /// Add `row` after the last row
    pub fn append_row(&mut self, row: Row) {
        let width = row.width();
        self.rows.append(row);
        self.update_width(width);
    }

    /// Remove the row at `y`; positions past the height are left alone
    pub fn delete_row<Y: AxisIndex>(&mut self, y: Y) -> Result<()> {
        let y = y.resolve(self.height())?;
        if y >= self.height() {
            return Ok(());
        }
        self.rows.delete(y)
    }

    /// Values of row `y`, padded with empty values to the table width
    pub fn row_values<Y: AxisIndex>(&self, y: Y) -> Result<Vec<CellValue>> {
        let y = y.resolve(self.height())?;
        let mut values = match self.rows.get(y) {
            Some(row) => row.values()?,
            None => Vec::new(),
        };
        if values.len() < self.width() {
            values.resize(self.width(), CellValue::Empty);
        }
        Ok(values)
    }

    /// Set values of row `y` from column 0 on
    pub fn set_row_values<Y, V, I>(&mut self, y: Y, values: I) -> Result<()>
    where
        Y: AxisIndex,
        V: Into<CellValue>,
        I: IntoIterator<Item = V>,
    {
        let y = y.resolve(self.height())?;
        let row = self.stored_row_mut(y)?;
        row.set_values(0usize, values)?;
        let width = row.width();
        self.update_width(width);
        Ok(())
    }

    // Columns

    /// Copy of the column at `x` with a repeat of 1; a default column past the width
    pub fn column<X: AxisIndex>(&self, x: X) -> Result<Column> {
        let x = x.resolve(self.width())?;
        Ok(self
            .columns
            .get(x)
            .map_or_else(Column::new, |column| column.with_repeated(1)))
    }

    /// The column at `x` as a run of its own, growing the table when needed.
    ///
    /// Setting the repeat of the returned column changes the table width;
    /// stored rows are left as they are.
    pub fn column_mut<X: AxisIndex>(&mut self, x: X) -> Result<RunMut<'_, Column>> {
        let x = x.resolve(self.width())?;
        self.grow_columns_to(x + 1);
        self.columns.isolate(x)
    }

    /// Overwrite the column definitions starting at `x` with `column`
    pub fn set_column<X: AxisIndex>(&mut self, x: X, column: Column) -> Result<()> {
        let x = x.resolve(self.width())?;
        self.grow_columns_to(x + 1);
        self.columns.set(x, column)
    }

    /// Insert `column` before `x`. Every stored row gets matching empty cells
    /// at `x` so cell positions stay aligned with the columns.
    pub fn insert_column<X: AxisIndex>(&mut self, x: X, column: Column) -> Result<()> {
        let x = x.resolve(self.width())?;
        self.grow_columns_to(x);
        let repeat = column.repeated();
        self.columns.insert(x, column)?;
        self.rows.edit_runs(|row| {
            if x < row.width() {
                row.insert_cell(x, Cell::new().repeated_by(repeat))?;
            }
            Ok(())
        })?;
        debug!(table = self.name(), column = x, repeat, "inserted column");
        Ok(())
    }

    /// Add `column` after the last column
    pub fn append_column(&mut self, column: Column) {
        self.columns.append(column);
    }

    /// Remove column `x` and the cell at `x` of every row
    pub fn delete_column<X: AxisIndex>(&mut self, x: X) -> Result<()> {
        let x = x.resolve(self.width())?;
        if x >= self.width() {
            return Ok(());
        }
        self.columns.delete(x)?;
        self.rows.edit_runs(|row| row.delete_cell(x))?;
        debug!(table = self.name(), column = x, "deleted column");
        Ok(())
    }

    /// Values of column `x`, one per logical row
    pub fn column_values<X: AxisIndex>(&self, x: X) -> Result<Vec<CellValue>> {
        let x = x.resolve(self.width())?;
        let mut values = Vec::with_capacity(self.height());
        for row in self.rows.runs() {
            let value = row.value(x)?;
            values.extend(std::iter::repeat_n(value, row.repeated()));
        }
        Ok(values)
    }

    /// Set values of column `x` from row 0 on
    pub fn set_column_values<X, V, I>(&mut self, x: X, values: I) -> Result<()>
    where
        X: AxisIndex,
        V: Into<CellValue>,
        I: IntoIterator<Item = V>,
    {
        let x = x.resolve(self.width())?;
        for (y, value) in values.into_iter().enumerate() {
            self.set_value(CellCoord::new(x, y), value)?;
        }
        Ok(())
    }

    // Cells

    fn resolve_coord<C: IntoCoord>(&self, coord: C) -> Result<CellCoord> {
        coord.resolve(self.width(), self.height())
    }

    /// Copy of the cell at `coord`; an empty cell outside the stored area
    pub fn cell<C: IntoCoord>(&self, coord: C) -> Result<Cell> {
        let coord = self.resolve_coord(coord)?;
        match self.rows.get(coord.row()) {
            Some(row) => row.cell(coord.column()),
            None => Ok(Cell::new()),
        }
    }

    /// The cell at `coord` as a run of its own, growing the table when needed.
    ///
    /// Setting the repeat of the returned cell shifts the rest of its row;
    /// column definitions follow only through [`Table::update_width`].
    pub fn cell_mut<C: IntoCoord>(&mut self, coord: C) -> Result<RunMut<'_, Cell>> {
        let coord = self.resolve_coord(coord)?;
        self.update_width(coord.column() + 1);
        self.stored_row_mut(coord.row())?.cell_mut(coord.column())
    }

    /// Overwrite the cell at `coord`
    pub fn set_cell<C: IntoCoord>(&mut self, coord: C, cell: Cell) -> Result<()> {
        let coord = self.resolve_coord(coord)?;
        let row = self.stored_row_mut(coord.row())?;
        row.set_cell(coord.column(), cell)?;
        let width = row.width();
        self.update_width(width);
        Ok(())
    }

    /// Insert `cell` at `coord`, shifting the rest of that row right
    pub fn insert_cell<C: IntoCoord>(&mut self, coord: C, cell: Cell) -> Result<()> {
        let coord = self.resolve_coord(coord)?;
        let row = self.stored_row_mut(coord.row())?;
        row.insert_cell(coord.column(), cell)?;
        let width = row.width();
        self.update_width(width);
        Ok(())
    }

    /// Append `cell` to row `y`
    pub fn append_cell<Y: AxisIndex>(&mut self, y: Y, cell: Cell) -> Result<()> {
        let y = y.resolve(self.height())?;
        let row = self.stored_row_mut(y)?;
        row.append_cell(cell);
        let width = row.width();
        self.update_width(width);
        Ok(())
    }

    /// Remove the cell at `coord`, shifting the rest of that row left
    pub fn delete_cell<C: IntoCoord>(&mut self, coord: C) -> Result<()> {
        let coord = self.resolve_coord(coord)?;
        if coord.row() >= self.height() {
            return Ok(());
        }
        self.stored_row_mut(coord.row())?.delete_cell(coord.column())
    }

    /// Value of the cell at `coord`; empty outside the stored area
    pub fn value<C: IntoCoord>(&self, coord: C) -> Result<CellValue> {
        let coord = self.resolve_coord(coord)?;
        match self.rows.get(coord.row()) {
            Some(row) => row.value(coord.column()),
            None => Ok(CellValue::Empty),
        }
    }

    /// Set the value of the cell at `coord`, keeping its style
    pub fn set_value<C: IntoCoord>(&mut self, coord: C, value: impl Into<CellValue>) -> Result<()> {
        self.cell_mut(coord)?.set_value(value);
        Ok(())
    }

    /// Values of the whole table, one vector per logical row
    pub fn values(&self) -> Result<Vec<Vec<CellValue>>> {
        let width = self.width();
        let mut values = Vec::with_capacity(self.height());
        for row in self.rows.runs() {
            let mut line = row.values()?;
            line.resize(width, CellValue::Empty);
            values.extend(std::iter::repeat_n(line, row.repeated()));
        }
        Ok(values)
    }

    /// Values of a rectangular area; positions outside the table read as empty
    pub fn values_in<A: IntoArea>(&self, area: A) -> Result<Vec<Vec<CellValue>>> {
        let area = area.resolve(self.width(), self.height())?;
        let mut values = Vec::with_capacity(area.height());
        for y in area.start().row()..=area.end().row() {
            let mut line = Vec::with_capacity(area.width());
            for x in area.start().column()..=area.end().column() {
                line.push(match self.rows.get(y) {
                    Some(row) => row.value(x)?,
                    None => CellValue::Empty,
                });
            }
            values.push(line);
        }
        Ok(values)
    }

    /// Write rows of values with their top-left corner at `origin`
    pub fn set_values<C, V, R, I>(&mut self, origin: C, rows: I) -> Result<()>
    where
        C: IntoCoord,
        V: Into<CellValue>,
        R: IntoIterator<Item = V>,
        I: IntoIterator<Item = R>,
    {
        let origin = self.resolve_coord(origin)?;
        let mut width = 0;
        for (dy, line) in rows.into_iter().enumerate() {
            let row = self.stored_row_mut(origin.row() + dy)?;
            row.set_values(origin.column(), line)?;
            width = width.max(row.width());
        }
        self.update_width(width);
        Ok(())
    }

    /// Copies of the cells of a rectangular area, each with a repeat of 1
    pub fn cells_in<A: IntoArea>(&self, area: A) -> Result<Vec<Vec<Cell>>> {
        let area = area.resolve(self.width(), self.height())?;
        let mut cells = Vec::with_capacity(area.height());
        for y in area.start().row()..=area.end().row() {
            let mut line = Vec::with_capacity(area.width());
            for x in area.start().column()..=area.end().column() {
                line.push(match self.rows.get(y) {
                    Some(row) => row.cell(x)?,
                    None => Cell::new(),
                });
            }
            cells.push(line);
        }
        Ok(cells)
    }

    /// Write rows of cells with their top-left corner at `origin`.
    /// Each cell covers exactly one position.
    pub fn set_cells<C: IntoCoord>(&mut self, origin: C, cells: Vec<Vec<Cell>>) -> Result<()> {
        let origin = self.resolve_coord(origin)?;
        let mut width = 0;
        for (dy, line) in cells.into_iter().enumerate() {
            let row = self.stored_row_mut(origin.row() + dy)?;
            for (dx, mut cell) in line.into_iter().enumerate() {
                cell.set_repeated(1);
                row.set_cell(origin.column() + dx, cell)?;
            }
            width = width.max(row.width());
        }
        self.update_width(width);
        Ok(())
    }

    // Whole-table maintenance

    /// Remove trailing empty rows, trailing empty cells of every row, and
    /// column definitions past the widest remaining row.
    ///
    /// With `aggressive`, cells and rows that only carry a style count as empty.
    pub fn rstrip(&mut self, aggressive: bool) {
        let before = self.size();
        while self
            .rows
            .runs()
            .last()
            .is_some_and(|row| row.is_empty(aggressive))
        {
            self.rows.pop_run();
        }

        let mut max_width = 0;
        self.rows.for_each_run_mut(|row| {
            row.rstrip(aggressive);
            max_width = max_width.max(row.width());
        });
        self.columns.truncate(max_width);

        debug!(
            table = self.name(),
            ?before,
            after = ?self.size(),
            aggressive,
            "stripped table"
        );
    }

    /// Give every row the same minimal width and collapse trailing empty rows
    /// into a single one. Column definitions are cut or padded to match.
    pub fn optimize_width(&mut self) {
        let before = self.size();
        let mut trimmed = false;
        while self
            .rows
            .runs()
            .last()
            .is_some_and(|row| row.is_empty(false))
        {
            self.rows.pop_run();
            trimmed = true;
        }

        let width = self
            .rows
            .runs()
            .iter()
            .map(Row::minimized_width)
            .max()
            .unwrap_or(0);
        if trimmed {
            self.rows.append(Row::new());
        }
        self.rows.for_each_run_mut(|row| {
            row.force_width(width);
            row.coalesce();
        });

        if width < self.width() {
            self.columns.truncate(width);
        } else {
            self.update_width(width);
        }

        debug!(
            table = self.name(),
            ?before,
            after = ?self.size(),
            "optimized table width"
        );
    }

    /// Swap rows and columns of the whole table.
    ///
    /// Cells keep their content and style. Row and column definitions are
    /// reset to defaults since their styles do not carry over across axes.
    pub fn transpose(&mut self) -> Result<()> {
        let (width, height) = self.size();
        if width == 0 || height == 0 {
            return Ok(());
        }
        let cells = self.cells_in(CellRange::from_bounds(0, 0, width - 1, height - 1))?;

        let mut rows = RunStore::new();
        for x in 0..width {
            let mut row = Row::new();
            for line in &cells {
                row.append_cell(line[x].clone());
            }
            row.coalesce();
            rows.append(row);
        }
        self.rows = rows;
        self.columns.clear();
        self.columns.append(Column::new().repeated_by(height));

        debug!(table = self.name(), from = ?(width, height), to = ?self.size(), "transposed table");
        Ok(())
    }

    /// Swap rows and columns inside `area`, anchored at its top-left corner.
    ///
    /// When the area is not square, the part of the original area not
    /// covered by the result is cleared.
    pub fn transpose_area<A: IntoArea>(&mut self, area: A) -> Result<()> {
        let area = area.resolve(self.width(), self.height())?;
        let cells = self.cells_in(area)?;
        let (w, h) = (area.width(), area.height());

        let transposed: Vec<Vec<Cell>> = (0..w)
            .map(|x| cells.iter().map(|line| line[x].clone()).collect())
            .collect();

        if w != h {
            let blank = vec![vec![Cell::new(); w]; h];
            self.set_cells(area.start(), blank)?;
        }
        self.set_cells(area.start(), transposed)?;

        debug!(table = self.name(), area = %area, "transposed area");
        Ok(())
    }
}
