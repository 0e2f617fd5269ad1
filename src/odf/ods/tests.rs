//! Scenario and property tests for the table engine.

use crate::odf::coordinates::CellRange;
use crate::odf::elements::{Element, ElementBase, OdfElement};
use crate::odf::ods::{Cell, CellValue, Column, Repeated, Row, Table};
use proptest::prelude::*;

fn text(s: &str) -> CellValue {
    CellValue::Text(s.to_string())
}

/// Three single rows and a fourth row, two columns
fn four_row_table() -> Table {
    let mut table = Table::new("Scenario", 2, 0);
    table.append_row(Row::from_values(["a1", "b1"]));
    table.append_row(Row::from_values(["a2", "b2"]));
    table.append_row(Row::from_values(["a3", "b3"]));
    table.append_row(Row::from_values(["a4", "b4"]));
    table
}

#[test]
fn set_column_inside_a_run_splits_it() {
    let mut table = Table::new("Columns", 0, 1);
    table.append_column(Column::with_style("co1").repeated_by(10));
    assert_eq!(table.column_runs().run_count(), 1);

    table.set_column(5, Column::with_style("co2")).unwrap();

    assert_eq!(table.width(), 10);
    assert_eq!(table.column_runs().run_count(), 3);
    for x in 0..10 {
        let expected = if x == 5 { "co2" } else { "co1" };
        assert_eq!(table.column(x).unwrap().style(), Some(expected), "column {}", x);
    }
    let repeats: Vec<usize> = table.column_runs().runs().iter().map(Repeated::repeated).collect();
    assert_eq!(repeats, vec![5, 1, 4]);
}

#[test]
fn overlapping_span_is_rejected() {
    let mut table = Table::new("Spans", 4, 4);
    assert!(table.set_span((0, 0, 1, 1), false).unwrap());
    let spans = table.spans();

    assert!(!table.set_span((0, 0, 0, 1), false).unwrap());
    assert!(!table.set_span((1, 1, 2, 2), false).unwrap());

    assert_eq!(table.spans(), spans);
    assert_eq!(
        table.span_area((1, 1)).unwrap(),
        Some(CellRange::from_bounds(0, 0, 1, 1))
    );
    assert!(table.is_spanned((0, 0)).unwrap());
    assert!(!table.is_spanned((2, 2)).unwrap());
}

#[test]
fn negative_row_index_counts_from_the_end() {
    let mut table = four_row_table();
    table.row_mut(3).unwrap().set_style(Some("ro2"));
    assert_eq!(table.height(), 4);
    assert_eq!(table.row(-1).unwrap(), table.row(3).unwrap());
    assert_eq!(table.value((-1, -1)).unwrap(), text("b4"));
    assert!(table.row(-5).is_err());
}

#[test]
fn single_cell_write_leaves_neighbours_alone() {
    let mut table = four_row_table();
    let before = table.values().unwrap();

    table.set_value((1, 0), "x").unwrap();

    let after = table.values().unwrap();
    for (y, (old, new)) in before.iter().zip(&after).enumerate() {
        for (x, (a, b)) in old.iter().zip(new).enumerate() {
            if (x, y) == (1, 0) {
                assert_eq!(b, &text("x"));
            } else {
                assert_eq!(a, b, "cell ({}, {}) changed", x, y);
            }
        }
    }
    assert_eq!(table.size(), (2, 4));
}

#[test]
fn appending_a_wide_row_extends_columns() {
    let mut table = four_row_table();
    let before = table.values().unwrap();

    table.append_row(Row::from_values(["1", "2", "3", "4", "5", "6", "7"]));

    assert_eq!(table.width(), 7);
    assert_eq!(table.height(), 5);
    for (y, old) in before.iter().enumerate() {
        let row = table.row_values(y).unwrap();
        assert_eq!(&row[..2], &old[..]);
        assert!(row[2..].iter().all(CellValue::is_empty));
    }
}

#[test]
fn rstrip_is_idempotent() {
    let mut table = Table::new("Strip", 30, 200);
    table.set_value((3, 4), 1.0).unwrap();
    table.set_value((1, 9), "z").unwrap();
    table.cell_mut((20, 2)).unwrap().set_style(Some("ce1"));

    table.rstrip(false);
    let once = table.clone();
    table.rstrip(false);
    assert_eq!(table, once);
    assert_eq!(table.size(), (21, 10));

    table.rstrip(true);
    let once = table.clone();
    table.rstrip(true);
    assert_eq!(table, once);
    assert_eq!(table.size(), (4, 10));
}

#[test]
fn repeated_runs_survive_serialization() {
    let xml = r#"<table:table table:name="Sheet1">
  <table:table-column table:number-columns-repeated="3"/>
  <table:table-row table:number-rows-repeated="1000">
    <table:table-cell table:number-columns-repeated="3"/>
  </table:table-row>
</table:table>"#;
    let mut table = Table::from_element(Element::parse(xml).unwrap()).unwrap();
    assert_eq!(table.size(), (3, 1000));
    assert_eq!(table.row_runs().run_count(), 1);

    table.set_value((1, 500), 7.0).unwrap();
    assert_eq!(table.row_runs().run_count(), 3);

    let element = table.to_element();
    let rows: Vec<&Element> = element
        .child_elements()
        .filter(|e| e.tag() == "table:table-row")
        .collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].get_usize_attribute("table:number-rows-repeated"), Some(500));
    assert_eq!(rows[1].get_attribute("table:number-rows-repeated"), None);
    assert_eq!(rows[2].get_usize_attribute("table:number-rows-repeated"), Some(499));

    let reloaded = Table::from_element(element).unwrap();
    assert_eq!(reloaded.size(), (3, 1000));
    assert_eq!(reloaded.value((1, 500)).unwrap(), CellValue::Number(7.0));
    assert_eq!(reloaded.value((1, 499)).unwrap(), CellValue::Empty);
}

#[test]
fn merged_span_joins_values() {
    let mut table = Table::new("Merge", 3, 3);
    table.set_values((0, 0), [["a", "b"], ["c", "d"]]).unwrap();

    assert!(table.set_span("A1:B2", true).unwrap());
    assert_eq!(table.value((0, 0)).unwrap(), text("a b c d"));
    assert!(table.cell((1, 1)).unwrap().is_covered());
    assert_eq!(table.cell((0, 0)).unwrap().span(), (2, 2));

    assert!(table.del_span((0, 0)).unwrap());
    assert!(!table.del_span((0, 0)).unwrap());
    assert!(!table.cell((1, 1)).unwrap().is_covered());
    assert!(table.spans().is_empty());
}

#[test]
fn deleting_every_row_and_column_is_allowed() {
    let mut table = Table::new("Small", 1, 1);
    table.delete_row(0).unwrap();
    table.delete_column(0).unwrap();
    assert_eq!(table.size(), (0, 0));
    assert!(table.values().unwrap().is_empty());
}

#[test]
fn insert_column_edits_stored_runs_only() {
    let mut table = Table::new("Wide", 2, 100_000);
    table.set_value((1, 0), "right").unwrap();

    table.insert_column(0, Column::new()).unwrap();

    assert_eq!(table.size(), (3, 100_000));
    assert_eq!(table.row_runs().run_count(), 2);
    assert_eq!(table.value((2, 0)).unwrap(), text("right"));
    assert_eq!(table.row(99_999).unwrap().width(), 3);
}

#[test]
fn cell_copies_are_independent() {
    let mut table = Table::new("Copies", 5, 1);
    let mut copy = table.cell((2, 0)).unwrap();
    copy.set_value("changed");
    assert_eq!(table.value((2, 0)).unwrap(), CellValue::Empty);

    table.set_cell((2, 0), copy).unwrap();
    assert_eq!(table.value((2, 0)).unwrap(), text("changed"));
    assert_eq!(table.cell((2, 0)).unwrap().repeated(), 1);
    assert_eq!(table.row(0).unwrap().cell_runs().run_count(), 3);
    assert_eq!(Cell::new().repeated(), 1);
}

/// One materialised cell of the reference model
#[derive(Debug, Clone, Default, PartialEq)]
struct ModelCell {
    value: Option<String>,
    span: Option<(usize, usize)>,
    covered: bool,
}

impl ModelCell {
    fn with_value(s: &str) -> Self {
        Self {
            value: Some(s.to_string()),
            ..Self::default()
        }
    }

    fn is_empty(&self) -> bool {
        self.value.is_none() && self.span.is_none() && !self.covered
    }
}

/// Fully materialised reference model of a table. Each row holds exactly
/// as many cells as the stored row it mirrors.
#[derive(Debug, Default)]
struct Model {
    width: usize,
    cells: Vec<Vec<ModelCell>>,
}

impl Model {
    fn height(&self) -> usize {
        self.cells.len()
    }

    fn widen(&mut self, width: usize) {
        self.width = self.width.max(width);
    }

    fn heighten(&mut self, height: usize) {
        let width = self.width;
        if height > self.height() {
            self.cells.resize(height, vec![ModelCell::default(); width]);
        }
    }

    fn cell(&self, x: usize, y: usize) -> ModelCell {
        self.cells
            .get(y)
            .and_then(|row| row.get(x))
            .cloned()
            .unwrap_or_default()
    }

    fn read(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> Vec<Vec<ModelCell>> {
        (y0..=y1)
            .map(|y| (x0..=x1).map(|x| self.cell(x, y)).collect())
            .collect()
    }

    fn write(&mut self, x0: usize, y0: usize, grid: Vec<Vec<ModelCell>>) {
        let mut width = 0;
        for (dy, line) in grid.into_iter().enumerate() {
            self.heighten(y0 + dy + 1);
            let row = &mut self.cells[y0 + dy];
            for (dx, cell) in line.into_iter().enumerate() {
                if row.len() <= x0 + dx {
                    row.resize(x0 + dx + 1, ModelCell::default());
                }
                row[x0 + dx] = cell;
            }
            width = width.max(row.len());
        }
        self.widen(width);
    }

    fn apply(&mut self, op: &Op) -> Option<bool> {
        match op {
            Op::SetValue(x, y, s) => {
                self.widen(x + 1);
                self.heighten(y + 1);
                let row = &mut self.cells[*y];
                if row.len() <= *x {
                    row.resize(x + 1, ModelCell::default());
                }
                row[*x].value = Some(s.clone());
            },
            Op::InsertCell(x, y, s) => {
                self.heighten(y + 1);
                let row = &mut self.cells[*y];
                if row.len() < *x {
                    row.resize(*x, ModelCell::default());
                }
                row.insert(*x, ModelCell::with_value(s));
                let width = row.len();
                self.widen(width);
            },
            Op::DeleteCell(x, y) => {
                if let Some(row) = self.cells.get_mut(*y) {
                    if *x < row.len() {
                        row.remove(*x);
                    }
                }
            },
            Op::SetRow(y, repeat, s) => {
                self.heighten(y + 1);
                for position in *y..y + repeat {
                    let line = vec![ModelCell::with_value(s)];
                    if position < self.height() {
                        self.cells[position] = line;
                    } else {
                        self.cells.push(line);
                    }
                }
                self.widen(1);
            },
            Op::InsertRow(y) => {
                self.heighten(*y);
                self.cells.insert(*y, Vec::new());
            },
            Op::DeleteRow(y) => {
                if *y < self.height() {
                    self.cells.remove(*y);
                }
            },
            Op::SetColumn(x, repeat) => self.widen(x + repeat),
            Op::InsertColumn(x) => {
                self.widen(*x);
                for row in &mut self.cells {
                    if *x < row.len() {
                        row.insert(*x, ModelCell::default());
                    }
                }
                self.width += 1;
            },
            Op::DeleteColumn(x) => {
                if *x < self.width {
                    for row in &mut self.cells {
                        if *x < row.len() {
                            row.remove(*x);
                        }
                    }
                    self.width -= 1;
                }
            },
            Op::SetSpan(x, y, w, h) => {
                if *w == 0 && *h == 0 {
                    return Some(false);
                }
                let mut grid = self.read(*x, *y, x + w, y + h);
                if grid.iter().flatten().any(|c| c.covered || c.span.is_some()) {
                    return Some(false);
                }
                for (dy, line) in grid.iter_mut().enumerate() {
                    for (dx, cell) in line.iter_mut().enumerate() {
                        if dx == 0 && dy == 0 {
                            cell.span = Some((w + 1, h + 1));
                        } else {
                            cell.covered = true;
                        }
                    }
                }
                self.write(*x, *y, grid);
                return Some(true);
            },
            Op::DelSpan(x, y) => {
                let Some((columns, rows)) = self.cell(*x, *y).span else {
                    return Some(false);
                };
                let last_x = (x + columns - 1).min(self.width.max(x + 1) - 1);
                let last_y = (y + rows - 1).min(self.height().max(y + 1) - 1);
                let mut grid = self.read(*x, *y, last_x, last_y);
                for cell in grid.iter_mut().flatten() {
                    cell.span = None;
                    cell.covered = false;
                }
                self.write(*x, *y, grid);
                return Some(true);
            },
            Op::TransposeArea(x, y, w, h) => {
                let grid = self.read(*x, *y, x + w, y + h);
                let transposed: Vec<Vec<ModelCell>> = (0..=*w)
                    .map(|column| grid.iter().map(|line| line[column].clone()).collect())
                    .collect();
                if w != h {
                    self.write(*x, *y, vec![vec![ModelCell::default(); w + 1]; h + 1]);
                }
                self.write(*x, *y, transposed);
            },
            Op::Rstrip => {
                while self
                    .cells
                    .last()
                    .is_some_and(|row| row.iter().all(ModelCell::is_empty))
                {
                    self.cells.pop();
                }
                for row in &mut self.cells {
                    while row.last().is_some_and(ModelCell::is_empty) {
                        row.pop();
                    }
                }
                self.width = self.cells.iter().map(Vec::len).max().unwrap_or(0);
            },
        }
        None
    }

    fn values(&self) -> Vec<Vec<CellValue>> {
        self.cells
            .iter()
            .map(|row| {
                (0..self.width)
                    .map(|x| {
                        row.get(x)
                            .and_then(|c| c.value.as_deref())
                            .map_or(CellValue::Empty, text)
                    })
                    .collect()
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
enum Op {
    SetValue(usize, usize, String),
    InsertCell(usize, usize, String),
    DeleteCell(usize, usize),
    SetRow(usize, usize, String),
    InsertRow(usize),
    DeleteRow(usize),
    SetColumn(usize, usize),
    InsertColumn(usize),
    DeleteColumn(usize),
    SetSpan(usize, usize, usize, usize),
    DelSpan(usize, usize),
    TransposeArea(usize, usize, usize, usize),
    Rstrip,
}

impl Op {
    fn apply(&self, table: &mut Table) -> Option<bool> {
        match self {
            Op::SetValue(x, y, s) => table.set_value((*x, *y), s.as_str()).unwrap(),
            Op::InsertCell(x, y, s) => table.insert_cell((*x, *y), Cell::with_value(s.as_str())).unwrap(),
            Op::DeleteCell(x, y) => table.delete_cell((*x, *y)).unwrap(),
            Op::SetRow(y, repeat, s) => table
                .set_row(*y, Row::from_values([s.as_str()]).repeated_by(*repeat))
                .unwrap(),
            Op::InsertRow(y) => table.insert_row(*y, Row::new()).unwrap(),
            Op::DeleteRow(y) => table.delete_row(*y).unwrap(),
            Op::SetColumn(x, repeat) => table.set_column(*x, Column::new().repeated_by(*repeat)).unwrap(),
            Op::InsertColumn(x) => table.insert_column(*x, Column::new()).unwrap(),
            Op::DeleteColumn(x) => table.delete_column(*x).unwrap(),
            Op::SetSpan(x, y, w, h) => return Some(table.set_span((*x, *y, x + w, y + h), false).unwrap()),
            Op::DelSpan(x, y) => return Some(table.del_span((*x, *y)).unwrap()),
            Op::TransposeArea(x, y, w, h) => table.transpose_area((*x, *y, x + w, y + h)).unwrap(),
            Op::Rstrip => table.rstrip(false),
        }
        None
    }
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let area = (0usize..8, 0usize..12, 0usize..3, 0usize..3);
    prop_oneof![
        4 => (0usize..8, 0usize..12, "[a-z]{1,3}").prop_map(|(x, y, s)| Op::SetValue(x, y, s)),
        1 => (0usize..8, 0usize..12, "[a-z]{1,3}").prop_map(|(x, y, s)| Op::InsertCell(x, y, s)),
        1 => (0usize..8, 0usize..12).prop_map(|(x, y)| Op::DeleteCell(x, y)),
        1 => (0usize..12, 1usize..4, "[a-z]{1,3}").prop_map(|(y, r, s)| Op::SetRow(y, r, s)),
        1 => (0usize..12).prop_map(Op::InsertRow),
        1 => (0usize..12).prop_map(Op::DeleteRow),
        1 => (0usize..8, 1usize..4).prop_map(|(x, r)| Op::SetColumn(x, r)),
        1 => (0usize..8).prop_map(Op::InsertColumn),
        1 => (0usize..8).prop_map(Op::DeleteColumn),
        1 => area.clone().prop_map(|(x, y, w, h)| Op::SetSpan(x, y, w, h)),
        1 => (0usize..8, 0usize..12).prop_map(|(x, y)| Op::DelSpan(x, y)),
        1 => area.prop_map(|(x, y, w, h)| Op::TransposeArea(x, y, w, h)),
        1 => Just(Op::Rstrip),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_table_matches_materialised_model(
        initial in (0usize..5, 0usize..30),
        ops in prop::collection::vec(op_strategy(), 1..40),
    ) {
        let (width, height) = initial;
        let mut table = Table::new("Prop", width, height);
        let mut model = Model::default();
        model.widen(width);
        model.heighten(height);

        for op in &ops {
            let outcome = op.apply(&mut table);
            prop_assert_eq!(outcome, model.apply(op), "outcome of {:?}", op);

            prop_assert_eq!(table.size(), (model.width, model.height()), "after {:?}", op);
            for (row, line) in table.rows().zip(&model.cells) {
                prop_assert_eq!(row.width(), line.len(), "row width after {:?}", op);
            }
            prop_assert!(table.row_runs().check().is_ok());
            prop_assert!(table.column_runs().check().is_ok());
            for row in table.row_runs().runs() {
                prop_assert!(row.cell_runs().check().is_ok());
                prop_assert!(row.width() <= table.width());
            }
        }

        let values = table.values().unwrap();
        prop_assert_eq!(&values, &model.values());

        // Rows are written with at least one cell, so a zero-width table
        // reloads one column wide.
        if table.width() > 0 {
            let reloaded = Table::from_element(table.to_element()).unwrap();
            prop_assert_eq!(reloaded.size(), table.size());
            prop_assert_eq!(reloaded.values().unwrap(), values);
        }
    }
}
