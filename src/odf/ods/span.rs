//! Merged cell areas.
//!
//! The top-left cell of a span carries `table:number-columns-spanned` and
//! `table:number-rows-spanned`; every other cell of the area becomes a
//! `table:covered-table-cell`. Spans never overlap.

use crate::common::Result;
use crate::odf::coordinates::{CellCoord, CellRange, IntoArea, IntoCoord};
use crate::odf::ods::cell::CellValue;
use crate::odf::ods::store::Repeated;
use crate::odf::ods::table::Table;
use tracing::debug;

impl Table {
    /// Merge the cells of `area` into one span.
    ///
    /// Returns `Ok(false)` without touching the table when the area is a
    /// single cell or when one of its cells already belongs to a span.
    /// With `merge`, the non-empty values of the area are joined by spaces
    /// into the origin cell and the other cells are cleared.
    pub fn set_span<A: IntoArea>(&mut self, area: A, merge: bool) -> Result<bool> {
        let area = area.resolve(self.width(), self.height())?;
        if area.is_single() {
            return Ok(false);
        }

        let mut cells = self.cells_in(area)?;
        if cells.iter().flatten().any(|c| c.is_covered() || c.has_span()) {
            debug!(table = self.name(), area = %area, "span conflicts with an existing span");
            return Ok(false);
        }

        if merge {
            let mut filled = Vec::new();
            for cell in cells.iter().flatten() {
                let value = cell.value()?;
                if !value.is_empty() {
                    filled.push(value);
                }
            }
            let merged = match filled.len() {
                0 | 1 => filled.pop(),
                _ => Some(CellValue::Text(
                    filled
                        .iter()
                        .map(CellValue::display_text)
                        .collect::<Vec<_>>()
                        .join(" "),
                )),
            };
            for cell in cells.iter_mut().flatten() {
                cell.clear();
            }
            if let Some(value) = merged {
                cells[0][0].set_value(value);
            }
        }

        for (dy, line) in cells.iter_mut().enumerate() {
            for (dx, cell) in line.iter_mut().enumerate() {
                if dx == 0 && dy == 0 {
                    cell.set_span(area.width(), area.height());
                } else {
                    cell.set_covered(true);
                }
            }
        }
        self.set_cells(area.start(), cells)?;

        debug!(table = self.name(), area = %area, merge, "created span");
        Ok(true)
    }

    /// Undo the span whose origin is at `coord`.
    ///
    /// Returns `Ok(false)` when that cell carries no span. Cell content is
    /// left as it is.
    pub fn del_span<C: IntoCoord>(&mut self, coord: C) -> Result<bool> {
        let origin = coord.resolve(self.width(), self.height())?;
        let cell = self.cell(origin)?;
        if !cell.has_span() {
            return Ok(false);
        }

        let area = self
            .clipped_span(origin, cell.span())
            .unwrap_or_else(|| CellRange::new(origin, origin));
        let mut cells = self.cells_in(area)?;
        for cell in cells.iter_mut().flatten() {
            cell.clear_span();
            cell.set_covered(false);
        }
        self.set_cells(origin, cells)?;

        debug!(table = self.name(), area = %area, "removed span");
        Ok(true)
    }

    /// True when the cell at `coord` is a span origin or covered by a span
    pub fn is_spanned<C: IntoCoord>(&self, coord: C) -> Result<bool> {
        let cell = self.cell(coord)?;
        Ok(cell.is_covered() || cell.is_spanned())
    }

    /// Area of the span containing `coord`, if any
    pub fn span_area<C: IntoCoord>(&self, coord: C) -> Result<Option<CellRange>> {
        let target = coord.resolve(self.width(), self.height())?;
        for (row_start, row) in self.row_runs().iter_runs() {
            if row_start > target.row() {
                break;
            }
            // The origin closest to the target within a repeated run.
            let oy = target.row().min(row_start + row.repeated() - 1);
            for (cell_start, cell) in row.cell_runs().iter_runs() {
                if cell_start > target.column() {
                    break;
                }
                if !cell.has_span() || cell.is_covered() {
                    continue;
                }
                let ox = target.column().min(cell_start + cell.repeated() - 1);
                let area = self.clipped_span(CellCoord::new(ox, oy), cell.span());
                if let Some(area) = area.filter(|area| area.contains(target)) {
                    return Ok(Some(area));
                }
            }
        }
        Ok(None)
    }

    /// Areas of every span in the table
    pub fn spans(&self) -> Vec<CellRange> {
        let mut spans = Vec::new();
        for (row_start, row) in self.row_runs().iter_runs() {
            let origins: Vec<_> = row
                .cell_runs()
                .iter_runs()
                .filter(|(_, cell)| cell.is_spanned() && !cell.is_covered())
                .map(|(x, cell)| (x, cell.span()))
                .collect();
            if origins.is_empty() {
                continue;
            }
            for y in row_start..row_start + row.repeated() {
                spans.extend(
                    origins
                        .iter()
                        .filter_map(|&(x, extent)| self.clipped_span(CellCoord::new(x, y), extent)),
                );
            }
        }
        spans
    }

    /// Area of a `columns` x `rows` span at `origin`, cut at the table edge.
    /// `None` when nothing but the origin is left.
    fn clipped_span(&self, origin: CellCoord, (columns, rows): (usize, usize)) -> Option<CellRange> {
        let last_column = self.width().max(origin.column() + 1) - 1;
        let last_row = self.height().max(origin.row() + 1) - 1;
        let area = CellRange::from_bounds(
            origin.column(),
            origin.row(),
            origin.column().saturating_add(columns.max(1) - 1).min(last_column),
            origin.row().saturating_add(rows.max(1) - 1).min(last_row),
        );
        (!area.is_single()).then_some(area)
    }
}
