//! OpenDocument Spreadsheet (.ods) implementation.
//!
//! Tables are stored the way the file stores them: runs of identical rows,
//! columns and cells carrying a repeat count. [`PositionIndex`] maps logical
//! positions onto those runs and [`RunStore`] splits runs on demand, so a
//! table of a million empty rows costs one stored row.

mod cell;
mod column;
mod config;
mod index;
mod named_range;
mod row;
mod span;
mod spreadsheet;
mod store;
mod table;

#[cfg(test)]
mod tests;

pub use cell::{Cell, CellValue};
pub use column::Column;
pub use config::{TableCleanup, WriteOptions};
pub use index::PositionIndex;
pub use named_range::{NamedRange, parse_range_address};
pub use row::Row;
pub use spreadsheet::Spreadsheet;
pub use store::{Repeated, RunMut, RunStore};
pub use table::Table;
