//! Longan - an OpenDocument spreadsheet object model
//!
//! This library reads and writes OpenDocument spreadsheets (.ods) and exposes
//! their tables through a run-length compressed engine. Files store runs of
//! identical rows, columns and cells with a repeat count; Longan keeps those
//! runs as they are and only splits them where a write lands, so a sheet of a
//! million blank rows stays a single stored row.
//!
//! # Features
//!
//! - **Run-length tables**: logical positions resolved through a cumulative
//!   position index in `O(log n)` over stored runs
//! - **Typed cell values**: numbers, text, booleans, dates, durations,
//!   currencies and percentages
//! - **Spans**: merged cell areas with overlap detection
//! - **Named ranges**: read, edit and resolve `table:named-range` entries
//! - **Lossless packages**: parts other than `content.xml` are written back
//!   unchanged
//!
//! # Example - Editing a spreadsheet
//!
//! ```no_run
//! use longan::odf::ods::{Spreadsheet, TableCleanup, WriteOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut doc = Spreadsheet::open("report.ods")?;
//! let table = doc.table_mut(0).ok_or("no table")?;
//!
//! // Coordinates accept A1 strings, tuples and negative indices
//! table.set_value("B3", 12.5)?;
//! table.set_value((-1, -1), "last cell")?;
//! println!("{:?}", table.value((1, 2))?);
//!
//! doc.save_with(
//!     "report-out.ods",
//!     &WriteOptions::new().with_cleanup(TableCleanup::Strip),
//! )?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Building a table
//!
//! ```
//! use longan::odf::ods::{Row, Spreadsheet, Table};
//!
//! # fn main() -> longan::Result<()> {
//! let mut doc = Spreadsheet::new();
//! let table = doc.append_table(Table::new("Sheet1", 2, 0))?;
//! table.append_row(Row::from_values(["name", "score"]));
//! table.append_row(Row::from_values(["ada", "36"]));
//! assert_eq!(table.size(), (2, 2));
//!
//! let bytes = doc.to_bytes()?;
//! let reread = Spreadsheet::from_bytes(&bytes)?;
//! assert_eq!(reread.tables().len(), 1);
//! # Ok(())
//! # }
//! ```

/// Shared error types and XML helpers
pub mod common;

/// OpenDocument Format support
///
/// This module holds the element tree, the ZIP package layer and the
/// spreadsheet object model.
pub mod odf;

// Re-export commonly used types for convenience
pub use common::{Error, Result};
pub use odf::coordinates::{CellCoord, CellRange};
pub use odf::ods::{Cell, CellValue, Column, NamedRange, Row, Spreadsheet, Table, WriteOptions};
