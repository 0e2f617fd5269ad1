//! Write options for spreadsheet documents.

use serde::{Deserialize, Serialize};

/// Options controlling how a spreadsheet is written back to a package.
///
/// # Examples
///
/// ```rust
/// use longan::odf::ods::{TableCleanup, WriteOptions};
///
/// let options = WriteOptions::new()
///     .with_cleanup(TableCleanup::Strip)
///     .with_compression_level(Some(9));
/// assert_eq!(options.cleanup, TableCleanup::Strip);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOptions {
    /// Cleanup applied to every table before serialization
    pub cleanup: TableCleanup,
    /// Generator string written to `meta.xml` when the package lacks one
    pub generator: String,
    /// Deflate level for compressed entries, `None` for the zip default
    pub compression_level: Option<i64>,
}

/// Table cleanup performed on save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TableCleanup {
    /// Write tables as they are
    #[default]
    None,
    /// Drop trailing empty rows and cells
    Strip,
    /// Like `Strip`, with style-only cells counted as empty
    StripAggressive,
    /// Give all rows the same minimal width
    OptimizeWidth,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            cleanup: TableCleanup::None,
            generator: format!("Longan/{}", env!("CARGO_PKG_VERSION")),
            compression_level: None,
        }
    }
}

impl WriteOptions {
    /// Create a new `WriteOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cleanup applied to tables on save.
    #[inline]
    pub fn with_cleanup(mut self, cleanup: TableCleanup) -> Self {
        self.cleanup = cleanup;
        self
    }

    #[inline]
    pub fn with_generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = generator.into();
        self
    }

    /// Set the deflate level (0-9). Out of range values are clamped.
    #[inline]
    pub fn with_compression_level(mut self, level: Option<i64>) -> Self {
        self.compression_level = level.map(|l| l.clamp(0, 9));
        self
    }
}

impl TableCleanup {
    /// Apply the cleanup to one table
    pub fn apply(self, table: &mut crate::odf::ods::Table) {
        match self {
            TableCleanup::None => {},
            TableCleanup::Strip => table.rstrip(false),
            TableCleanup::StripAggressive => table.rstrip(true),
            TableCleanup::OptimizeWidth => table.optimize_width(),
        }
    }
}
