//! Cell coordinates: A1 notation, numeric pairs and rectangular areas.
//!
//! Table operations accept coordinates in several shapes:
//! - `(x, y)` integer pairs, where negative values count from the end of the
//!   axis (`-1` is the last row or column), resolved against the table size at
//!   call time
//! - spreadsheet strings such as `"B3"`
//! - areas as `(x0, y0, x1, y1)` tuples or strings such as `"B3:D9"`
//!
//! The traits [`AxisIndex`], [`IntoCoord`] and [`IntoArea`] perform that
//! resolution and produce plain 0-based [`CellCoord`] / [`CellRange`] values.

use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Convert alphabetic column to numeric (0-indexed): A=0, Z=25, AA=26.
///
/// # Examples
///
/// ```
/// use longan::odf::coordinates::alpha_to_digit;
///
/// assert_eq!(alpha_to_digit("A").unwrap(), 0);
/// assert_eq!(alpha_to_digit("AB").unwrap(), 27);
/// ```
pub fn alpha_to_digit(alpha: &str) -> Result<usize> {
    if alpha.is_empty() || !alpha.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(Error::InvalidCoordinate(format!(
            "column '{}' must contain only letters",
            alpha
        )));
    }

    alpha
        .bytes()
        .try_fold(0usize, |acc, b| {
            let val = (b.to_ascii_uppercase() - b'A' + 1) as usize;
            acc.checked_mul(26)?.checked_add(val)
        })
        .map(|column| column - 1)
        .ok_or_else(|| Error::InvalidCoordinate(format!("column '{}' is too large", alpha)))
}

/// Convert numeric column (0-indexed) to alphabetic notation: 0=A, 26=AA.
///
/// # Examples
///
/// ```
/// use longan::odf::coordinates::digit_to_alpha;
///
/// assert_eq!(digit_to_alpha(0), "A");
/// assert_eq!(digit_to_alpha(27), "AB");
/// ```
pub fn digit_to_alpha(digit: usize) -> String {
    let mut letters = Vec::new();
    let mut n = digit + 1;
    while n > 0 {
        letters.push(b'A' + ((n - 1) % 26) as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    // Only ASCII letters were pushed
    String::from_utf8(letters).unwrap_or_default()
}

/// Cell coordinates (column, row), both 0-indexed.
///
/// # Examples
///
/// ```
/// use longan::odf::coordinates::CellCoord;
///
/// let coord: CellCoord = "AA10".parse().unwrap();
/// assert_eq!((coord.column(), coord.row()), (26, 9));
/// assert_eq!(coord.to_string(), "AA10");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellCoord {
    column: usize,
    row: usize,
}

impl CellCoord {
    /// Create a new cell coordinate
    #[inline]
    pub const fn new(column: usize, row: usize) -> Self {
        Self { column, row }
    }

    /// Column index (0-indexed)
    #[inline]
    pub const fn column(&self) -> usize {
        self.column
    }

    /// Row index (0-indexed)
    #[inline]
    pub const fn row(&self) -> usize {
        self.row
    }

    /// Convert to A1 notation string
    pub fn to_a1(&self) -> String {
        let mut out = digit_to_alpha(self.column);
        out.push_str(itoa::Buffer::new().format(self.row + 1));
        out
    }
}

impl FromStr for CellCoord {
    type Err = Error;

    /// Parse "B3" (absolute markers such as "$B$3" are accepted and ignored).
    fn from_str(s: &str) -> Result<Self> {
        let cleaned: String = s.trim().chars().filter(|c| *c != '$').collect();
        let split = cleaned
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(cleaned.len());
        let (alpha, numeric) = cleaned.split_at(split);

        if alpha.is_empty() {
            return Err(Error::InvalidCoordinate(format!(
                "no column letter found in '{}'",
                s
            )));
        }
        if numeric.is_empty() {
            return Err(Error::InvalidCoordinate(format!(
                "no row number found in '{}'",
                s
            )));
        }

        let column = alpha_to_digit(alpha)?;
        let row: usize = numeric.parse().map_err(|_| {
            Error::InvalidCoordinate(format!("failed to parse row number from '{}'", numeric))
        })?;
        if row == 0 {
            return Err(Error::InvalidCoordinate(
                "row number must be >= 1".to_string(),
            ));
        }

        Ok(Self::new(column, row - 1))
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1())
    }
}

/// Inclusive rectangular range of cells.
///
/// Ranges are always normalized so that `start` is the top-left corner.
///
/// # Examples
///
/// ```
/// use longan::odf::coordinates::CellRange;
///
/// let range: CellRange = "B3:D9".parse().unwrap();
/// assert_eq!(range.width(), 3);
/// assert_eq!(range.height(), 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRange {
    start: CellCoord,
    end: CellCoord,
}

impl CellRange {
    /// Create a range from two corners, in any order.
    pub fn new(a: CellCoord, b: CellCoord) -> Self {
        Self {
            start: CellCoord::new(a.column.min(b.column), a.row.min(b.row)),
            end: CellCoord::new(a.column.max(b.column), a.row.max(b.row)),
        }
    }

    /// Range covering a single cell
    pub fn single(coord: CellCoord) -> Self {
        Self {
            start: coord,
            end: coord,
        }
    }

    /// Create a range from `(x0, y0, x1, y1)`
    pub fn from_bounds(x0: usize, y0: usize, x1: usize, y1: usize) -> Self {
        Self::new(CellCoord::new(x0, y0), CellCoord::new(x1, y1))
    }

    /// Top-left cell
    #[inline]
    pub const fn start(&self) -> CellCoord {
        self.start
    }

    /// Bottom-right cell
    #[inline]
    pub const fn end(&self) -> CellCoord {
        self.end
    }

    /// Number of columns in the range
    #[inline]
    pub fn width(&self) -> usize {
        self.end.column - self.start.column + 1
    }

    /// Number of rows in the range
    #[inline]
    pub fn height(&self) -> usize {
        self.end.row - self.start.row + 1
    }

    /// True when the range covers exactly one cell
    #[inline]
    pub fn is_single(&self) -> bool {
        self.start == self.end
    }

    /// Check whether a coordinate lies inside the range
    pub fn contains(&self, coord: CellCoord) -> bool {
        (self.start.column..=self.end.column).contains(&coord.column)
            && (self.start.row..=self.end.row).contains(&coord.row)
    }

    /// Check whether two ranges share at least one cell
    pub fn intersects(&self, other: &CellRange) -> bool {
        self.start.column <= other.end.column
            && other.start.column <= self.end.column
            && self.start.row <= other.end.row
            && other.start.row <= self.end.row
    }

    /// Iterate over every coordinate, row by row
    pub fn coords(&self) -> impl Iterator<Item = CellCoord> + '_ {
        (self.start.row..=self.end.row).flat_map(move |row| {
            (self.start.column..=self.end.column).map(move |column| CellCoord::new(column, row))
        })
    }
}

impl FromStr for CellRange {
    type Err = Error;

    /// Parse "A1:B3"; a single "A1" yields a one-cell range.
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((a, b)) => Ok(Self::new(a.parse()?, b.parse()?)),
            None => Ok(Self::single(s.parse()?)),
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// A position along one axis (row or column).
///
/// Unsigned values are used as-is. Signed values below zero count from the
/// end of the axis, the way slice indexing works in scripting languages.
pub trait AxisIndex: Copy {
    /// Resolve against the current axis length.
    fn resolve(self, len: usize) -> Result<usize>;
}

macro_rules! impl_axis_unsigned {
    ($($t:ty),*) => {$(
        impl AxisIndex for $t {
            #[inline]
            fn resolve(self, _len: usize) -> Result<usize> {
                usize::try_from(self)
                    .map_err(|_| Error::InvalidCoordinate(format!("index {} too large", self)))
            }
        }
    )*};
}

macro_rules! impl_axis_signed {
    ($($t:ty),*) => {$(
        impl AxisIndex for $t {
            #[inline]
            fn resolve(self, len: usize) -> Result<usize> {
                if self >= 0 {
                    return usize::try_from(self)
                        .map_err(|_| Error::InvalidCoordinate(format!("index {} too large", self)));
                }
                let back = usize::try_from(self.unsigned_abs())
                    .map_err(|_| Error::InvalidCoordinate(format!("index {} too small", self)))?;
                len.checked_sub(back).ok_or_else(|| {
                    Error::InvalidCoordinate(format!(
                        "negative index {} reaches before the start (length {})",
                        self, len
                    ))
                })
            }
        }
    )*};
}

impl_axis_unsigned!(usize, u32, u64);
impl_axis_signed!(isize, i32, i64);

/// Anything that designates a single cell.
pub trait IntoCoord {
    /// Resolve against the table size `(width, height)`.
    fn resolve(self, width: usize, height: usize) -> Result<CellCoord>;
}

impl<X: AxisIndex, Y: AxisIndex> IntoCoord for (X, Y) {
    fn resolve(self, width: usize, height: usize) -> Result<CellCoord> {
        Ok(CellCoord::new(self.0.resolve(width)?, self.1.resolve(height)?))
    }
}

impl IntoCoord for CellCoord {
    fn resolve(self, _width: usize, _height: usize) -> Result<CellCoord> {
        Ok(self)
    }
}

impl IntoCoord for &str {
    fn resolve(self, _width: usize, _height: usize) -> Result<CellCoord> {
        self.parse()
    }
}

impl IntoCoord for &String {
    fn resolve(self, width: usize, height: usize) -> Result<CellCoord> {
        IntoCoord::resolve(self.as_str(), width, height)
    }
}

/// Anything that designates a rectangular area.
pub trait IntoArea {
    /// Resolve against the table size `(width, height)`.
    fn resolve(self, width: usize, height: usize) -> Result<CellRange>;
}

impl<A: AxisIndex, B: AxisIndex, C: AxisIndex, D: AxisIndex> IntoArea for (A, B, C, D) {
    fn resolve(self, width: usize, height: usize) -> Result<CellRange> {
        Ok(CellRange::from_bounds(
            self.0.resolve(width)?,
            self.1.resolve(height)?,
            self.2.resolve(width)?,
            self.3.resolve(height)?,
        ))
    }
}

impl IntoArea for CellRange {
    fn resolve(self, _width: usize, _height: usize) -> Result<CellRange> {
        Ok(self)
    }
}

impl IntoArea for CellCoord {
    fn resolve(self, _width: usize, _height: usize) -> Result<CellRange> {
        Ok(CellRange::single(self))
    }
}

impl IntoArea for &str {
    fn resolve(self, _width: usize, _height: usize) -> Result<CellRange> {
        self.parse()
    }
}

impl IntoArea for &String {
    fn resolve(self, width: usize, height: usize) -> Result<CellRange> {
        IntoArea::resolve(self.as_str(), width, height)
    }
}
