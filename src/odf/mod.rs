//! OpenDocument Format (ODF) support.
//!
//! The spreadsheet object model lives in [`ods`]. The other modules hold what
//! it is built on: the generic element tree, the package layer, coordinate
//! parsing and typed value codecs.

/// Cell coordinates and areas
pub mod coordinates;
/// Core ODF package functionality
pub mod core;
/// Typed attribute value codecs
pub mod datatype;
/// ODF XML element tree
pub mod elements;
/// ODF spreadsheet (.ods) support
pub mod ods;

pub use coordinates::{CellCoord, CellRange};
pub use ods::{Cell, CellValue, Spreadsheet, Table};

/// ODF format types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OdfFormat {
    /// OpenDocument Text (.odt)
    Text,
    /// OpenDocument Spreadsheet (.ods)
    Spreadsheet,
    /// OpenDocument Presentation (.odp)
    Presentation,
    /// OpenDocument Drawing (.odg)
    Drawing,
    /// OpenDocument Formula (.odf)
    Formula,
    /// OpenDocument Chart (.odc)
    Chart,
    /// OpenDocument Image (.odi)
    Image,
    /// OpenDocument Master (.odm)
    Master,
}

/// MIME types for different ODF formats
pub const ODF_MIME_TYPES: &[(&str, OdfFormat)] = &[
    ("application/vnd.oasis.opendocument.text", OdfFormat::Text),
    ("application/vnd.oasis.opendocument.spreadsheet", OdfFormat::Spreadsheet),
    ("application/vnd.oasis.opendocument.presentation", OdfFormat::Presentation),
    ("application/vnd.oasis.opendocument.graphics", OdfFormat::Drawing),
    ("application/vnd.oasis.opendocument.formula", OdfFormat::Formula),
    ("application/vnd.oasis.opendocument.chart", OdfFormat::Chart),
    ("application/vnd.oasis.opendocument.image", OdfFormat::Image),
    ("application/vnd.oasis.opendocument.text-master", OdfFormat::Master),
    // Template variants
    ("application/vnd.oasis.opendocument.text-template", OdfFormat::Text),
    ("application/vnd.oasis.opendocument.spreadsheet-template", OdfFormat::Spreadsheet),
    ("application/vnd.oasis.opendocument.presentation-template", OdfFormat::Presentation),
    ("application/vnd.oasis.opendocument.graphics-template", OdfFormat::Drawing),
    ("application/vnd.oasis.opendocument.formula-template", OdfFormat::Formula),
    ("application/vnd.oasis.opendocument.chart-template", OdfFormat::Chart),
    ("application/vnd.oasis.opendocument.image-template", OdfFormat::Image),
];

/// Detect ODF format from MIME type
pub fn detect_format_from_mime(mime_type: &str) -> Option<OdfFormat> {
    ODF_MIME_TYPES
        .iter()
        .find(|(mime, _)| *mime == mime_type)
        .map(|(_, format)| *format)
}

/// Detect the format of an ODF package held in memory
pub fn detect_format(bytes: &[u8]) -> crate::common::Result<Option<OdfFormat>> {
    let package = core::Package::from_bytes(bytes)?;
    Ok(detect_format_from_mime(package.mimetype()))
}
