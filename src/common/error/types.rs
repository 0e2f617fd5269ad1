//! Unified error types for Longan.
//!
//! Every fallible operation in the crate returns [`Result`]. Table and row
//! operations that address logical positions auto-grow instead of failing, so
//! the range errors below mostly surface from low-level run bookkeeping.
use thiserror::Error;

/// Main error type for Longan operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid file format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Stream or part not found
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    /// XML parsing error
    #[error("XML error: {0}")]
    XmlError(String),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// A logical position at or beyond the end of a run index was addressed
    #[error("Position {position} out of range (length {len})")]
    OutOfRange { position: usize, len: usize },

    /// Malformed coordinate string or tuple
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// Run index and stored nodes disagree; the operation was aborted
    #[error("Structural inconsistency: {0}")]
    StructuralInconsistency(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type for Longan operations.
pub type Result<T> = std::result::Result<T, Error>;
