//! ODF package handling: ZIP archive reading and writing, and the manifest.

/// ODF manifest parsing and generation
mod manifest;
/// ODF package handling
mod package;
/// ODF package writing
mod writer;

pub use manifest::{Manifest, ManifestEntry};
pub use package::{MANIFEST_PATH, Package};
pub use writer::{OdfStructure, PackageWriter, guess_media_type};
