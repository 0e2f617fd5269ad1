//! ODF package writing.
//!
//! [`PackageWriter`] produces a valid ODF ZIP archive: the `mimetype` file
//! first and uncompressed, every part deflated, and a generated manifest.

use crate::common::{Error, Result};
use crate::odf::core::manifest::Manifest;
use crate::odf::elements::{Element, namespace};
use std::io::{Cursor, Seek, Write};
use zip::write::{SimpleFileOptions, ZipWriter};

/// Builder for ODF packages (ZIP archives)
///
/// # Examples
///
/// ```no_run
/// # use longan::odf::core::PackageWriter;
/// # use longan::Result;
/// # fn example() -> Result<()> {
/// let mut writer = PackageWriter::new();
/// writer.set_mimetype("application/vnd.oasis.opendocument.spreadsheet")?;
/// writer.add_file("content.xml", b"<office:document-content/>")?;
///
/// let bytes = writer.finish_to_bytes()?;
/// std::fs::write("document.ods", bytes)?;
/// # Ok(())
/// # }
/// ```
pub struct PackageWriter<W: Write + Seek> {
    zip_writer: ZipWriter<W>,
    mimetype: Option<String>,
    manifest: Manifest,
    compression_level: Option<i64>,
}

impl PackageWriter<Cursor<Vec<u8>>> {
    /// Create a new package writer that writes to memory
    pub fn new() -> Self {
        Self::with_writer(Cursor::new(Vec::new()))
    }

    /// Finish writing and return the bytes
    pub fn finish_to_bytes(self) -> Result<Vec<u8>> {
        let cursor = self.finish()?;
        Ok(cursor.into_inner())
    }
}

impl Default for PackageWriter<Cursor<Vec<u8>>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Seek> PackageWriter<W> {
    /// Create a new package writer with a custom writer
    pub fn with_writer(writer: W) -> Self {
        Self {
            zip_writer: ZipWriter::new(writer),
            mimetype: None,
            manifest: Manifest::default(),
            compression_level: None,
        }
    }

    /// Deflate level for every part except `mimetype`; `None` uses the default
    pub fn with_compression_level(mut self, level: Option<i64>) -> Self {
        self.compression_level = level;
        self
    }

    /// Set the MIME type for the document
    ///
    /// This writes the uncompressed `mimetype` entry, which must be the first
    /// entry of the archive, and the root manifest entry.
    pub fn set_mimetype(&mut self, mimetype: &str) -> Result<()> {
        if mimetype.is_empty() {
            return Err(Error::InvalidFormat("MIME type must not be empty".to_string()));
        }
        if self.mimetype.is_some() {
            return Err(Error::InvalidFormat("MIME type already set".to_string()));
        }
        let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        self.zip_writer.start_file("mimetype", stored)?;
        self.zip_writer.write_all(mimetype.as_bytes())?;

        self.mimetype = Some(mimetype.to_string());
        self.manifest.set_entry("/", mimetype);
        Ok(())
    }

    /// Add a file to the package, guessing its media type from the extension
    pub fn add_file(&mut self, path: &str, content: &[u8]) -> Result<()> {
        self.add_file_with_media_type(path, content, guess_media_type(path))
    }

    /// Add a file to the package with a specific media type
    pub fn add_file_with_media_type(
        &mut self,
        path: &str,
        content: &[u8],
        media_type: &str,
    ) -> Result<()> {
        if path == "mimetype" || path == crate::odf::core::package::MANIFEST_PATH {
            return Err(Error::InvalidFormat(format!("'{}' is written by the package writer", path)));
        }
        if self.mimetype.is_none() {
            return Err(Error::InvalidFormat("MIME type must be set before adding files".to_string()));
        }
        self.manifest.set_entry(path, media_type);

        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .compression_level(self.compression_level);
        self.zip_writer.start_file(path, options)?;
        self.zip_writer.write_all(content)?;
        Ok(())
    }

    /// Register a manifest entry without archive content, such as a directory
    pub fn add_manifest_entry(&mut self, path: &str, media_type: &str) {
        self.manifest.set_entry(path, media_type);
    }

    /// Finish writing the package and return the underlying writer
    ///
    /// # Errors
    ///
    /// Returns an error if no MIME type has been set or writing fails.
    pub fn finish(mut self) -> Result<W> {
        if self.mimetype.is_none() {
            return Err(Error::InvalidFormat("MIME type not set".to_string()));
        }

        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .compression_level(self.compression_level);
        self.zip_writer
            .start_file(crate::odf::core::package::MANIFEST_PATH, options)?;
        self.zip_writer.write_all(self.manifest.to_xml().as_bytes())?;

        Ok(self.zip_writer.finish()?)
    }
}

/// Guess media type from file path
pub fn guess_media_type(path: &str) -> &'static str {
    if path.ends_with(".xml") {
        "text/xml"
    } else if path.ends_with(".png") {
        "image/png"
    } else if path.ends_with(".jpg") || path.ends_with(".jpeg") {
        "image/jpeg"
    } else if path.ends_with(".gif") {
        "image/gif"
    } else if path.ends_with(".svg") {
        "image/svg+xml"
    } else if path.ends_with('/') {
        ""
    } else {
        "application/octet-stream"
    }
}

/// Default parts for freshly created spreadsheet documents
pub struct OdfStructure;

impl OdfStructure {
    /// MIME type of spreadsheet documents
    pub const SPREADSHEET_MIMETYPE: &'static str = "application/vnd.oasis.opendocument.spreadsheet";

    /// Root of an empty spreadsheet `content.xml`
    pub fn default_content() -> Element {
        let mut root = Element::new("office:document-content");
        namespace::declare(&mut root, namespace::CONTENT_PREFIXES);
        root.set_attribute("office:version", "1.3");
        root.with_child(Element::new("office:automatic-styles")).with_child(
            Element::new("office:body").with_child(Element::new("office:spreadsheet")),
        )
    }

    /// An empty `styles.xml`
    pub fn default_styles_xml() -> String {
        let mut root = Element::new("office:document-styles");
        namespace::declare(&mut root, namespace::CONTENT_PREFIXES);
        root.set_attribute("office:version", "1.3");
        root.with_child(Element::new("office:font-face-decls"))
            .with_child(Element::new("office:styles"))
            .with_child(Element::new("office:automatic-styles"))
            .with_child(Element::new("office:master-styles"))
            .to_xml_document()
    }

    /// A `meta.xml` naming `generator` and the current time
    pub fn default_meta_xml(generator: &str) -> String {
        let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string();
        let mut root = Element::new("office:document-meta");
        namespace::declare(&mut root, &["office", "meta", "dc"]);
        root.set_attribute("office:version", "1.3");
        let meta = Element::new("office:meta")
            .with_child(Element::new("meta:generator").with_text(generator))
            .with_child(Element::new("meta:creation-date").with_text(&now))
            .with_child(Element::new("dc:date").with_text(&now));
        root.with_child(meta).to_xml_document()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_mimetype_is_first_and_stored() {
        let mut writer = PackageWriter::new();
        writer
            .set_mimetype(OdfStructure::SPREADSHEET_MIMETYPE)
            .unwrap();
        writer.add_file("content.xml", b"<x/>").unwrap();
        writer.add_manifest_entry("Configurations2/", "application/vnd.sun.xml.ui.configuration");
        let bytes = writer.finish_to_bytes().unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut first = archive.by_index(0).unwrap();
        assert_eq!(first.name(), "mimetype");
        assert_eq!(first.compression(), zip::CompressionMethod::Stored);
        let mut content = String::new();
        first.read_to_string(&mut content).unwrap();
        assert_eq!(content, OdfStructure::SPREADSHEET_MIMETYPE);
        drop(first);

        let mut manifest = String::new();
        archive
            .by_name("META-INF/manifest.xml")
            .unwrap()
            .read_to_string(&mut manifest)
            .unwrap();
        let manifest = Manifest::parse(&manifest).unwrap();
        assert_eq!(manifest.media_type("content.xml"), Some("text/xml"));
        assert!(manifest.has_path("Configurations2/"));
    }

    #[test]
    fn test_finish_requires_mimetype() {
        let writer = PackageWriter::new();
        assert!(writer.finish_to_bytes().is_err());
    }

    #[test]
    fn test_reserved_paths_rejected() {
        let mut writer = PackageWriter::new();
        assert!(writer.add_file("mimetype", b"x").is_err());
        assert!(writer.add_file("META-INF/manifest.xml", b"x").is_err());
    }

    #[test]
    fn test_default_parts_parse() {
        let content = OdfStructure::default_content();
        assert!(content.find("office:spreadsheet").is_some());
        let styles = Element::parse(&OdfStructure::default_styles_xml()).unwrap();
        assert_eq!(styles.tag(), "office:document-styles");
        let meta = Element::parse(&OdfStructure::default_meta_xml("Test/1")).unwrap();
        assert_eq!(meta.find("meta:generator").unwrap().text_content(), "Test/1");
    }

    #[test]
    fn test_guess_media_type() {
        assert_eq!(guess_media_type("styles.xml"), "text/xml");
        assert_eq!(guess_media_type("Pictures/a.jpeg"), "image/jpeg");
        assert_eq!(guess_media_type("Configurations2/"), "");
        assert_eq!(guess_media_type("blob"), "application/octet-stream");
    }

    #[test]
    fn test_files_require_mimetype_first() {
        let mut writer = PackageWriter::new();
        assert!(writer.add_file("content.xml", b"<x/>").is_err());
        writer.set_mimetype("application/x-test").unwrap();
        assert!(writer.set_mimetype("application/x-test").is_err());
    }
}
