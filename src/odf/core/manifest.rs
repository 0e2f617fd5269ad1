//! ODF manifest parsing and generation.
//!
//! `META-INF/manifest.xml` lists every part of the package with its media type.

use crate::common::xml::escape_attribute;
use crate::common::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// ODF manifest (META-INF/manifest.xml)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    /// `manifest:version` of the root element
    pub version: Option<String>,
    /// Entries in document order
    pub entries: Vec<ManifestEntry>,
}

/// Entry in the ODF manifest
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    pub full_path: String,
    pub media_type: String,
    pub encrypted: bool,
}

impl Manifest {
    /// Parse manifest XML content
    pub fn parse(xml_content: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml_content);
        let mut buf = Vec::new();
        let mut manifest = Manifest::default();
        let mut current: Option<ManifestEntry> = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => match e.name().as_ref() {
                    b"manifest:manifest" => manifest.version = Self::attribute(e, b"manifest:version")?,
                    b"manifest:file-entry" => current = Self::parse_file_entry(e)?,
                    b"manifest:encryption-data" => {
                        if let Some(entry) = current.as_mut() {
                            entry.encrypted = true;
                        }
                    },
                    _ => {},
                },
                Event::Empty(ref e) => match e.name().as_ref() {
                    b"manifest:file-entry" => {
                        if let Some(entry) = Self::parse_file_entry(e)? {
                            manifest.entries.push(entry);
                        }
                    },
                    b"manifest:encryption-data" => {
                        if let Some(entry) = current.as_mut() {
                            entry.encrypted = true;
                        }
                    },
                    _ => {},
                },
                Event::End(ref e) if e.name().as_ref() == b"manifest:file-entry" => {
                    manifest.entries.extend(current.take());
                },
                Event::Eof => break,
                _ => {},
            }
            buf.clear();
        }

        Ok(manifest)
    }

    fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
        for attr in e.attributes() {
            let attr = attr?;
            if attr.key.as_ref() == name {
                let raw = String::from_utf8(attr.value.to_vec())?;
                return Ok(Some(crate::common::xml::unescape_xml(&raw).into_owned()));
            }
        }
        Ok(None)
    }

    /// Parse a single file-entry element
    fn parse_file_entry(e: &BytesStart<'_>) -> Result<Option<ManifestEntry>> {
        let Some(full_path) = Self::attribute(e, b"manifest:full-path")? else {
            return Ok(None);
        };
        if full_path.is_empty() {
            return Ok(None);
        }
        let media_type = Self::attribute(e, b"manifest:media-type")?.unwrap_or_default();
        Ok(Some(ManifestEntry {
            full_path,
            media_type,
            encrypted: false,
        }))
    }

    /// Media type of the root entry (`/`)
    pub fn mimetype(&self) -> Option<&str> {
        self.media_type("/")
    }

    /// Get media type for a path
    pub fn media_type(&self, path: &str) -> Option<&str> {
        self.entry(path).map(|entry| entry.media_type.as_str())
    }

    /// Get entry for a path
    pub fn entry(&self, path: &str) -> Option<&ManifestEntry> {
        self.entries.iter().find(|entry| entry.full_path == path)
    }

    /// Check if a path exists in manifest
    pub fn has_path(&self, path: &str) -> bool {
        self.entry(path).is_some()
    }

    /// Add an entry, or replace the media type of an existing one
    pub fn set_entry(&mut self, path: &str, media_type: &str) {
        match self.entries.iter_mut().find(|entry| entry.full_path == path) {
            Some(entry) => entry.media_type = media_type.to_string(),
            None => self.entries.push(ManifestEntry {
                full_path: path.to_string(),
                media_type: media_type.to_string(),
                encrypted: false,
            }),
        }
    }

    /// Remove the entry for a path
    pub fn remove_entry(&mut self, path: &str) {
        self.entries.retain(|entry| entry.full_path != path);
    }

    /// True when any part of the package is encrypted
    pub fn is_encrypted(&self) -> bool {
        self.entries.iter().any(|entry| entry.encrypted)
    }

    /// Generate the manifest.xml content
    pub fn to_xml(&self) -> String {
        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(r#"<manifest:manifest xmlns:manifest=""#);
        xml.push_str(crate::odf::elements::namespace::MANIFEST);
        xml.push_str(r#"" manifest:version=""#);
        xml.push_str(&escape_attribute(self.version.as_deref().unwrap_or("1.3")));
        xml.push_str("\">\n");
        for entry in &self.entries {
            xml.push_str(&format!(
                " <manifest:file-entry manifest:full-path=\"{}\" manifest:media-type=\"{}\"/>\n",
                escape_attribute(&entry.full_path),
                escape_attribute(&entry.media_type)
            ));
        }
        xml.push_str("</manifest:manifest>\n");
        xml
    }
}

/// Turn a missing manifest into a format error
pub(crate) fn require(manifest: Option<Manifest>) -> Result<Manifest> {
    manifest.ok_or_else(|| Error::InvalidFormat("No manifest.xml found in ODF package".to_string()))
}
