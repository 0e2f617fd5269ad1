//! ODF package (ZIP archive) handling.
//!
//! The whole archive is read into memory so parts can be replaced and the
//! package written back without keeping the source open.

use crate::common::{Error, Result};
use crate::odf::core::manifest::{self, Manifest};
use crate::odf::core::writer::{PackageWriter, guess_media_type};
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::debug;

/// Path of the manifest inside the archive
pub const MANIFEST_PATH: &str = "META-INF/manifest.xml";

/// An ODF package: mimetype, manifest and every other part as raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    mimetype: String,
    manifest: Manifest,
    parts: Vec<(String, Vec<u8>)>,
}

impl Package {
    /// An empty package with the given MIME type
    pub fn new(mimetype: &str) -> Self {
        let mut manifest = Manifest::default();
        manifest.set_entry("/", mimetype);
        Self {
            mimetype: mimetype.to_string(),
            manifest,
            parts: Vec::new(),
        }
    }

    /// Open an ODF package from a reader
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(reader)
            .map_err(|_| Error::InvalidFormat("Invalid ZIP archive".to_string()))?;

        let mut mimetype = None;
        let mut found_manifest = None;
        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut content = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
            file.read_to_end(&mut content)?;

            match name.as_str() {
                "mimetype" => mimetype = Some(String::from_utf8(content)?.trim().to_string()),
                MANIFEST_PATH => found_manifest = Some(Manifest::parse(&String::from_utf8(content)?)?),
                _ => parts.push((name, content)),
            }
        }

        let manifest = manifest::require(found_manifest)?;
        if manifest.is_encrypted() {
            return Err(Error::InvalidFormat("Encrypted ODF packages are not supported".to_string()));
        }
        let mimetype = match mimetype.or_else(|| manifest.mimetype().map(str::to_string)) {
            Some(m) => m,
            None => {
                return Err(Error::InvalidFormat(
                    "No mimetype file found in ODF package".to_string(),
                ));
            },
        };

        debug!(mimetype = %mimetype, parts = parts.len(), "read ODF package");
        Ok(Self {
            mimetype,
            manifest,
            parts,
        })
    }

    /// Open an ODF package from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    /// Open an ODF package from a file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Get the MIME type from the mimetype file
    pub fn mimetype(&self) -> &str {
        &self.mimetype
    }

    /// Get the manifest
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Get a file from the package by path
    pub fn get_file(&self, path: &str) -> Result<&[u8]> {
        self.parts
            .iter()
            .find(|(name, _)| name == path)
            .map(|(_, content)| content.as_slice())
            .ok_or_else(|| Error::ComponentNotFound(path.to_string()))
    }

    /// Check if a file exists in the package
    pub fn has_file(&self, path: &str) -> bool {
        self.parts.iter().any(|(name, _)| name == path)
    }

    /// Add or replace a part, registering it in the manifest
    pub fn set_file(&mut self, path: &str, content: Vec<u8>) {
        if !self.manifest.has_path(path) {
            self.manifest.set_entry(path, guess_media_type(path));
        }
        match self.parts.iter_mut().find(|(name, _)| name == path) {
            Some((_, existing)) => *existing = content,
            None => self.parts.push((path.to_string(), content)),
        }
    }

    /// Remove a part and its manifest entry
    pub fn remove_file(&mut self, path: &str) -> Option<Vec<u8>> {
        let position = self.parts.iter().position(|(name, _)| name == path)?;
        self.manifest.remove_entry(path);
        Some(self.parts.remove(position).1)
    }

    /// List all files in the package, excluding mimetype and manifest
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(name, _)| name.as_str())
    }

    /// Write the package as ZIP bytes
    pub fn to_bytes(&self, compression_level: Option<i64>) -> Result<Vec<u8>> {
        let mut writer = PackageWriter::new().with_compression_level(compression_level);
        writer.set_mimetype(&self.mimetype)?;

        for entry in &self.manifest.entries {
            if entry.full_path != "/" && !self.has_file(&entry.full_path) {
                writer.add_manifest_entry(&entry.full_path, &entry.media_type);
            }
        }
        for (name, content) in &self.parts {
            let media_type = self
                .manifest
                .media_type(name)
                .unwrap_or_else(|| guess_media_type(name));
            writer.add_file_with_media_type(name, content, media_type)?;
        }
        writer.finish_to_bytes()
    }
}
