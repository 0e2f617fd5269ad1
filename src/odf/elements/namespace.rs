//! ODF namespace prefixes and URIs.
//!
//! Tags and attributes are handled by their qualified name (`table:table-cell`),
//! so the only namespace work needed is resolving well-known prefixes and
//! declaring them on freshly generated document roots.

use crate::odf::elements::element::Element;
use phf::{Map, phf_map};

pub const OFFICE: &str = "urn:oasis:names:tc:opendocument:xmlns:office:1.0";
pub const TABLE: &str = "urn:oasis:names:tc:opendocument:xmlns:table:1.0";
pub const TEXT: &str = "urn:oasis:names:tc:opendocument:xmlns:text:1.0";
pub const MANIFEST: &str = "urn:oasis:names:tc:opendocument:xmlns:manifest:1.0";

static PREFIX_TO_URI: Map<&'static str, &'static str> = phf_map! {
    "office" => OFFICE,
    "style" => "urn:oasis:names:tc:opendocument:xmlns:style:1.0",
    "text" => TEXT,
    "table" => TABLE,
    "draw" => "urn:oasis:names:tc:opendocument:xmlns:drawing:1.0",
    "fo" => "urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0",
    "xlink" => "http://www.w3.org/1999/xlink",
    "dc" => "http://purl.org/dc/elements/1.1/",
    "meta" => "urn:oasis:names:tc:opendocument:xmlns:meta:1.0",
    "number" => "urn:oasis:names:tc:opendocument:xmlns:datastyle:1.0",
    "svg" => "urn:oasis:names:tc:opendocument:xmlns:svg-compatible:1.0",
    "chart" => "urn:oasis:names:tc:opendocument:xmlns:chart:1.0",
    "of" => "urn:oasis:names:tc:opendocument:xmlns:of:1.2",
    "config" => "urn:oasis:names:tc:opendocument:xmlns:config:1.0",
    "manifest" => MANIFEST,
    "loext" => "urn:org:documentfoundation:names:experimental:office:xmlns:loext:1.0",
    "calcext" => "urn:org:documentfoundation:names:experimental:calc:xmlns:calcext:1.0",
};

static URI_TO_PREFIX: Map<&'static str, &'static str> = phf_map! {
    "urn:oasis:names:tc:opendocument:xmlns:office:1.0" => "office",
    "urn:oasis:names:tc:opendocument:xmlns:style:1.0" => "style",
    "urn:oasis:names:tc:opendocument:xmlns:text:1.0" => "text",
    "urn:oasis:names:tc:opendocument:xmlns:table:1.0" => "table",
    "urn:oasis:names:tc:opendocument:xmlns:drawing:1.0" => "draw",
    "urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0" => "fo",
    "http://www.w3.org/1999/xlink" => "xlink",
    "http://purl.org/dc/elements/1.1/" => "dc",
    "urn:oasis:names:tc:opendocument:xmlns:meta:1.0" => "meta",
    "urn:oasis:names:tc:opendocument:xmlns:datastyle:1.0" => "number",
    "urn:oasis:names:tc:opendocument:xmlns:svg-compatible:1.0" => "svg",
    "urn:oasis:names:tc:opendocument:xmlns:chart:1.0" => "chart",
    "urn:oasis:names:tc:opendocument:xmlns:of:1.2" => "of",
    "urn:oasis:names:tc:opendocument:xmlns:config:1.0" => "config",
    "urn:oasis:names:tc:opendocument:xmlns:manifest:1.0" => "manifest",
    "urn:org:documentfoundation:names:experimental:office:xmlns:loext:1.0" => "loext",
    "urn:org:documentfoundation:names:experimental:calc:xmlns:calcext:1.0" => "calcext",
};

/// Prefixes declared on the root of a generated `content.xml`
pub const CONTENT_PREFIXES: &[&str] = &[
    "office", "style", "text", "table", "draw", "fo", "xlink", "dc", "meta", "number", "svg",
    "of",
];

/// Resolve a well-known prefix to its namespace URI
pub fn prefix_to_uri(prefix: &str) -> Option<&'static str> {
    PREFIX_TO_URI.get(prefix).copied()
}

/// Resolve a namespace URI to its conventional prefix
pub fn uri_to_prefix(uri: &str) -> Option<&'static str> {
    URI_TO_PREFIX.get(uri).copied()
}

/// Add `xmlns:*` declarations for each known prefix not already declared
pub fn declare(element: &mut Element, prefixes: &[&str]) {
    for prefix in prefixes {
        let Some(uri) = prefix_to_uri(prefix) else {
            continue;
        };
        let name = format!("xmlns:{}", prefix);
        if element.attribute(&name).is_none() {
            element.set_attribute(&name, uri);
        }
    }
}
