//! XML helpers shared by the element tree and the package writer.

mod escape;

pub use escape::{escape_attribute, escape_text, resolve_entity, unescape_xml};
