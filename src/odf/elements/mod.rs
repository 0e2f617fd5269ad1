//! XML element tree and ODF element classification.

pub mod element;
pub mod kind;
pub mod namespace;

pub use element::{Element, ElementBase, Node};
pub use kind::{ElementKind, OdfElement};
