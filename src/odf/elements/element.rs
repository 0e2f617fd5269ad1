//! Generic XML element tree used as the backing store of every ODF node.
//!
//! [`Element`] keeps its attributes in document order and its children as a
//! list of [`Node`]s, so mixed content such as
//! `<text:p>a<text:span>b</text:span>c</text:p>` survives a load/save cycle.
//! Cloning an element is always a deep copy.

use crate::common::xml::{escape_attribute, escape_text, resolve_entity, unescape_xml};
use crate::common::{Error, Result};
use crate::odf::elements::namespace;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// A child of an element: either a nested element or a run of text.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    /// The element, if this node is one
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    /// Mutable access to the element, if this node is one
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    /// True for text nodes made only of whitespace
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Node::Text(t) if t.trim().is_empty())
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

/// Attribute helpers shared by the element tree and every typed ODF wrapper.
pub trait ElementBase {
    /// The backing element
    fn element(&self) -> &Element;

    /// Mutable access to the backing element
    fn element_mut(&mut self) -> &mut Element;

    /// Tag name including prefix, e.g. `table:table-cell`
    fn tag_name(&self) -> &str {
        &self.element().tag
    }

    /// Get attribute value by qualified name
    fn get_attribute(&self, name: &str) -> Option<&str> {
        self.element().attribute(name)
    }

    /// Set attribute value
    fn set_attribute(&mut self, name: &str, value: &str) {
        self.element_mut().set_attribute(name, value);
    }

    /// Remove attribute, returning its old value
    fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.element_mut().remove_attribute(name)
    }

    /// Check if element has attribute
    fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    /// Boolean attribute (`true`/`false`)
    fn get_bool_attribute(&self, name: &str) -> Option<bool> {
        self.get_attribute(name).and_then(|s| match s {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        })
    }

    /// Non-negative integer attribute
    fn get_usize_attribute(&self, name: &str) -> Option<usize> {
        self.get_attribute(name).and_then(|s| s.trim().parse().ok())
    }

    /// Write a count attribute, removing it when it equals the implied default of 1
    fn set_count_attribute(&mut self, name: &str, count: usize) {
        if count > 1 {
            let mut buf = itoa::Buffer::new();
            self.set_attribute(name, buf.format(count));
        } else {
            self.remove_attribute(name);
        }
    }
}

/// A generic XML element.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl ElementBase for Element {
    fn element(&self) -> &Element {
        self
    }

    fn element_mut(&mut self) -> &mut Element {
        self
    }
}

impl Element {
    /// Create a new element
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Builder-style child appender
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Builder-style text appender
    pub fn with_text(mut self, text: &str) -> Self {
        self.push_text(text);
        self
    }

    /// Qualified tag name
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Rename the element, keeping attributes and children
    pub fn set_tag(&mut self, tag: &str) {
        self.tag = tag.to_string();
    }

    /// Namespace prefix of the tag, if any
    pub fn prefix(&self) -> Option<&str> {
        self.tag.split_once(':').map(|(p, _)| p)
    }

    /// Tag name without its prefix
    pub fn local_name(&self) -> &str {
        self.tag.split_once(':').map_or(&self.tag, |(_, l)| l)
    }

    /// Namespace URI of the tag, resolved against the well-known ODF prefixes
    pub fn namespace_uri(&self) -> Option<&'static str> {
        self.prefix().and_then(namespace::prefix_to_uri)
    }

    /// Get attribute value
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set attribute value, keeping the position of an existing attribute
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
    }

    /// Remove attribute, returning its old value
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(k, _)| k == name)?;
        Some(self.attributes.remove(pos).1)
    }

    /// Remove every attribute whose name satisfies the predicate
    pub fn retain_attributes(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.attributes.retain(|(k, _)| keep(k));
    }

    /// Iterate over `(name, value)` pairs in document order
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// All child nodes
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Mutable child list
    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    /// Detach and return all children
    pub fn take_children(&mut self) -> Vec<Node> {
        std::mem::take(&mut self.children)
    }

    /// Child elements, skipping text
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// First child element with the given tag
    pub fn first_child(&self, tag: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.tag == tag)
    }

    /// Mutable first child element with the given tag
    pub fn first_child_mut(&mut self, tag: &str) -> Option<&mut Element> {
        self.children
            .iter_mut()
            .filter_map(Node::as_element_mut)
            .find(|e| e.tag == tag)
    }

    /// Depth-first search for the first descendant with the given tag
    pub fn find(&self, tag: &str) -> Option<&Element> {
        self.child_elements()
            .find_map(|e| if e.tag == tag { Some(e) } else { e.find(tag) })
    }

    /// Mutable depth-first search for the first descendant with the given tag
    pub fn find_mut(&mut self, tag: &str) -> Option<&mut Element> {
        for child in self.children.iter_mut().filter_map(Node::as_element_mut) {
            if child.tag == tag {
                return Some(child);
            }
            if let Some(found) = child.find_mut(tag) {
                return Some(found);
            }
        }
        None
    }

    /// Append a child element
    pub fn push_child(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Append text, merging with a trailing text node
    pub fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.children.last_mut() {
            Some(Node::Text(last)) => last.push_str(text),
            _ => self.children.push(Node::Text(text.to_string())),
        }
    }

    /// Insert a node at `position` (appends when `position >= len`)
    pub fn insert_child(&mut self, position: usize, node: Node) {
        let position = position.min(self.children.len());
        self.children.insert(position, node);
    }

    /// Remove and return the node at `position`
    pub fn remove_child(&mut self, position: usize) -> Option<Node> {
        (position < self.children.len()).then(|| self.children.remove(position))
    }

    /// Remove all children
    pub fn clear_children(&mut self) {
        self.children.clear();
    }

    /// Plain text of this element and its descendants.
    ///
    /// ODF whitespace elements are expanded (`text:s`, `text:tab`,
    /// `text:line-break`) and consecutive paragraphs are separated by a newline.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => match e.tag.as_str() {
                    "text:s" => {
                        let count = e.get_usize_attribute("text:c").unwrap_or(1);
                        out.extend(std::iter::repeat_n(' ', count));
                    },
                    "text:tab" => out.push('\t'),
                    "text:line-break" => out.push('\n'),
                    "text:p" | "text:h" => {
                        if !out.is_empty() {
                            out.push('\n');
                        }
                        e.collect_text(out);
                    },
                    _ => e.collect_text(out),
                },
            }
        }
    }

    /// Remove every descendant element whose tag is in `tags`, keeping its
    /// children in place. Adjacent text nodes left behind are merged.
    pub fn strip_tags(&mut self, tags: &[&str]) {
        let children = std::mem::take(&mut self.children);
        let mut acc = Vec::with_capacity(children.len());
        Self::strip_into(children, tags, &mut acc);
        self.children = acc;
    }

    fn strip_into(nodes: Vec<Node>, tags: &[&str], acc: &mut Vec<Node>) {
        for node in nodes {
            match node {
                Node::Text(text) => match acc.last_mut() {
                    Some(Node::Text(last)) => last.push_str(&text),
                    _ => acc.push(Node::Text(text)),
                },
                Node::Element(mut element) => {
                    let children = std::mem::take(&mut element.children);
                    if tags.contains(&element.tag.as_str()) {
                        Self::strip_into(children, tags, acc);
                    } else {
                        let mut inner = Vec::with_capacity(children.len());
                        Self::strip_into(children, tags, &mut inner);
                        element.children = inner;
                        acc.push(Node::Element(element));
                    }
                },
            }
        }
    }

    /// Parse an element tree from XML bytes; returns the root element
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(bytes);
        let mut buf = Vec::new();
        let mut stack: Vec<Element> = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => stack.push(Self::from_start_tag(e)?),
                Event::Empty(ref e) => {
                    let element = Self::from_start_tag(e)?;
                    match stack.last_mut() {
                        Some(parent) => parent.push_child(element),
                        None => return Ok(element),
                    }
                },
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        Error::XmlError("closing tag without opening tag".to_string())
                    })?;
                    match stack.last_mut() {
                        Some(parent) => parent.push_child(element),
                        None => return Ok(element),
                    }
                },
                Event::Text(ref t) => {
                    if let Some(current) = stack.last_mut() {
                        let raw = String::from_utf8(t.to_vec())?;
                        current.push_text(&unescape_xml(&raw));
                    }
                },
                Event::CData(ref t) => {
                    if let Some(current) = stack.last_mut() {
                        current.push_text(&String::from_utf8(t.to_vec())?);
                    }
                },
                Event::GeneralRef(ref r) => {
                    if let Some(current) = stack.last_mut() {
                        let name = String::from_utf8(r.to_vec())?;
                        let ch = resolve_entity(&name).ok_or_else(|| {
                            Error::XmlError(format!("unknown entity '&{};'", name))
                        })?;
                        current.push_text(ch.encode_utf8(&mut [0u8; 4]));
                    }
                },
                Event::Eof => break,
                _ => {},
            }
            buf.clear();
        }

        Err(Error::XmlError("no root element found".to_string()))
    }

    /// Parse an element tree from an XML string
    pub fn parse(xml: &str) -> Result<Self> {
        Self::from_bytes(xml.as_bytes())
    }

    fn from_start_tag(e: &BytesStart<'_>) -> Result<Self> {
        let tag = String::from_utf8(e.name().as_ref().to_vec())?;
        let mut element = Element::new(&tag);
        for attr in e.attributes() {
            let attr = attr?;
            let key = String::from_utf8(attr.key.as_ref().to_vec())?;
            let raw = String::from_utf8(attr.value.to_vec())?;
            element
                .attributes
                .push((key, unescape_xml(&raw).into_owned()));
        }
        Ok(element)
    }

    /// Serialize element to an XML fragment
    pub fn to_xml_string(&self) -> String {
        let mut xml = String::new();
        self.write_xml(&mut xml);
        xml
    }

    /// Serialize as a standalone document with an XML declaration
    pub fn to_xml_document(&self) -> String {
        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        self.write_xml(&mut xml);
        xml
    }

    /// Append the serialized element to `out`
    pub fn write_xml(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape_attribute(value));
            out.push('"');
        }

        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }

        out.push('>');
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(&escape_text(t)),
                Node::Element(e) => e.write_xml(out),
            }
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_content() {
        let xml = r#"<text:p text:style-name="P1">a<text:span>b</text:span>c</text:p>"#;
        let element = Element::parse(xml).unwrap();
        assert_eq!(element.tag(), "text:p");
        assert_eq!(element.local_name(), "p");
        assert_eq!(element.attribute("text:style-name"), Some("P1"));
        assert_eq!(element.children().len(), 3);
        assert_eq!(element.text_content(), "abc");
        assert_eq!(element.to_xml_string(), xml);
    }

    #[test]
    fn test_parse_empty_and_entities() {
        let xml = r#"<root a="x &amp; y"><leaf/>1 &lt; 2</root>"#;
        let element = Element::parse(xml).unwrap();
        assert_eq!(element.attribute("a"), Some("x & y"));
        assert!(element.first_child("leaf").is_some());
        assert_eq!(element.text_content(), "1 < 2");
        assert_eq!(element.to_xml_string(), xml);

        let single = Element::parse("<only b=\"1\"/>").unwrap();
        assert_eq!(single.tag(), "only");
    }

    #[test]
    fn test_text_content_expands_whitespace_elements() {
        let xml = r#"<cell><text:p>a<text:s text:c="3"/>b<text:tab/>c</text:p><text:p>d</text:p></cell>"#;
        let element = Element::parse(xml).unwrap();
        assert_eq!(element.text_content(), "a   b\tc\nd");
    }

    #[test]
    fn test_strip_tags_bubbles_children() {
        let xml = r#"<text:p>x<text:span>y<text:a>z</text:a></text:span>w</text:p>"#;
        let mut element = Element::parse(xml).unwrap();
        element.strip_tags(&["text:span"]);
        assert_eq!(element.to_xml_string(), "<text:p>xy<text:a>z</text:a>w</text:p>");

        element.strip_tags(&["text:a"]);
        assert_eq!(element.children(), &[Node::Text("xyzw".to_string())]);
    }

    #[test]
    fn test_attribute_editing_and_counts() {
        let mut element = Element::new("table:table-cell");
        element.set_count_attribute("table:number-columns-repeated", 4);
        assert_eq!(element.get_usize_attribute("table:number-columns-repeated"), Some(4));
        element.set_count_attribute("table:number-columns-repeated", 1);
        assert!(!element.has_attribute("table:number-columns-repeated"));

        element.set_attribute("b", "1");
        element.set_attribute("a", "2");
        element.set_attribute("b", "3");
        let names: Vec<_> = element.attributes().map(|(k, _)| k).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(element.remove_attribute("b"), Some("3".to_string()));
    }

    #[test]
    fn test_child_editing() {
        let mut element = Element::new("root");
        element.push_child(Element::new("a"));
        element.insert_child(0, Node::Element(Element::new("first")));
        element.insert_child(99, Node::Text("tail".to_string()));
        assert_eq!(element.to_xml_string(), "<root><first/><a/>tail</root>");
        assert!(element.remove_child(5).is_none());
        assert!(matches!(element.remove_child(0), Some(Node::Element(_))));
        assert_eq!(element.namespace_uri(), None);
        assert_eq!(
            Element::new("table:table").namespace_uri(),
            Some("urn:oasis:names:tc:opendocument:xmlns:table:1.0")
        );
    }

    #[test]
    fn test_unbalanced_xml_is_rejected() {
        assert!(Element::parse("").is_err());
        assert!(Element::parse("<a><b></a>").is_err());
    }
}
