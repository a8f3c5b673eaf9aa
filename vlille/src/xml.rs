//! Minimal XML document model for API responses.
//!
//! The station API answers with small, flat XML documents. They are parsed
//! into a tree of [`Element`]s that keeps element names, attributes (in
//! document order) and text content, which is all the projections need.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Errors from parsing an XML response body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum XmlError {
    /// Malformed markup
    #[error("XML syntax error: {0}")]
    Syntax(String),

    /// Malformed attribute
    #[error("XML attribute error: {0}")]
    Attribute(String),

    /// Input ended with an element still open
    #[error("XML element <{0}> is never closed")]
    Unclosed(String),

    /// No root element
    #[error("XML document has no root element")]
    Empty,
}

/// One element of a parsed document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Element name, including any namespace prefix
    pub name: String,
    /// Attributes in document order
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order
    pub children: Vec<Element>,
    /// Concatenated text and CDATA content directly inside this element,
    /// untrimmed. Whitespace-only text nodes are dropped.
    pub text: String,
}

impl Element {
    /// Look up an attribute value by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn open(start: &BytesStart<'_>) -> Result<Self, XmlError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();

        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| XmlError::Attribute(e.to_string()))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|e| XmlError::Attribute(e.to_string()))?
                .into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            attributes,
            ..Self::default()
        })
    }
}

/// A parsed XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Element,
}

impl Document {
    /// Parse a document from its text.
    pub fn parse(xml: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(xml);

        let mut open: Vec<Element> = Vec::new();
        let mut root = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| XmlError::Syntax(e.to_string()))?;

            match event {
                Event::Start(start) => open.push(Element::open(&start)?),
                Event::Empty(start) => {
                    let element = Element::open(&start)?;
                    attach(&mut open, &mut root, element);
                }
                Event::End(_) => {
                    if let Some(element) = open.pop() {
                        attach(&mut open, &mut root, element);
                    }
                }
                Event::Text(text) => {
                    if let Some(current) = open.last_mut() {
                        let text = text
                            .unescape()
                            .map_err(|e| XmlError::Syntax(e.to_string()))?;
                        // Indentation between elements; real content is kept verbatim.
                        if !text.trim().is_empty() {
                            current.text.push_str(&text);
                        }
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = open.last_mut() {
                        current
                            .text
                            .push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(element) = open.pop() {
            return Err(XmlError::Unclosed(element.name));
        }

        root.map(|root| Document { root }).ok_or(XmlError::Empty)
    }

    /// The document element.
    pub fn root(&self) -> &Element {
        &self.root
    }
}

/// Attach a closed element to its parent, or make it the root.
fn attach(open: &mut [Element], root: &mut Option<Element>, element: Element) {
    match open.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}
