//! Lightweight element tree for logic tree documents.
//!
//! Logic tree documents are small, so they are read whole into [`Element`]s
//! that remember the line each element starts on. Namespaces are dropped:
//! elements are matched by local name.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// One XML element with its attributes, text and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
    line: u64,
}

impl Element {
    #[inline]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// 1-based line of the element's start tag.
    #[inline]
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Concatenated character data directly inside this element.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Children with the given local name, in document order.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.tag == tag)
    }

    /// First child with the given local name.
    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.tag == tag)
    }
}

/// Parses a whole document into its root element.
///
/// Errors are returned as plain messages; callers attach the file identity.
pub fn parse_document(content: &str) -> Result<Element, String> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut lines = LineCounter::new(content);

    loop {
        let start = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|e| format!("{} (at byte {})", e, reader.error_position()))?;
        match event {
            Event::Start(e) => {
                let element = start_element(&e, lines.line_at(start))?;
                stack.push(element);
            }
            Event::Empty(e) => {
                let element = start_element(&e, lines.line_at(start))?;
                close_element(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| "unexpected closing tag".to_string())?;
                close_element(element, &mut stack, &mut root)?;
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(|e| e.to_string())?;
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&text);
                }
            }
            Event::CData(t) => {
                let text = std::str::from_utf8(&t).map_err(|e| e.to_string())?;
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(format!(
            "element <{}> opened on line {} is never closed",
            open.tag, open.line
        ));
    }
    root.ok_or_else(|| "document has no root element".to_string())
}

fn start_element(e: &BytesStart<'_>, line: u64) -> Result<Element, String> {
    let tag = std::str::from_utf8(e.local_name().as_ref())
        .map_err(|err| err.to_string())?
        .to_string();
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| err.to_string())?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|err| err.to_string())?
            .to_string();
        let value = attr.unescape_value().map_err(|err| err.to_string())?;
        attrs.push((key, value.into_owned()));
    }
    Ok(Element {
        tag,
        attrs,
        text: String::new(),
        children: Vec::new(),
        line,
    })
}

fn close_element(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), String> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(format!(
                "second root element <{}> on line {}",
                element.tag, element.line
            ))
        }
    }
    Ok(())
}

// Positions only grow while reading, so newlines are counted once.
struct LineCounter<'a> {
    bytes: &'a [u8],
    counted: usize,
    line: u64,
}

impl<'a> LineCounter<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            bytes: content.as_bytes(),
            counted: 0,
            line: 1,
        }
    }

    // Line of the first non-whitespace byte at or after `position`, which is
    // the `<` of the tag read from there.
    fn line_at(&mut self, position: usize) -> u64 {
        let start = position.min(self.bytes.len());
        let end = start
            + self.bytes[start..]
                .iter()
                .take_while(|b| b.is_ascii_whitespace())
                .count();
        if end > self.counted {
            self.line += self.bytes[self.counted..end]
                .iter()
                .filter(|&&b| b == b'\n')
                .count() as u64;
            self.counted = end;
        }
        self.line
    }
}
