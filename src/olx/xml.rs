// src/olx/xml.rs

//! Forward-only reading of OLX documents
//!
//! `XmlStream` walks one document: its root element, then the direct
//! children of the root. Small irregular subtrees (problem content) are
//! materialized as `Element` trees that keep text and attribute values in
//! their original escaped form, so they can be written back out verbatim.

use crate::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Unescaped attributes of an element
#[derive(Debug, Clone, Default)]
pub(crate) struct Attrs(BTreeMap<String, String>);

impl Attrs {
    pub(crate) fn from_start(start: &BytesStart<'_>, path: &Path) -> Result<Self> {
        let mut map = BTreeMap::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| Error::xml(path, e))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            // HTML entities such as &nbsp; are not XML; keep them literal
            let value = match attr.unescape_value() {
                Ok(value) => value.into_owned(),
                Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
            };
            map.insert(key, value);
        }
        Ok(Self(map))
    }

    pub(crate) fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Attribute value or the empty string
    pub(crate) fn string(&self, name: &str) -> String {
        self.get(name).unwrap_or_default().to_string()
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }
}

/// A direct child of the document root
pub(crate) enum Child {
    Element { start: BytesStart<'static>, empty: bool },
    Text(String),
}

pub(crate) struct XmlStream {
    path: PathBuf,
    reader: Reader<BufReader<File>>,
    buf: Vec<u8>,
}

impl XmlStream {
    /// Open a document; a missing file is a broken reference
    pub(crate) fn open(path: &Path, kind: &str) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::missing(kind, path));
        }
        let reader = Reader::from_reader(BufReader::new(File::open(path)?));
        Ok(Self {
            path: path.to_path_buf(),
            reader,
            buf: Vec::new(),
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    fn next_event(&mut self) -> Result<Event<'static>> {
        self.buf.clear();
        let event = self
            .reader
            .read_event_into(&mut self.buf)
            .map_err(|e| Error::xml(&self.path, e))?;
        Ok(event.into_owned())
    }

    /// Read up to the root element, which must be `<expected>`
    ///
    /// Returns the root's attributes and whether it was self-closing.
    pub(crate) fn root(&mut self, expected: &str) -> Result<(Attrs, bool)> {
        loop {
            let (start, empty) = match self.next_event()? {
                Event::Start(start) => (start, false),
                Event::Empty(start) => (start, true),
                Event::Eof => return Err(Error::parse(&self.path, "document has no root element")),
                _ => continue,
            };
            let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
            if name != expected {
                return Err(Error::parse(
                    &self.path,
                    format!("expected <{}> root element, found <{}>", expected, name),
                ));
            }
            return Ok((Attrs::from_start(&start, &self.path)?, empty));
        }
    }

    /// Next direct child of the root, `None` once the root closes
    ///
    /// Whitespace-only text is skipped. A returned non-empty element must be
    /// consumed with `skip` or `Element::read` before calling again.
    pub(crate) fn next_child(&mut self) -> Result<Option<Child>> {
        loop {
            match self.next_event()? {
                Event::Start(start) => return Ok(Some(Child::Element { start, empty: false })),
                Event::Empty(start) => return Ok(Some(Child::Element { start, empty: true })),
                Event::Text(text) => {
                    let raw = String::from_utf8_lossy(&text).into_owned();
                    if !raw.trim().is_empty() {
                        return Ok(Some(Child::Text(raw)));
                    }
                }
                Event::CData(data) => {
                    let raw = String::from_utf8_lossy(&data).into_owned();
                    return Ok(Some(Child::Text(raw)));
                }
                Event::End(_) => return Ok(None),
                Event::Eof => {
                    return Err(Error::parse(&self.path, "unexpected end of document"));
                }
                _ => {}
            }
        }
    }

    /// Skip the content of a non-empty element
    pub(crate) fn skip(&mut self, start: &BytesStart<'_>) -> Result<()> {
        self.buf.clear();
        self.reader
            .read_to_end_into(start.name(), &mut self.buf)
            .map_err(|e| Error::xml(&self.path, e))?;
        Ok(())
    }
}

/// Node of a materialized subtree
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    Element(Element),
    /// Escaped text exactly as it appeared in the source
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Element {
    pub(crate) name: String,
    /// Raw (still escaped) attribute values
    pub(crate) attrs: Vec<(String, String)>,
    pub(crate) children: Vec<Node>,
}

impl Element {
    /// Materialize the element that `start` opened
    pub(crate) fn read(stream: &mut XmlStream, start: BytesStart<'static>, empty: bool) -> Result<Self> {
        let mut element = Self::from_start(&start, stream.path())?;
        if empty {
            return Ok(element);
        }

        loop {
            match stream.next_event()? {
                Event::Start(child) => {
                    let child = Self::read(stream, child, false)?;
                    element.children.push(Node::Element(child));
                }
                Event::Empty(child) => {
                    let child = Self::from_start(&child, stream.path())?;
                    element.children.push(Node::Element(child));
                }
                Event::Text(text) => {
                    element
                        .children
                        .push(Node::Text(String::from_utf8_lossy(&text).into_owned()));
                }
                Event::CData(data) => {
                    let raw = format!("<![CDATA[{}]]>", String::from_utf8_lossy(&data));
                    element.children.push(Node::Text(raw));
                }
                Event::End(_) => return Ok(element),
                Event::Eof => {
                    return Err(Error::parse(
                        stream.path(),
                        format!("unterminated <{}>", element.name),
                    ));
                }
                _ => {}
            }
        }
    }

    fn from_start(start: &BytesStart<'_>, path: &Path) -> Result<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| Error::xml(path, e))?;
            attrs.push((
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                String::from_utf8_lossy(&attr.value).into_owned(),
            ));
        }
        Ok(Self {
            name,
            attrs,
            children: Vec::new(),
        })
    }

    pub(crate) fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub(crate) fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    pub(crate) fn find(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    /// Concatenated text of the subtree, skipping elements named in `exclude`
    pub(crate) fn text_excluding(&self, exclude: &[&str]) -> String {
        let mut out = String::new();
        for node in &self.children {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Element(e) if !exclude.contains(&e.name.as_str()) => {
                    out.push_str(&e.text_excluding(exclude));
                }
                Node::Element(_) => {}
            }
        }
        out
    }

    pub(crate) fn inner_xml(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            write_node(node, &mut out);
        }
        out
    }

    pub(crate) fn outer_xml(&self) -> String {
        let mut out = String::new();
        write_element(self, &mut out);
        out
    }
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(text),
        Node::Element(element) => write_element(element, out),
    }
}

fn write_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attrs {
        out.push_str(&format!(" {}=\"{}\"", key, value.replace('"', "&quot;")));
    }
    if element.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &element.children {
        write_node(child, out);
    }
    out.push_str(&format!("</{}>", element.name));
}
