// src/export/writer.rs

//! Structured document writer
//!
//! Backup documents are built as `XmlNode` trees and rendered with
//! quick-xml. Whether a field is an attribute or a child element is decided
//! per field by the code building the node.

use crate::error::{Error, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Logical XML element
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlNode {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
    /// Unescaped text content
    pub text: Option<String>,
}

impl XmlNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Element holding only text
    pub fn leaf(name: impl Into<String>, value: impl Display) -> Self {
        Self {
            name: name.into(),
            text: Some(value.to_string()),
            ..Self::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.attrs.push((name.into(), value.to_string()));
        self
    }

    pub fn child(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }

    /// Append a text-only child
    pub fn field(self, name: &str, value: impl Display) -> Self {
        self.child(XmlNode::leaf(name, value))
    }

    pub fn children(mut self, children: impl IntoIterator<Item = XmlNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn find(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// Render a document: XML declaration, then `root` indented by two spaces
pub fn render(root: &XmlNode) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| Error::WriterState(e.to_string()))?;
    write_node(&mut writer, root).map_err(|e| Error::WriterState(e.to_string()))?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> quick_xml::Result<()> {
    let mut start = BytesStart::new(node.name.as_str());
    for (key, value) in &node.attrs {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    writer.write_event(Event::Start(start))?;
    // A text event keeps the end tag on the start tag's line: `<tags></tags>`
    match &node.text {
        Some(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
        None if node.children.is_empty() => writer.write_event(Event::Text(BytesText::new("")))?,
        None => {}
    }
    for child in &node.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(node.name.as_str())))?;
    Ok(())
}

/// Writes documents under a backup root, one open document at a time
#[derive(Debug)]
pub struct DocumentWriter {
    root: PathBuf,
    current: Option<PathBuf>,
    written: usize,
}

impl DocumentWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            current: None,
            written: 0,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Open `relative` for writing
    ///
    /// Reopening the document already open is a no-op. Opening a different
    /// one before closing is an error.
    pub fn open(&mut self, relative: impl AsRef<Path>) -> Result<()> {
        let relative = relative.as_ref();
        match &self.current {
            Some(open) if open == relative => return Ok(()),
            Some(open) => {
                return Err(Error::WriterState(format!(
                    "cannot open {} while {} is open",
                    relative.display(),
                    open.display()
                )));
            }
            None => {}
        }

        if let Some(parent) = self.root.join(relative).parent() {
            fs::create_dir_all(parent)?;
        }
        self.current = Some(relative.to_path_buf());
        Ok(())
    }

    /// Render `root` into the open document
    pub fn write(&mut self, root: &XmlNode) -> Result<()> {
        let relative = self
            .current
            .as_ref()
            .ok_or_else(|| Error::WriterState(format!("no document open to write <{}>", root.name)))?;
        let path = self.root.join(relative);
        fs::write(&path, render(root)?)?;
        self.written += 1;
        debug!("Wrote {}", relative.display());
        Ok(())
    }

    pub fn close(&mut self) {
        self.current = None;
    }

    /// Open, write and close in one step
    pub fn write_document(&mut self, relative: impl AsRef<Path>, root: &XmlNode) -> Result<()> {
        self.open(relative)?;
        let result = self.write(root);
        self.close();
        result
    }

    /// Write `root` to `relative` unless the file already exists
    ///
    /// Returns whether the file was already present.
    pub fn ensure_exists(&mut self, relative: impl AsRef<Path>, root: &XmlNode) -> Result<bool> {
        let relative = relative.as_ref();
        if self.root.join(relative).exists() {
            return Ok(true);
        }
        self.write_document(relative, root)?;
        Ok(false)
    }

    /// Number of documents written so far
    pub fn written(&self) -> usize {
        self.written
    }
}
