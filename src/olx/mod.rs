// src/olx/mod.rs

//! Source model: edX OLX course exports
//!
//! An export is a directory of small XML documents linked by `url_name`:
//!
//! ```text
//! course/course.xml        -> <chapter url_name="..."/>
//! chapter/<id>.xml         -> <sequential url_name="..."/>
//! sequential/<id>.xml      -> <vertical url_name="..."/>
//! vertical/<id>.xml        -> <html/>, <problem/>, <video/>, <discussion/>
//! html/<id>.xml + html/<filename>.html
//! problem/<id>.xml
//! policies/assets.json
//! static/...
//! ```
//!
//! Parsing produces a `SourceTree`, an arena of typed nodes.

mod assets;
mod dates;
mod model;
mod parser;
mod problem;
mod xml;

pub use assets::{AssetEntry, AssetManifest};
pub use dates::parse_date;
pub use model::{
    Chapter, Choice, Course, Discussion, Html, NodeData, NodeId, NodeKind, Problem, Question,
    Sequential, SourceNode, SourceTree, Vertical, Video, Wiki,
};
pub use parser::OlxParser;

use crate::error::Result;
use std::path::Path;

/// Parse the course rooted at `root`
pub fn parse_course(root: &Path) -> Result<SourceTree> {
    OlxParser::new(root).parse()
}
