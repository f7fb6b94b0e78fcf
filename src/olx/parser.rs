// src/olx/parser.rs

//! Recursive OLX document reader
//!
//! Each document is read in one forward pass. Links to child documents are
//! recorded while reading and resolved once the document is consumed, so
//! only one file is open at a time per level and child order follows
//! document order.

use super::assets::AssetManifest;
use super::dates::parse_date;
use super::model::*;
use super::problem::parse_problem;
use super::xml::{Attrs, Child, XmlStream};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Parse-order ids start above this value
const SEQ_BASE: u32 = 50;

/// Child reference found while reading a document
enum ChildLink {
    /// Separate document at `<kind>/<url_name>.xml`
    Deferred { kind: NodeKind, url_name: String },
    /// Fully described by the referencing element
    Inline { url_name: String, data: NodeData },
}

pub struct OlxParser {
    root_dir: PathBuf,
    nodes: Vec<SourceNode>,
    next_seq: u32,
}

impl OlxParser {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            nodes: Vec::new(),
            next_seq: SEQ_BASE,
        }
    }

    /// Parse the whole course rooted at this directory
    pub fn parse(mut self) -> Result<SourceTree> {
        let (course_path, url_name) = self.locate_course()?;
        let root = self.parse_document(NodeKind::Course, &url_name, &course_path, None)?;
        debug!("Parsed {} source nodes from {}", self.nodes.len(), self.root_dir.display());
        Ok(SourceTree::new(self.nodes, root))
    }

    /// `course/course.xml`, or the document named by the top-level pointer
    fn locate_course(&self) -> Result<(PathBuf, String)> {
        let direct = self.root_dir.join("course").join("course.xml");
        if direct.is_file() {
            return Ok((direct, "course".to_string()));
        }

        let pointer = self.root_dir.join("course.xml");
        if !pointer.is_file() {
            return Err(Error::missing("course", direct));
        }
        let mut stream = XmlStream::open(&pointer, "course")?;
        let (attrs, _) = stream.root("course")?;
        let url_name = attrs
            .get("url_name")
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::parse(&pointer, "course pointer without url_name"))?
            .to_string();
        debug!("Following course pointer to {}", url_name);
        Ok((self.document_path(NodeKind::Course, &url_name), url_name))
    }

    fn document_path(&self, kind: NodeKind, url_name: &str) -> PathBuf {
        self.root_dir.join(kind.tag()).join(format!("{}.xml", url_name))
    }

    fn parse_node(&mut self, kind: NodeKind, url_name: &str, parent: NodeId) -> Result<NodeId> {
        let path = self.document_path(kind, url_name);
        self.parse_document(kind, url_name, &path, Some(parent))
    }

    fn parse_document(
        &mut self,
        kind: NodeKind,
        url_name: &str,
        path: &Path,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        debug!("Reading {} document {}", kind, path.display());
        let mut stream = XmlStream::open(path, kind.tag())?;
        let (attrs, empty) = stream.root(kind.tag())?;
        let mut links = Vec::new();

        let data = match kind {
            NodeKind::Course => {
                let mut course = Course {
                    display_name: attrs.string("display_name"),
                    start: date_attr(&attrs, "start", path)?,
                    end: date_attr(&attrs, "end", path)?,
                    course_image: attrs.string("course_image"),
                    wiki: None,
                    assets: AssetManifest::load(&self.root_dir.join("policies").join("assets.json"))?,
                };
                if !empty {
                    self.read_children(&mut stream, &mut links, |tag, child| match tag {
                        "wiki" => {
                            course.wiki = Some(Wiki { slug: child.string("slug") });
                            Ok(None)
                        }
                        "chapter" => Ok(Some(NodeKind::Chapter)),
                        _ => Ok(None),
                    })?;
                }
                NodeData::Course(course)
            }
            NodeKind::Chapter => {
                if !empty {
                    self.read_children(&mut stream, &mut links, |tag, _| {
                        Ok((tag == "sequential").then_some(NodeKind::Sequential))
                    })?;
                }
                NodeData::Chapter(Chapter {
                    display_name: attrs.string("display_name"),
                    start: date_attr(&attrs, "start", path)?,
                })
            }
            NodeKind::Sequential => {
                if !empty {
                    self.read_children(&mut stream, &mut links, |tag, _| {
                        Ok((tag == "vertical").then_some(NodeKind::Vertical))
                    })?;
                }
                NodeData::Sequential(Sequential {
                    display_name: attrs.string("display_name"),
                })
            }
            NodeKind::Vertical => {
                if !empty {
                    self.read_vertical_children(&mut stream, &mut links)?;
                }
                NodeData::Vertical(Vertical {
                    display_name: attrs.string("display_name"),
                })
            }
            NodeKind::Html => {
                let filename = attrs.get("filename").unwrap_or(url_name).to_string();
                let body_path = self.root_dir.join("html").join(format!("{}.html", filename));
                if !body_path.is_file() {
                    return Err(Error::missing("html body", body_path));
                }
                NodeData::Html(Html {
                    display_name: attrs.string("display_name"),
                    body: std::fs::read_to_string(&body_path)?,
                    filename,
                })
            }
            NodeKind::Problem => NodeData::Problem(parse_problem(&mut stream, &attrs, empty)?),
            NodeKind::Discussion => NodeData::Discussion(discussion_from(&attrs)),
            NodeKind::Video => NodeData::Video(video_from(&attrs, Vec::new())),
        };

        let id = self.push(url_name, parent, data);
        self.resolve(id, links)?;
        Ok(id)
    }

    /// Collect deferred links among the root's children
    ///
    /// `classify` maps an element to the kind it links to, or `None` for
    /// elements handled in place (or ignored).
    fn read_children<F>(&self, stream: &mut XmlStream, links: &mut Vec<ChildLink>, mut classify: F) -> Result<()>
    where
        F: FnMut(&str, &Attrs) -> Result<Option<NodeKind>>,
    {
        while let Some(child) = stream.next_child()? {
            let Child::Element { start, empty } = child else {
                continue;
            };
            let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
            let attrs = Attrs::from_start(&start, stream.path())?;
            if !empty {
                stream.skip(&start)?;
            }
            if let Some(kind) = classify(&tag, &attrs)? {
                links.push(ChildLink::Deferred {
                    kind,
                    url_name: required_url_name(&attrs, &tag, stream.path())?,
                });
            }
        }
        Ok(())
    }

    fn read_vertical_children(&self, stream: &mut XmlStream, links: &mut Vec<ChildLink>) -> Result<()> {
        while let Some(child) = stream.next_child()? {
            let Child::Element { start, empty } = child else {
                continue;
            };
            let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
            let attrs = Attrs::from_start(&start, stream.path())?;

            let link = match NodeKind::from_tag(&tag) {
                Some(kind @ (NodeKind::Html | NodeKind::Problem)) => {
                    if !empty {
                        stream.skip(&start)?;
                    }
                    ChildLink::Deferred {
                        kind,
                        url_name: required_url_name(&attrs, &tag, stream.path())?,
                    }
                }
                Some(NodeKind::Video) => {
                    let sources = if empty { Vec::new() } else { video_sources(stream)? };
                    ChildLink::Inline {
                        url_name: attrs.string("url_name"),
                        data: NodeData::Video(video_from(&attrs, sources)),
                    }
                }
                Some(NodeKind::Discussion) => {
                    if !empty {
                        stream.skip(&start)?;
                    }
                    let url_name = required_url_name(&attrs, &tag, stream.path())?;
                    if attrs.len() > 1 {
                        ChildLink::Inline {
                            url_name,
                            data: NodeData::Discussion(discussion_from(&attrs)),
                        }
                    } else {
                        ChildLink::Deferred {
                            kind: NodeKind::Discussion,
                            url_name,
                        }
                    }
                }
                _ => {
                    if !empty {
                        stream.skip(&start)?;
                    }
                    warn!("Skipping unsupported component <{}> in {}", tag, stream.path().display());
                    continue;
                }
            };
            links.push(link);
        }
        Ok(())
    }

    fn push(&mut self, url_name: &str, parent: Option<NodeId>, data: NodeData) -> NodeId {
        self.next_seq += 1;
        let id = NodeId(self.nodes.len());
        self.nodes.push(SourceNode {
            id,
            seq: self.next_seq,
            url_name: url_name.to_string(),
            parent,
            children: Vec::new(),
            data,
        });
        id
    }

    fn resolve(&mut self, id: NodeId, links: Vec<ChildLink>) -> Result<()> {
        let mut children = Vec::with_capacity(links.len());
        for link in links {
            let child = match link {
                ChildLink::Deferred { kind, url_name } => self.parse_node(kind, &url_name, id)?,
                ChildLink::Inline { url_name, data } => self.push(&url_name, Some(id), data),
            };
            children.push(child);
        }
        self.nodes[id.0].children = children;
        Ok(())
    }
}

fn required_url_name(attrs: &Attrs, tag: &str, path: &Path) -> Result<String> {
    attrs
        .get("url_name")
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::parse(path, format!("<{}> link without url_name", tag)))
}

fn date_attr(attrs: &Attrs, name: &str, path: &Path) -> Result<i64> {
    parse_date(attrs.get(name))
        .ok_or_else(|| Error::parse(path, format!("unparsable {} date {:?}", name, attrs.string(name))))
}

fn discussion_from(attrs: &Attrs) -> Discussion {
    Discussion {
        display_name: attrs.string("display_name"),
        category: attrs.string("discussion_category"),
        target: attrs.string("discussion_target"),
    }
}

fn video_from(attrs: &Attrs, mut sources: Vec<String>) -> Video {
    let youtube_id = attrs
        .get("videoid")
        .or_else(|| attrs.get("youtube_id_1_0"))
        .or_else(|| {
            attrs
                .get("youtube")
                .and_then(|y| y.split(',').find_map(|s| s.trim().strip_prefix("1.00:")))
        })
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    if let Some(list) = attrs.get("html5_sources")
        && let Ok(parsed) = serde_json::from_str::<Vec<String>>(list)
    {
        for src in parsed.into_iter().rev() {
            if !sources.contains(&src) {
                sources.insert(0, src);
            }
        }
    }

    Video {
        display_name: attrs.string("display_name"),
        youtube_id,
        sources,
    }
}

/// `<source src>` children of an inline video element
fn video_sources(stream: &mut XmlStream) -> Result<Vec<String>> {
    let mut sources = Vec::new();
    while let Some(child) = stream.next_child()? {
        let Child::Element { start, empty } = child else {
            continue;
        };
        let attrs = Attrs::from_start(&start, stream.path())?;
        if !empty {
            stream.skip(&start)?;
        }
        if start.name().as_ref() == b"source"
            && let Some(src) = attrs.get("src")
        {
            sources.push(src.to_string());
        }
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(
            root,
            "course/course.xml",
            r#"<course display_name="Simple Course" start="&quot;2021-01-01T00:00:00+00:00&quot;" end="2021-07-28T00:00:00+00:00">
  <chapter url_name="ch1"/>
  <wiki slug="simple.wiki"/>
</course>"#,
        );
        write(root, "chapter/ch1.xml", r#"<chapter display_name="One"><sequential url_name="s1"/></chapter>"#);
        write(root, "sequential/s1.xml", r#"<sequential display_name="Seq"><vertical url_name="v1"/></sequential>"#);
        write(
            root,
            "vertical/v1.xml",
            r#"<vertical display_name="Vert">
  <html url_name="h1"/>
  <video url_name="vid" display_name="Clip" youtube="0.75:aaa,1.00:abc123"/>
  <discussion url_name="d1" discussion_category="Week 1" display_name="Talk" discussion_target="Topic"/>
  <lti url_name="ext"/>
  <problem url_name="p1"/>
</vertical>"#,
        );
        write(root, "html/h1.xml", r#"<html display_name="Intro" filename="intro_body"/>"#);
        write(root, "html/intro_body.html", "<p>Hello</p>");
        write(
            root,
            "problem/p1.xml",
            r#"<problem display_name="Check"><multiplechoiceresponse><choicegroup><choice correct="true">A</choice></choicegroup></multiplechoiceresponse></problem>"#,
        );
        write(root, "policies/assets.json", r#"{"a.png": {"contentType": "image/png"}}"#);
        dir
    }

    #[test]
    fn test_parse_full_tree() {
        let dir = fixture();
        let tree = OlxParser::new(dir.path()).parse().unwrap();

        let course = tree.course();
        assert_eq!(course.display_name, "Simple Course");
        assert_eq!(course.start, 1609459200);
        assert_eq!(course.end, 1627430400);
        assert_eq!(course.wiki.as_ref().unwrap().slug, "simple.wiki");
        assert!(course.assets.contains("a.png"));

        let chapters: Vec<_> = tree.children(tree.root().id).collect();
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].display_name(), "One");
        assert_eq!(tree.parent(chapters[0].id).unwrap().kind(), NodeKind::Course);

        let seq = tree.children(chapters[0].id).next().unwrap();
        let vert = tree.children(seq.id).next().unwrap();
        let kinds: Vec<_> = tree.children(vert.id).map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Html, NodeKind::Video, NodeKind::Discussion, NodeKind::Problem]
        );

        let items: Vec<_> = tree.children(vert.id).collect();
        match &items[0].data {
            NodeData::Html(html) => {
                assert_eq!(html.filename, "intro_body");
                assert_eq!(html.body, "<p>Hello</p>");
            }
            other => panic!("unexpected {:?}", other.kind()),
        }
        match &items[1].data {
            NodeData::Video(video) => assert_eq!(video.youtube_id.as_deref(), Some("abc123")),
            other => panic!("unexpected {:?}", other.kind()),
        }
        match &items[2].data {
            NodeData::Discussion(d) => assert_eq!(d.category, "Week 1"),
            other => panic!("unexpected {:?}", other.kind()),
        }
    }

    #[test]
    fn test_parse_order_ids_increase() {
        let dir = fixture();
        let tree = OlxParser::new(dir.path()).parse().unwrap();
        let seqs: Vec<u32> = tree.nodes().iter().map(|n| n.seq).collect();
        assert_eq!(seqs[0], SEQ_BASE + 1);
        assert!(seqs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_missing_child_document() {
        let dir = fixture();
        fs::remove_file(dir.path().join("sequential/s1.xml")).unwrap();
        let err = OlxParser::new(dir.path()).parse().unwrap_err();
        assert!(matches!(err, Error::MissingReference { .. }));
    }

    #[test]
    fn test_missing_html_body() {
        let dir = fixture();
        fs::remove_file(dir.path().join("html/intro_body.html")).unwrap();
        let err = OlxParser::new(dir.path()).parse().unwrap_err();
        assert!(matches!(err, Error::MissingReference { .. }));
    }

    #[test]
    fn test_bad_date_is_structural() {
        let dir = fixture();
        write(dir.path(), "chapter/ch1.xml", r#"<chapter display_name="One" start="soon"/>"#);
        let err = OlxParser::new(dir.path()).parse().unwrap_err();
        assert!(matches!(err, Error::StructuralParse { .. }));
    }

    #[test]
    fn test_course_pointer() {
        let dir = fixture();
        fs::rename(
            dir.path().join("course/course.xml"),
            dir.path().join("course/2021_T1.xml"),
        )
        .unwrap();
        write(dir.path(), "course.xml", r#"<course url_name="2021_T1" org="X" course="Y"/>"#);

        let tree = OlxParser::new(dir.path()).parse().unwrap();
        assert_eq!(tree.root().url_name, "2021_T1");
        assert_eq!(tree.count(NodeKind::Chapter), 1);
    }
}
