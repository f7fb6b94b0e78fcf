// src/olx/model.rs

//! Typed source tree of an OLX course
//!
//! Nodes live in one arena per conversion run. Children are ordered indices,
//! parents are optional indices used only for contextual lookups.

use super::assets::AssetManifest;
use std::fmt;

/// Index of a node in the `SourceTree` arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Content kinds of the OLX hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Course,
    Chapter,
    Sequential,
    Vertical,
    Html,
    Video,
    Problem,
    Discussion,
}

impl NodeKind {
    /// Element name, which is also the directory holding this kind's documents
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Course => "course",
            Self::Chapter => "chapter",
            Self::Sequential => "sequential",
            Self::Vertical => "vertical",
            Self::Html => "html",
            Self::Video => "video",
            Self::Problem => "problem",
            Self::Discussion => "discussion",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "course" => Self::Course,
            "chapter" => Self::Chapter,
            "sequential" => Self::Sequential,
            "vertical" => Self::Vertical,
            "html" => Self::Html,
            "video" => Self::Video,
            "problem" => Self::Problem,
            "discussion" => Self::Discussion,
            _ => return None,
        })
    }

    /// Non-interactive leaf content
    pub const fn is_static(&self) -> bool {
        matches!(self, Self::Html | Self::Video)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    pub display_name: String,
    /// Epoch seconds, 0 when unset
    pub start: i64,
    pub end: i64,
    pub course_image: String,
    pub wiki: Option<Wiki>,
    pub assets: AssetManifest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wiki {
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub display_name: String,
    pub start: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequential {
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vertical {
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Html {
    pub display_name: String,
    /// Base name of the body document under `html/`
    pub filename: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Video {
    pub display_name: String,
    pub youtube_id: Option<String>,
    pub sources: Vec<String>,
}

impl Video {
    /// HTML embed for the video
    pub fn render(&self) -> String {
        if let Some(id) = &self.youtube_id {
            return format!(
                "<iframe width=\"560\" height=\"315\" src=\"https://www.youtube.com/embed/{}\" \
                 frameborder=\"0\" allowfullscreen></iframe>",
                id
            );
        }

        let sources: String = self
            .sources
            .iter()
            .map(|src| format!("<source src=\"{}\">", src))
            .collect();
        format!("<video controls>{}</video>", sources)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    pub display_name: String,
    pub max_attempts: Option<u32>,
    pub show_answer: String,
    pub weight: Option<f64>,
    pub rerandomize: bool,
    /// Outer XML of every non-question, non-solution child
    pub instructions: Vec<String>,
    /// Inner XML of each `<solution>`
    pub solutions: Vec<String>,
    pub questions: Vec<Question>,
}

impl Problem {
    pub fn content(&self) -> String {
        self.instructions.join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discussion {
    pub display_name: String,
    pub category: String,
    pub target: String,
}

/// Gradable question parsed from a problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Question {
    /// `<multiplechoiceresponse><choicegroup>`
    MultipleChoice {
        label: String,
        kind: String,
        choices: Vec<Choice>,
    },
    /// `<choiceresponse><checkboxgroup>`
    Checkbox {
        label: String,
        direction: String,
        choices: Vec<Choice>,
    },
}

impl Question {
    pub fn choices(&self) -> &[Choice] {
        match self {
            Self::MultipleChoice { choices, .. } | Self::Checkbox { choices, .. } => choices,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub correct: bool,
    pub text: String,
}

/// Per-kind payload of a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Course(Course),
    Chapter(Chapter),
    Sequential(Sequential),
    Vertical(Vertical),
    Html(Html),
    Video(Video),
    Problem(Problem),
    Discussion(Discussion),
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Course(_) => NodeKind::Course,
            Self::Chapter(_) => NodeKind::Chapter,
            Self::Sequential(_) => NodeKind::Sequential,
            Self::Vertical(_) => NodeKind::Vertical,
            Self::Html(_) => NodeKind::Html,
            Self::Video(_) => NodeKind::Video,
            Self::Problem(_) => NodeKind::Problem,
            Self::Discussion(_) => NodeKind::Discussion,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Self::Course(n) => &n.display_name,
            Self::Chapter(n) => &n.display_name,
            Self::Sequential(n) => &n.display_name,
            Self::Vertical(n) => &n.display_name,
            Self::Html(n) => &n.display_name,
            Self::Video(n) => &n.display_name,
            Self::Problem(n) => &n.display_name,
            Self::Discussion(n) => &n.display_name,
        }
    }

    /// Rendered HTML of leaf content; containers have none
    pub fn content(&self) -> Option<String> {
        match self {
            Self::Html(html) => Some(html.body.clone()),
            Self::Video(video) => Some(video.render()),
            Self::Problem(problem) => Some(problem.content()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceNode {
    pub id: NodeId,
    /// Parse-order tiebreak
    pub seq: u32,
    pub url_name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub data: NodeData,
}

impl SourceNode {
    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    pub fn display_name(&self) -> &str {
        self.data.display_name()
    }
}

/// Arena of parsed nodes, rooted at the course
#[derive(Debug, Clone)]
pub struct SourceTree {
    nodes: Vec<SourceNode>,
    root: NodeId,
}

impl SourceTree {
    pub(crate) fn new(nodes: Vec<SourceNode>, root: NodeId) -> Self {
        Self { nodes, root }
    }

    pub fn root(&self) -> &SourceNode {
        &self.nodes[self.root.0]
    }

    pub fn node(&self, id: NodeId) -> &SourceNode {
        &self.nodes[id.0]
    }

    /// The course record at the root
    pub fn course(&self) -> &Course {
        match &self.root().data {
            NodeData::Course(course) => course,
            // parse() only ever roots the tree at a course node
            other => unreachable!("source tree rooted at {}", other.kind()),
        }
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &SourceNode> {
        self.nodes[id.0].children.iter().map(|c| &self.nodes[c.0])
    }

    pub fn parent(&self, id: NodeId) -> Option<&SourceNode> {
        self.nodes[id.0].parent.map(|p| &self.nodes[p.0])
    }

    pub fn nodes(&self) -> &[SourceNode] {
        &self.nodes
    }

    pub fn count(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|n| n.kind() == kind).count()
    }
}
