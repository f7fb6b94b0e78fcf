// tests/common/mod.rs

//! Shared test utilities: OLX course fixtures and backup readers.

#![allow(dead_code)]

use olx_convert::{BackupModel, ConvertConfig, SilentProgress, build_model, parse_course};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write `content` at `rel` under `root`, creating directories
pub fn write(root: &Path, rel: &str, content: impl AsRef<[u8]>) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// An OLX course tree built file by file in a temporary directory
pub struct CourseFixture {
    dir: TempDir,
    name: String,
    chapters: Vec<String>,
}

impl CourseFixture {
    pub fn new(name: &str) -> Self {
        let fixture = Self {
            dir: TempDir::new().unwrap(),
            name: name.to_string(),
            chapters: Vec::new(),
        };
        fixture.write_course();
        fixture
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    fn write_course(&self) {
        let chapters: String = self
            .chapters
            .iter()
            .map(|c| format!("  <chapter url_name=\"{}\"/>\n", c))
            .collect();
        write(
            self.root(),
            "course/course.xml",
            format!(
                "<course display_name=\"{}\" start=\"&quot;2021-01-01T00:00:00+00:00&quot;\" end=\"&quot;2021-07-28T00:00:00+00:00&quot;\">\n{}</course>\n",
                self.name, chapters
            ),
        );
    }

    pub fn chapter(&mut self, url_name: &str, display_name: &str, sequentials: &[&str]) -> &mut Self {
        write(
            self.root(),
            &format!("chapter/{}.xml", url_name),
            format!(
                "<chapter display_name=\"{}\">{}</chapter>",
                display_name,
                links("sequential", sequentials)
            ),
        );
        self.chapters.push(url_name.to_string());
        self.write_course();
        self
    }

    pub fn sequential(&mut self, url_name: &str, display_name: &str, verticals: &[&str]) -> &mut Self {
        write(
            self.root(),
            &format!("sequential/{}.xml", url_name),
            format!(
                "<sequential display_name=\"{}\">{}</sequential>",
                display_name,
                links("vertical", verticals)
            ),
        );
        self
    }

    /// A vertical whose children are given as raw XML
    pub fn vertical(&mut self, url_name: &str, display_name: &str, children: &str) -> &mut Self {
        write(
            self.root(),
            &format!("vertical/{}.xml", url_name),
            format!("<vertical display_name=\"{}\">\n{}\n</vertical>", display_name, children),
        );
        self
    }

    pub fn html(&mut self, url_name: &str, display_name: &str, body: &str) -> &mut Self {
        write(
            self.root(),
            &format!("html/{}.xml", url_name),
            format!("<html display_name=\"{}\" filename=\"{}\"/>", display_name, url_name),
        );
        write(self.root(), &format!("html/{}.html", url_name), body);
        self
    }

    /// A single-question multiple choice problem
    pub fn problem(&mut self, url_name: &str, display_name: &str, choices: &[(&str, bool)]) -> &mut Self {
        let choices: String = choices
            .iter()
            .map(|(text, correct)| format!("<choice correct=\"{}\">{}</choice>", correct, text))
            .collect();
        write(
            self.root(),
            &format!("problem/{}.xml", url_name),
            format!(
                "<problem display_name=\"{}\" rerandomize=\"never\">\n<p>Pick one</p>\n<multiplechoiceresponse><choicegroup label=\"Which?\">{}</choicegroup></multiplechoiceresponse>\n</problem>",
                display_name, choices
            ),
        );
        self
    }

    pub fn asset(&mut self, path: &str, bytes: &[u8]) -> &mut Self {
        write(self.root(), &format!("static/{}", path), bytes);
        self
    }

    pub fn assets_json(&mut self, json: &str) -> &mut Self {
        write(self.root(), "policies/assets.json", json);
        self
    }

    /// Pack the tree as a gzip tar wrapped in one top-level directory
    pub fn pack(&self, dest: &Path) -> PathBuf {
        let archive = dest.join("course.tar.gz");
        let file = fs::File::create(&archive).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        builder.append_dir_all("course-run", self.root()).unwrap();
        builder.into_inner().unwrap().finish().unwrap();
        archive
    }
}

fn links(tag: &str, names: &[&str]) -> String {
    names
        .iter()
        .map(|n| format!("<{} url_name=\"{}\"/>", tag, n))
        .collect()
}

/// One chapter, one sequential, one vertical holding `children`
pub fn single_vertical(name: &str, children: &str) -> CourseFixture {
    let mut fixture = CourseFixture::new(name);
    fixture
        .chapter("ch1", "Week 1", &["seq1"])
        .sequential("seq1", "Lesson", &["v1"])
        .vertical("v1", "Unit", children);
    fixture
}

/// Parse and build without exporting
pub fn build(fixture: &CourseFixture, config: &ConvertConfig) -> BackupModel {
    let tree = parse_course(fixture.root()).unwrap();
    build_model(&tree, fixture.root(), config, &SilentProgress::new()).unwrap()
}

pub fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap_or_else(|e| panic!("reading {}: {}", rel, e))
}

/// Text of every `<name>` element in `xml`, in document order
pub fn element_texts(xml: &str, name: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    let mut texts = Vec::new();
    let mut inside = false;
    let mut current = String::new();
    loop {
        match reader.read_event().unwrap() {
            Event::Start(e) if e.name().as_ref() == name.as_bytes() => {
                inside = true;
                current.clear();
            }
            Event::Text(t) if inside => current.push_str(&t.unescape().unwrap()),
            Event::End(e) if e.name().as_ref() == name.as_bytes() => {
                inside = false;
                texts.push(current.clone());
            }
            Event::Eof => break,
            _ => {}
        }
    }
    texts
}

/// Name and attributes of the root element of `xml`
pub fn root_element(xml: &str) -> (String, Vec<(String, String)>) {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event().unwrap() {
            Event::Start(e) | Event::Empty(e) => {
                let name = String::from_utf8(e.name().as_ref().to_vec()).unwrap();
                let attrs = e
                    .attributes()
                    .map(|a| {
                        let a = a.unwrap();
                        (
                            String::from_utf8(a.key.as_ref().to_vec()).unwrap(),
                            a.unescape_value().unwrap().into_owned(),
                        )
                    })
                    .collect();
                return (name, attrs);
            }
            Event::Eof => panic!("no root element"),
            _ => {}
        }
    }
}

/// Number of regular files below `dir`
pub fn count_files(dir: &Path) -> usize {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .count()
}
