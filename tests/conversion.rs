// tests/conversion.rs

//! End-to-end conversion: OLX tree or archive in, backup directory out.

mod common;

use common::{CourseFixture, build, element_texts, read, root_element};
use olx_convert::backup::entities::{CourseEntity, SectionEntity};
use olx_convert::{
    CallbackProgress, ConvertConfig, Error, ProgressEvent, SilentProgress, convert, inspect,
};
use std::sync::Mutex;
use tempfile::TempDir;

fn simple_course() -> CourseFixture {
    let mut fixture = CourseFixture::new("Simple Course");
    fixture
        .chapter("ch1", "Getting started", &["seq1"])
        .chapter("ch2", "Wrapping up", &["seq2"])
        .sequential("seq1", "Welcome", &["v1"])
        .sequential("seq2", "Goodbye", &["v2"])
        .vertical("v1", "Hello", r#"<html url_name="intro"/>"#)
        .vertical("v2", "Bye", r#"<html url_name="outro"/>"#)
        .html("intro", "Introduction", "<p>Welcome aboard</p>")
        .html("outro", "Outro", "<p>See you</p>");
    fixture
}

// =============================================================================
// Simple course
// =============================================================================

#[test]
fn test_simple_course_model() {
    let fixture = simple_course();
    let model = build(&fixture, &ConvertConfig::default());

    let courses = model.pool.all::<CourseEntity>();
    assert_eq!(courses.len(), 1);
    let course = courses[0];
    assert_eq!(course.startdate, 1609459200);
    assert_eq!(course.enddate, 1627430400);
    assert_eq!(course.fullname, "Simple Course");
    assert_eq!(course.shortname, "Simple Course");
    assert_eq!(course.format, "topics");

    let sections = model.pool.all::<SectionEntity>();
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0].number, 0);
    assert_eq!(sections[1].number, 1);
    assert_eq!(sections[0].title, "Getting started");
}

#[test]
fn test_simple_course_export() {
    let fixture = simple_course();
    let out = TempDir::new().unwrap();
    let backup = out.path().join("backup");

    let report = convert(fixture.root(), &backup, &ConvertConfig::default(), &SilentProgress::new()).unwrap();
    assert_eq!(report.course_name, "Simple Course");
    assert_eq!(report.export.sections, 2);
    assert_eq!(report.export.activities, 2);

    let (name, attrs) = root_element(&read(&backup, "course/course.xml"));
    assert_eq!(name, "course");
    assert!(attrs.contains(&("id".to_string(), "2".to_string())));
    assert!(attrs.contains(&("contextid".to_string(), "100".to_string())));

    let manifest = read(&backup, "moodle_backup.xml");
    assert_eq!(element_texts(&manifest, "original_course_startdate"), ["1609459200"]);
    assert_eq!(element_texts(&manifest, "directory").len(), 2 + 2 + 1);

    for section in ["sections/section_1", "sections/section_2"] {
        assert!(backup.join(section).join("section.xml").is_file());
        assert!(backup.join(section).join("inforef.xml").is_file());
    }
    for page in ["activities/page_1", "activities/page_2"] {
        for doc in ["module.xml", "page.xml", "grades.xml", "inforef.xml", "roles.xml", "calendar.xml"] {
            assert!(backup.join(page).join(doc).is_file(), "{}/{}", page, doc);
        }
    }

    let page = read(&backup, "activities/page_1/page.xml");
    assert_eq!(element_texts(&page, "content"), ["<p>Welcome aboard</p>"]);
    assert_eq!(element_texts(&page, "name"), ["Welcome"]);
}

#[test]
fn test_sections_list_their_modules() {
    let fixture = simple_course();
    let out = TempDir::new().unwrap();
    convert(fixture.root(), out.path(), &ConvertConfig::default(), &SilentProgress::new()).unwrap();

    let first = read(out.path(), "sections/section_1/section.xml");
    let second = read(out.path(), "sections/section_2/section.xml");
    assert_eq!(element_texts(&first, "sequence"), ["1"]);
    assert_eq!(element_texts(&second, "sequence"), ["2"]);
}

// =============================================================================
// Inputs
// =============================================================================

#[test]
fn test_archive_input() {
    let fixture = simple_course();
    let work = TempDir::new().unwrap();
    let archive = fixture.pack(work.path());

    let backup = work.path().join("backup");
    let report = convert(&archive, &backup, &ConvertConfig::default(), &SilentProgress::new()).unwrap();
    assert_eq!(report.export.sections, 2);
    assert!(backup.join("moodle_backup.xml").is_file());
}

#[test]
fn test_missing_child_document_aborts() {
    let mut fixture = CourseFixture::new("Broken");
    fixture.chapter("ch1", "Week 1", &["nowhere"]);

    let out = TempDir::new().unwrap();
    let err = convert(fixture.root(), out.path(), &ConvertConfig::default(), &SilentProgress::new()).unwrap_err();
    assert!(matches!(err, Error::MissingReference { .. }));
}

#[test]
fn test_inspect_builds_without_output() {
    let fixture = simple_course();
    let (name, model) = inspect(fixture.root(), &ConvertConfig::default(), &SilentProgress::new()).unwrap();
    assert_eq!(name, "Simple Course");
    assert_eq!(model.pool.all::<SectionEntity>().len(), 2);
}

// =============================================================================
// Progress
// =============================================================================

#[test]
fn test_progress_announces_phases() {
    let fixture = simple_course();
    let out = TempDir::new().unwrap();
    let events = Mutex::new(Vec::new());
    let progress = CallbackProgress::new(|event| events.lock().unwrap().push(event));

    convert(fixture.root(), out.path(), &ConvertConfig::default(), &progress).unwrap();

    let events = events.into_inner().unwrap();
    let messages: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::Message(m) => Some(m.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(messages, ["entering parse", "entering build", "entering export"]);
    assert!(matches!(events.last(), Some(ProgressEvent::Finished(_))));

    // manifest, course, 2 sections, 2 activities, questions, files
    let last_position = events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::Position { current, total } => Some((*current, *total)),
            _ => None,
        })
        .last()
        .unwrap();
    assert_eq!(last_position, (8, 8));
}
