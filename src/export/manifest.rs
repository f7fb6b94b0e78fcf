// src/export/manifest.rs

//! `moodle_backup.xml`: backup identity, contents listing and settings

use super::writer::XmlNode;
use crate::backup::context::{COURSE_CONTEXT_ID, COURSE_ID, SYSTEM_CONTEXT_ID};
use crate::backup::entities::{ActivityEntity, CourseEntity, SectionEntity};
use crate::config::TargetConfig;
use crate::hash;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use md5::{Digest, Md5};

/// `backup::MODE_CONVERTED`
const MODE_CONVERTED: u32 = 70;

/// Backup file name recorded in the manifest: `sha1(fullname).mbz`
pub fn backup_filename(course: &CourseEntity) -> String {
    format!("{}.mbz", hash::sha1(course.fullname.as_bytes()))
}

/// Backup id: SHA-1 of the base64 encoded backup timestamp
pub fn backup_id(now: i64) -> String {
    hash::sha1(STANDARD.encode(now.to_string()).as_bytes())
}

/// MD5 of the configured site identifier
pub fn site_identifier_hash(target: &TargetConfig) -> String {
    hex::encode(Md5::digest(target.site_identifier.as_bytes()))
}

pub fn manifest_document(
    course: &CourseEntity,
    sections: &[&SectionEntity],
    activities: &[&ActivityEntity],
    target: &TargetConfig,
    now: i64,
) -> XmlNode {
    let filename = backup_filename(course);

    let details = XmlNode::new("details").child(
        XmlNode::new("detail")
            .attr("backup_id", backup_id(now))
            .field("type", "course")
            .field("format", "moodle2")
            .field("interactive", 1)
            .field("mode", MODE_CONVERTED)
            .field("execution", 1)
            .field("executiontime", 0),
    );

    let contents = XmlNode::new("contents")
        .child(XmlNode::new("activities").children(activities.iter().map(|a| {
            XmlNode::new("activity")
                .field("moduleid", a.moduleid)
                .field("sectionid", a.sectionid)
                .field("modulename", a.modulename)
                .field("title", &a.title)
                .field("directory", a.directory())
        })))
        .child(XmlNode::new("sections").children(sections.iter().map(|s| {
            XmlNode::new("section")
                .field("sectionid", s.id)
                .field("title", &s.title)
                .field("directory", section_directory(s.id))
        })))
        .child(
            XmlNode::new("course")
                .field("courseid", COURSE_ID)
                .field("title", &course.fullname)
                .field("directory", "course"),
        );

    let information = XmlNode::new("information")
        .field("name", &filename)
        .field("moodle_version", target.moodle_version)
        .field("moodle_release", &target.moodle_release)
        .field("backup_version", target.backup_version)
        .field("backup_release", &target.backup_release)
        .field("backup_date", now)
        .field("mnet_remoteusers", 0)
        .field("include_files", 1)
        .field("include_file_references_to_external_content", 0)
        .field("original_wwwroot", &target.wwwroot)
        .field("original_site_identifier_hash", site_identifier_hash(target))
        .field("original_course_id", COURSE_ID)
        .field("original_course_format", &course.format)
        .field("original_course_fullname", &course.fullname)
        .field("original_course_shortname", &course.shortname)
        .field("original_course_startdate", course.startdate)
        .field("original_course_enddate", course.enddate)
        .field("original_course_contextid", COURSE_CONTEXT_ID)
        .field("original_system_contextid", SYSTEM_CONTEXT_ID)
        .child(details)
        .child(contents)
        .child(settings(&filename, sections, activities));

    XmlNode::new("moodle_backup").child(information)
}

pub fn section_directory(id: u32) -> String {
    format!("sections/section_{}", id)
}

fn settings(filename: &str, sections: &[&SectionEntity], activities: &[&ActivityEntity]) -> XmlNode {
    let root = [
        ("filename", filename.to_string()),
        ("users", "0".to_string()),
        ("role_assignments", "0".to_string()),
        ("activities", "1".to_string()),
        ("blocks", "0".to_string()),
        ("groups", "0".to_string()),
        ("competencies", "0".to_string()),
        ("files", "1".to_string()),
        ("questionbank", "1".to_string()),
    ];

    let mut node = XmlNode::new("settings").children(root.into_iter().map(|(name, value)| {
        XmlNode::new("setting")
            .field("level", "root")
            .field("name", name)
            .field("value", value)
    }));

    for activity in activities {
        let tag = format!("{}_{}", activity.modulename, activity.moduleid);
        node = node
            .child(scoped_setting("activity", &tag, "included", 1))
            .child(scoped_setting("activity", &tag, "userinfo", 0));
    }
    for section in sections {
        let tag = format!("section_{}", section.id);
        node = node
            .child(scoped_setting("section", &tag, "included", 1))
            .child(scoped_setting("section", &tag, "userinfo", 0));
    }
    node
}

fn scoped_setting(level: &str, tag: &str, suffix: &str, value: u8) -> XmlNode {
    XmlNode::new("setting")
        .field("level", level)
        .field(level, tag)
        .field("name", format!("{}_{}", tag, suffix))
        .field("value", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::entities::{CourseCategory, ModuleKind};

    fn course() -> CourseEntity {
        CourseEntity {
            id: 2,
            contextid: 100,
            shortname: "Simple Course".to_string(),
            fullname: "Simple Course".to_string(),
            format: "topics".to_string(),
            startdate: 1609459200,
            enddate: 1627430400,
            timecreated: 0,
            timemodified: 0,
            category: CourseCategory {
                id: 1,
                name: "Miscellaneous".to_string(),
                description: String::new(),
            },
        }
    }

    #[test]
    fn test_filename_is_sha1_of_fullname() {
        assert_eq!(
            backup_filename(&course()),
            format!("{}.mbz", hash::sha1(b"Simple Course"))
        );
    }

    #[test]
    fn test_site_identifier_hash_is_md5() {
        let target = TargetConfig {
            site_identifier: "abc".to_string(),
            ..TargetConfig::default()
        };
        assert_eq!(site_identifier_hash(&target), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn test_manifest_lists_contents_and_settings() {
        let section = SectionEntity {
            id: 1,
            number: 0,
            title: "Week 1".to_string(),
            summary: String::new(),
            sequence: vec![1],
            timemodified: 0,
        };
        let activity = ActivityEntity {
            id: 1,
            moduleid: 1,
            modulename: ModuleKind::Page,
            sectionid: 1,
            sectionnumber: 0,
            title: "Intro".to_string(),
            added: 0,
            instance: 1,
        };

        let doc = manifest_document(&course(), &[&section], &[&activity], &TargetConfig::default(), 1000);
        let info = doc.find("information").unwrap();
        assert_eq!(info.find("original_course_id").unwrap().text.as_deref(), Some("2"));
        assert_eq!(info.find("original_course_contextid").unwrap().text.as_deref(), Some("100"));

        let contents = info.find("contents").unwrap();
        let listed = contents.find("activities").unwrap().find("activity").unwrap();
        assert_eq!(listed.find("directory").unwrap().text.as_deref(), Some("activities/page_1"));

        let names: Vec<_> = info
            .find("settings")
            .unwrap()
            .children
            .iter()
            .filter_map(|s| s.find("name").and_then(|n| n.text.clone()))
            .collect();
        assert!(names.contains(&"page_1_included".to_string()));
        assert!(names.contains(&"section_1_userinfo".to_string()));
        assert_eq!(names.len(), 9 + 2 + 2);
    }
}
