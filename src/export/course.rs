// src/export/course.rs

//! Course level documents: course, sections, gradebook and completion

use super::writer::XmlNode;
use crate::backup::entities::{
    CourseEntity, FORMAT_HTML, GradeCategoryEntity, GradeItemEntity, NULL_MARKER, SectionEntity,
};

/// `COMPLETION_CRITERIA_TYPE_*` aggregated at course level; `None` is the
/// overall method
const COMPLETION_CRITERIA: [Option<u32>; 4] = [None, Some(4), Some(8), Some(7)];

/// `COMPLETION_AGGREGATION_ALL`
const COMPLETION_AGGREGATION_ALL: u32 = 1;

pub fn course_document(course: &CourseEntity) -> XmlNode {
    let category = XmlNode::new("category")
        .attr("id", course.category.id)
        .field("name", &course.category.name)
        .field("description", or_null(&course.category.description));

    XmlNode::new("course")
        .attr("id", course.id)
        .attr("contextid", course.contextid)
        .field("shortname", &course.shortname)
        .field("fullname", &course.fullname)
        .field("idnumber", "")
        .field("summary", "")
        .field("summaryformat", FORMAT_HTML)
        .field("format", &course.format)
        .field("showgrades", 1)
        .field("newsitems", 5)
        .field("startdate", course.startdate)
        .field("enddate", course.enddate)
        .field("marker", 0)
        .field("maxbytes", 0)
        .field("legacyfiles", 0)
        .field("showreports", 0)
        .field("visible", 1)
        .field("groupmode", 0)
        .field("groupmodeforce", 0)
        .field("defaultgroupingid", 0)
        .field("lang", "")
        .field("theme", "")
        .field("timecreated", course.timecreated)
        .field("timemodified", course.timemodified)
        .field("requested", 0)
        .field("enablecompletion", 1)
        .field("completionnotify", 0)
        .field("hiddensections", 0)
        .field("coursedisplay", 0)
        .child(category)
        .child(XmlNode::new("tags"))
        .child(XmlNode::new("customfields"))
}

pub fn section_document(section: &SectionEntity) -> XmlNode {
    let sequence = section
        .sequence
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",");

    XmlNode::new("section")
        .attr("id", section.id)
        .field("number", section.number)
        .field("name", &section.title)
        .field("summary", &section.summary)
        .field("summaryformat", FORMAT_HTML)
        .field("sequence", sequence)
        .field("visible", 1)
        .field("availabilityjson", NULL_MARKER)
        .field("timemodified", section.timemodified)
}

pub fn gradebook_document(categories: &[&GradeCategoryEntity], items: &[&GradeItemEntity]) -> XmlNode {
    XmlNode::new("gradebook")
        .child(XmlNode::new("attributes"))
        .child(XmlNode::new("grade_categories").children(categories.iter().map(|c| grade_category(c))))
        .child(XmlNode::new("grade_items").children(items.iter().map(|i| grade_item(i))))
        .child(XmlNode::new("grade_letters"))
        .child(XmlNode::new("grade_settings"))
}

fn grade_category(category: &GradeCategoryEntity) -> XmlNode {
    XmlNode::new("grade_category")
        .attr("id", category.id)
        .field("parent", category.parent.map_or_else(|| NULL_MARKER.to_string(), |p| p.to_string()))
        .field("depth", category.depth)
        .field("path", &category.path)
        .field("fullname", &category.fullname)
        .field("aggregation", category.aggregation)
        .field("keephigh", 0)
        .field("droplow", 0)
        .field("aggregateonlygraded", 1)
        .field("aggregateoutcomes", 0)
        .field("timecreated", category.timecreated)
        .field("timemodified", category.timemodified)
        .field("hidden", 0)
}

/// One `grade_item`, shared by the course gradebook and activity grades
pub fn grade_item(item: &GradeItemEntity) -> XmlNode {
    // The course item hangs off its category through iteminstance
    let categoryid = if item.itemtype == "course" {
        NULL_MARKER.to_string()
    } else {
        item.categoryid.to_string()
    };
    let itemname = if item.itemname.is_empty() {
        NULL_MARKER
    } else {
        item.itemname.as_str()
    };

    XmlNode::new("grade_item")
        .attr("id", item.id)
        .field("categoryid", categoryid)
        .field("itemname", itemname)
        .field("itemtype", &item.itemtype)
        .field("itemmodule", item.itemmodule.map_or(NULL_MARKER, |m| m.as_str()))
        .field("iteminstance", item.iteminstance)
        .field("itemnumber", if item.itemmodule.is_some() { "0" } else { NULL_MARKER })
        .field("iteminfo", NULL_MARKER)
        .field("idnumber", "")
        .field("calculation", NULL_MARKER)
        .field("gradetype", 1)
        .field("grademax", format!("{:.5}", item.grademax))
        .field("grademin", format!("{:.5}", item.grademin))
        .field("scaleid", NULL_MARKER)
        .field("outcomeid", NULL_MARKER)
        .field("gradepass", "0.00000")
        .field("multfactor", "1.00000")
        .field("plusfactor", "0.00000")
        .field("aggregationcoef", "0.00000")
        .field("aggregationcoef2", "0.00000")
        .field("weightoverride", 0)
        .field("sortorder", item.sortorder)
        .field("display", 0)
        .field("decimals", NULL_MARKER)
        .field("hidden", 0)
        .field("locked", 0)
        .field("locktime", 0)
        .field("needsupdate", 0)
        .field("timecreated", item.timecreated)
        .field("timemodified", item.timemodified)
        .child(XmlNode::new("grade_grades"))
}

pub fn completion_document(course: &CourseEntity) -> XmlNode {
    XmlNode::new("course_completion").children(COMPLETION_CRITERIA.iter().enumerate().map(|(index, criteria)| {
        XmlNode::new("course_completion_aggr_methd")
            .attr("id", index + 1)
            .field("course", course.id)
            .field("criteriatype", criteria.map_or_else(|| NULL_MARKER.to_string(), |c| c.to_string()))
            .field("method", COMPLETION_AGGREGATION_ALL)
            .field("value", NULL_MARKER)
    }))
}

pub fn enrolments_document() -> XmlNode {
    XmlNode::new("enrolments").child(XmlNode::new("enrols"))
}

/// `roles.xml` of the course and of every activity
pub fn roles_document() -> XmlNode {
    XmlNode::new("roles")
        .child(XmlNode::new("role_overrides"))
        .child(XmlNode::new("role_assignments"))
}

fn or_null(value: &str) -> &str {
    if value.is_empty() { NULL_MARKER } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::entities::{CourseCategory, ModuleKind};

    #[test]
    fn test_course_root_attributes() {
        let course = CourseEntity {
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
        };
        let doc = course_document(&course);
        assert_eq!(doc.get_attr("id"), Some("2"));
        assert_eq!(doc.get_attr("contextid"), Some("100"));
        assert_eq!(doc.find("startdate").unwrap().text.as_deref(), Some("1609459200"));
        let category = doc.find("category").unwrap();
        assert_eq!(category.find("description").unwrap().text.as_deref(), Some(NULL_MARKER));
    }

    #[test]
    fn test_section_sequence_is_comma_joined() {
        let section = SectionEntity {
            id: 3,
            number: 1,
            title: "Week 2".to_string(),
            summary: String::new(),
            sequence: vec![4, 5, 6],
            timemodified: 0,
        };
        let doc = section_document(&section);
        assert_eq!(doc.find("sequence").unwrap().text.as_deref(), Some("4,5,6"));
        assert_eq!(doc.find("number").unwrap().text.as_deref(), Some("1"));
    }

    #[test]
    fn test_module_grade_item_fields() {
        let item = GradeItemEntity {
            id: 2,
            categoryid: 1,
            itemname: "Check".to_string(),
            itemtype: "mod".to_string(),
            itemmodule: Some(ModuleKind::Quiz),
            iteminstance: 1,
            grademax: 100.0,
            grademin: 0.0,
            sortorder: 2,
            timecreated: 0,
            timemodified: 0,
        };
        let doc = grade_item(&item);
        assert_eq!(doc.find("categoryid").unwrap().text.as_deref(), Some("1"));
        assert_eq!(doc.find("itemmodule").unwrap().text.as_deref(), Some("quiz"));
        assert_eq!(doc.find("grademax").unwrap().text.as_deref(), Some("100.00000"));
    }

    #[test]
    fn test_completion_methods() {
        let course = CourseEntity {
            id: 2,
            contextid: 100,
            shortname: String::new(),
            fullname: String::new(),
            format: "topics".to_string(),
            startdate: 0,
            enddate: 0,
            timecreated: 0,
            timemodified: 0,
            category: CourseCategory {
                id: 1,
                name: String::new(),
                description: String::new(),
            },
        };
        let doc = completion_document(&course);
        let types: Vec<_> = doc
            .children
            .iter()
            .map(|c| c.find("criteriatype").unwrap().text.clone().unwrap())
            .collect();
        assert_eq!(types, [NULL_MARKER, "4", "8", "7"]);
    }
}
