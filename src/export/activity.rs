// src/export/activity.rs

//! Activity directory documents
//!
//! Every activity gets `module.xml` plus one document named after its kind,
//! wrapped in an `<activity>` element that ties the instance to its module
//! and context.

use super::course::grade_item;
use super::writer::XmlNode;
use crate::backup::entities::*;
use crate::backup::{EntityPool, ModuleKind};
use crate::error::{Error, Result};

/// Serialized `displayoptions` of a page: print heading and last modified
const PAGE_DISPLAY_OPTIONS: &str = r#"a:3:{s:12:"printheading";s:1:"1";s:10:"printintro";s:1:"0";s:17:"printlastmodified";s:1:"1";}"#;

/// `RESOURCELIB_DISPLAY_OPEN`
const PAGE_DISPLAY_OPEN: u32 = 5;

/// Quiz review option bitmasks for attempt and the other review fields
const REVIEW_ATTEMPT: u32 = 69888;
const REVIEW_OTHER: u32 = 4352;

pub fn module_document(activity: &ActivityEntity) -> XmlNode {
    XmlNode::new("module")
        .attr("id", activity.moduleid)
        .attr("version", activity.modulename.version())
        .field("modulename", activity.modulename)
        .field("sectionid", activity.sectionid)
        .field("sectionnumber", activity.sectionnumber)
        .field("idnumber", NULL_MARKER)
        .field("added", activity.added)
        .field("score", 0)
        .field("indent", 0)
        .field("visible", 1)
        .field("visibleoncoursepage", 1)
        .field("visibleold", 1)
        .field("groupmode", 1)
        .field("groupingid", 0)
        .field("completion", 2)
        .field("completiongradeitemnumber", NULL_MARKER)
        .field("completionview", 1)
        .field("completionexpected", 0)
        .field("availability", NULL_MARKER)
        .field("showdescription", 0)
        .child(XmlNode::new("tags"))
}

/// Kind-specific document, `<kind>.xml`
pub fn instance_document(pool: &EntityPool, activity: &ActivityEntity) -> Result<XmlNode> {
    let body = match activity.modulename {
        ModuleKind::Book => book_document(pool, lookup::<BookEntity>(pool, activity)?)?,
        ModuleKind::Page => page_document(lookup::<PageEntity>(pool, activity)?),
        ModuleKind::Quiz => quiz_document(pool, lookup::<QuizEntity>(pool, activity)?)?,
        ModuleKind::Forum => forum_document(lookup::<ForumEntity>(pool, activity)?),
    };

    Ok(XmlNode::new("activity")
        .attr("id", activity.instance)
        .attr("moduleid", activity.moduleid)
        .attr("modulename", activity.modulename)
        .attr("contextid", activity.contextid())
        .child(body))
}

fn lookup<'p, T: PoolEntity>(pool: &'p EntityPool, activity: &ActivityEntity) -> Result<&'p T> {
    pool.get::<T>(activity.instance).ok_or_else(|| Error::UnallocatedEntity {
        entity_type: T::TYPE.to_string(),
        id: activity.instance,
    })
}

fn get<T: PoolEntity>(pool: &EntityPool, id: u32) -> Result<&T> {
    pool.get::<T>(id).ok_or_else(|| Error::UnallocatedEntity {
        entity_type: T::TYPE.to_string(),
        id,
    })
}

fn book_document(pool: &EntityPool, book: &BookEntity) -> Result<XmlNode> {
    let mut chapters = XmlNode::new("chapters");
    for id in &book.chapters {
        let chapter = get::<ChapterEntity>(pool, *id)?;
        chapters = chapters.child(
            XmlNode::new("chapter")
                .attr("id", chapter.id)
                .field("pagenum", chapter.pagenum)
                .field("subchapter", chapter.subchapter)
                .field("title", &chapter.title)
                .field("content", &chapter.content)
                .field("contentformat", FORMAT_HTML)
                .field("hidden", 0)
                .field("timemodified", chapter.timemodified)
                .field("importsrc", ""),
        );
    }

    Ok(XmlNode::new("book")
        .attr("id", book.id)
        .field("name", &book.name)
        .field("intro", &book.intro)
        .field("introformat", FORMAT_HTML)
        .field("numbering", 1)
        .field("navstyle", 1)
        .field("customtitles", 0)
        .field("timecreated", book.timecreated)
        .field("timemodified", book.timemodified)
        .child(chapters))
}

fn page_document(page: &PageEntity) -> XmlNode {
    XmlNode::new("page")
        .attr("id", page.id)
        .field("name", &page.name)
        .field("intro", &page.intro)
        .field("introformat", FORMAT_HTML)
        .field("content", &page.content)
        .field("contentformat", FORMAT_HTML)
        .field("legacyfiles", 0)
        .field("legacyfileslast", NULL_MARKER)
        .field("display", PAGE_DISPLAY_OPEN)
        .field("displayoptions", PAGE_DISPLAY_OPTIONS)
        .field("revision", 1)
        .field("timemodified", page.timemodified)
}

fn quiz_document(pool: &EntityPool, quiz: &QuizEntity) -> Result<XmlNode> {
    let mut instances = XmlNode::new("question_instances");
    let mut sumgrades = 0.0;
    for id in &quiz.question_instances {
        let instance = get::<QuestionInstanceEntity>(pool, *id)?;
        sumgrades += instance.maxmark;

        instances = instances.child(
            XmlNode::new("question_instance")
                .attr("id", instance.id)
                .field("slot", instance.slot)
                .field("page", instance.page)
                .field("requireprevious", 0)
                .field("questionid", instance.questionid)
                .field("maxmark", format!("{:.7}", instance.maxmark)),
        );
    }

    let review = [
        "reviewcorrectness",
        "reviewmarks",
        "reviewspecificfeedback",
        "reviewgeneralfeedback",
        "reviewrightanswer",
        "reviewoverallfeedback",
    ];

    let mut node = XmlNode::new("quiz")
        .attr("id", quiz.id)
        .field("name", &quiz.name)
        .field("intro", &quiz.intro)
        .field("introformat", FORMAT_HTML)
        .field("timeopen", 0)
        .field("timeclose", 0)
        .field("timelimit", 0)
        .field("overduehandling", "autosubmit")
        .field("graceperiod", 0)
        .field("preferredbehaviour", "deferredfeedback")
        .field("canredoquestions", 0)
        .field("attempts_number", 0)
        .field("attemptonlast", 0)
        .field("grademethod", 1)
        .field("decimalpoints", 2)
        .field("questiondecimalpoints", -1)
        .field("reviewattempt", REVIEW_ATTEMPT);
    for name in review {
        node = node.field(name, REVIEW_OTHER);
    }

    Ok(node
        .field("questionsperpage", 1)
        .field("navmethod", "free")
        .field("shuffleanswers", 1)
        .field("sumgrades", format!("{:.5}", sumgrades))
        .field("grade", "10.00000")
        .field("timecreated", quiz.timecreated)
        .field("timemodified", quiz.timemodified)
        .field("password", "")
        .field("subnet", "")
        .field("browsersecurity", "")
        .field("delay1", 0)
        .field("delay2", 0)
        .field("showuserpicture", 0)
        .field("showblocks", 0)
        .field("completionattemptsexhausted", 0)
        .field("completionpass", 0)
        .field("allowofflineattempts", 0)
        .child(instances)
        .child(
            XmlNode::new("sections").child(
                XmlNode::new("section")
                    .attr("id", quiz.id)
                    .field("firstslot", 1)
                    .field("heading", "")
                    .field("shufflequestions", 0),
            ),
        )
        .child(XmlNode::new("feedbacks"))
        .child(XmlNode::new("overrides"))
        .child(XmlNode::new("grades"))
        .child(XmlNode::new("attempts")))
}

fn forum_document(forum: &ForumEntity) -> XmlNode {
    let mut node = XmlNode::new("forum")
        .attr("id", forum.id)
        .field("type", &forum.forum_type)
        .field("name", &forum.name)
        .field("intro", &forum.intro)
        .field("introformat", FORMAT_HTML);

    let zeroed = [
        "duedate",
        "cutoffdate",
        "assessed",
        "assesstimestart",
        "assesstimefinish",
        "scale",
        "maxbytes",
    ];
    for name in zeroed {
        node = node.field(name, 0);
    }

    node.field("maxattachments", 1)
        .field("forcesubscribe", 0)
        .field("trackingtype", 1)
        .field("rsstype", 0)
        .field("rssarticles", 0)
        .field("timemodified", forum.timemodified)
        .field("warnafter", 0)
        .field("blockafter", 0)
        .field("blockperiod", 0)
        .field("completiondiscussions", 0)
        .field("completionreplies", 0)
        .field("completionposts", 0)
        .field("displaywordcount", 0)
        .field("lockdiscussionafter", 0)
        .field("grade_forum", 0)
        .children(
            [
                "discussions",
                "subscriptions",
                "digests",
                "readposts",
                "trackedprefs",
                "poststags",
                "grades",
            ]
            .into_iter()
            .map(XmlNode::new),
        )
}

/// `grades.xml` of an activity: the grade items it owns
pub fn grades_document(items: &[&GradeItemEntity]) -> XmlNode {
    XmlNode::new("activity_gradebook")
        .child(XmlNode::new("grade_items").children(items.iter().map(|i| grade_item(i))))
        .child(XmlNode::new("grade_letters"))
}
