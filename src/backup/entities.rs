// src/backup/entities.rs

//! Typed payloads of the backup model
//!
//! One record per entity type. Cross-entity links are plain ids, never
//! references, so every entity can be looked up and serialized on its own.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Moodle's null marker in backup documents
pub const NULL_MARKER: &str = "$@NULL@$";

/// Site administrator, owner of every generated file and question
pub const ADMIN_USER_ID: u32 = 2;

/// `FORMAT_MOODLE`
pub const FORMAT_MOODLE: u8 = 0;
/// `FORMAT_HTML`
pub const FORMAT_HTML: u8 = 1;

/// Entity type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityType {
    Course,
    Section,
    Activity,
    Book,
    Chapter,
    Page,
    Quiz,
    Forum,
    Question,
    Answer,
    QuestionMultichoice,
    QuestionCategory,
    QuestionInstance,
    GradeCategory,
    GradeItem,
    File,
}

impl EntityType {
    pub const ALL: [EntityType; 16] = [
        Self::Course,
        Self::Section,
        Self::Activity,
        Self::Book,
        Self::Chapter,
        Self::Page,
        Self::Quiz,
        Self::Forum,
        Self::Question,
        Self::Answer,
        Self::QuestionMultichoice,
        Self::QuestionCategory,
        Self::QuestionInstance,
        Self::GradeCategory,
        Self::GradeItem,
        Self::File,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Course => "course",
            Self::Section => "section",
            Self::Activity => "activity",
            Self::Book => "book",
            Self::Chapter => "chapter",
            Self::Page => "page",
            Self::Quiz => "quiz",
            Self::Forum => "forum",
            Self::Question => "question",
            Self::Answer => "answer",
            Self::QuestionMultichoice => "question_multichoice",
            Self::QuestionCategory => "question_category",
            Self::QuestionInstance => "question_instance",
            Self::GradeCategory => "grade_category",
            Self::GradeItem => "grade_item",
            Self::File => "file",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Activity module kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    Book,
    Page,
    Quiz,
    Forum,
}

impl ModuleKind {
    /// Export order of activity directories
    pub const ALL: [ModuleKind; 4] = [Self::Book, Self::Page, Self::Quiz, Self::Forum];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Book => "book",
            Self::Page => "page",
            Self::Quiz => "quiz",
            Self::Forum => "forum",
        }
    }

    /// Frankenstyle component name, also the reference owner type
    pub const fn component(&self) -> &'static str {
        match self {
            Self::Book => "mod_book",
            Self::Page => "mod_page",
            Self::Quiz => "mod_quiz",
            Self::Forum => "mod_forum",
        }
    }

    /// Plugin version recorded in `module.xml`, matching Moodle 3.9
    pub const fn version(&self) -> u64 {
        match self {
            Self::Book => 2020061500,
            Self::Page => 2020061500,
            Self::Quiz => 2020061501,
            Self::Forum => 2020061500,
        }
    }

    /// Pool type of the module's own record
    pub const fn entity_type(&self) -> EntityType {
        match self {
            Self::Book => EntityType::Book,
            Self::Page => EntityType::Page,
            Self::Quiz => EntityType::Quiz,
            Self::Forum => EntityType::Forum,
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "book" => Ok(Self::Book),
            "page" => Ok(Self::Page),
            "quiz" => Ok(Self::Quiz),
            "forum" => Ok(Self::Forum),
            other => Err(format!("unknown module kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseCategory {
    pub id: u32,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseEntity {
    /// Fixed placeholder course id
    pub id: u32,
    pub contextid: u32,
    pub shortname: String,
    pub fullname: String,
    pub format: String,
    pub startdate: i64,
    pub enddate: i64,
    pub timecreated: i64,
    pub timemodified: i64,
    pub category: CourseCategory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionEntity {
    pub id: u32,
    pub number: u32,
    pub title: String,
    pub summary: String,
    /// Module ids placed in this section, in order
    pub sequence: Vec<u32>,
    pub timemodified: i64,
}

/// Course module wrapper shared by every activity kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntity {
    pub id: u32,
    /// Global module id, shared counter across all kinds
    pub moduleid: u32,
    pub modulename: ModuleKind,
    pub sectionid: u32,
    pub sectionnumber: u32,
    pub title: String,
    pub added: i64,
    /// Id of the kind-specific record (book, page, quiz or forum)
    pub instance: u32,
}

impl ActivityEntity {
    pub fn contextid(&self) -> u32 {
        super::context::module_context(self.moduleid)
    }

    /// Backup directory, relative to the backup root
    pub fn directory(&self) -> String {
        format!("activities/{}_{}", self.modulename, self.moduleid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookEntity {
    pub id: u32,
    pub moduleid: u32,
    pub contextid: u32,
    pub name: String,
    pub intro: String,
    /// Chapter entity ids in reading order
    pub chapters: Vec<u32>,
    pub timecreated: i64,
    pub timemodified: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterEntity {
    pub id: u32,
    pub pagenum: u32,
    pub subchapter: u32,
    pub title: String,
    pub content: String,
    pub timemodified: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEntity {
    pub id: u32,
    pub moduleid: u32,
    pub contextid: u32,
    pub name: String,
    pub intro: String,
    pub content: String,
    pub timemodified: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizEntity {
    pub id: u32,
    pub moduleid: u32,
    pub contextid: u32,
    pub name: String,
    pub intro: String,
    /// Question instance ids by slot
    pub question_instances: Vec<u32>,
    pub timecreated: i64,
    pub timemodified: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForumEntity {
    pub id: u32,
    pub moduleid: u32,
    pub contextid: u32,
    pub forum_type: String,
    pub name: String,
    pub intro: String,
    pub timecreated: i64,
    pub timemodified: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionType {
    /// Non-gradable text shown between questions
    Description,
    Multichoice,
}

impl QuestionType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::Multichoice => "multichoice",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionEntity {
    pub id: u32,
    pub parent: u32,
    pub name: String,
    pub questiontext: String,
    pub qtype: QuestionType,
    pub defaultmark: f64,
    pub penalty: f64,
    pub maxmark: f64,
    pub stamp: String,
    pub version: String,
    pub createdby: u32,
    pub modifiedby: u32,
    /// Answer ids, multichoice only
    pub answers: Vec<u32>,
    /// `question_multichoice` options id, multichoice only
    pub multichoice: Option<u32>,
    pub timecreated: i64,
    pub timemodified: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerEntity {
    pub id: u32,
    pub answertext: String,
    pub fraction: f64,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultichoiceEntity {
    pub id: u32,
    pub layout: u8,
    pub single: u8,
    pub shuffleanswers: u8,
    pub correctfeedback: String,
    pub partiallycorrectfeedback: String,
    pub incorrectfeedback: String,
    pub answernumbering: String,
    pub shownumcorrect: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionCategoryEntity {
    pub id: u32,
    pub name: String,
    pub info: String,
    pub infoformat: u8,
    pub contextid: u32,
    pub contextlevel: u32,
    pub contextinstanceid: u32,
    pub stamp: String,
    /// Parent category id, 0 for a top category
    pub parent: u32,
    pub sortorder: u32,
    pub questions: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionInstanceEntity {
    pub id: u32,
    pub slot: u32,
    pub page: u32,
    pub questionid: u32,
    pub questioncategoryid: u32,
    pub maxmark: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeCategoryEntity {
    pub id: u32,
    /// `None` for the course's top category
    pub parent: Option<u32>,
    pub fullname: String,
    pub aggregation: u32,
    pub path: String,
    pub depth: u32,
    pub timecreated: i64,
    pub timemodified: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradeItemEntity {
    pub id: u32,
    pub categoryid: u32,
    pub itemname: String,
    /// `course` or `mod`
    pub itemtype: String,
    pub itemmodule: Option<ModuleKind>,
    pub iteminstance: u32,
    pub grademax: f64,
    pub grademin: f64,
    pub sortorder: u32,
    pub timecreated: i64,
    pub timemodified: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntity {
    pub id: u32,
    pub contenthash: String,
    pub contextid: u32,
    pub component: String,
    pub filearea: String,
    pub itemid: u32,
    pub filepath: String,
    pub filename: String,
    pub userid: u32,
    pub filesize: u64,
    pub mimetype: String,
    pub status: u32,
    pub source: String,
    pub sortorder: u32,
    pub timecreated: i64,
    pub timemodified: i64,
    /// Where the bytes are read from when the store is filled
    pub source_path: PathBuf,
}

/// Any pool payload
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Course(CourseEntity),
    Section(SectionEntity),
    Activity(ActivityEntity),
    Book(BookEntity),
    Chapter(ChapterEntity),
    Page(PageEntity),
    Quiz(QuizEntity),
    Forum(ForumEntity),
    Question(QuestionEntity),
    Answer(AnswerEntity),
    QuestionMultichoice(MultichoiceEntity),
    QuestionCategory(QuestionCategoryEntity),
    QuestionInstance(QuestionInstanceEntity),
    GradeCategory(GradeCategoryEntity),
    GradeItem(GradeItemEntity),
    File(FileEntity),
}

/// Conversion between a typed record and the pool's `Entity`
pub trait PoolEntity: Sized {
    const TYPE: EntityType;

    fn into_entity(self) -> Entity;

    fn from_entity(entity: &Entity) -> Option<&Self>;
}

macro_rules! pool_entity {
    ($($variant:ident => $record:ty),* $(,)?) => {
        impl Entity {
            pub fn entity_type(&self) -> EntityType {
                match self {
                    $(Self::$variant(_) => EntityType::$variant,)*
                }
            }
        }

        $(
            impl PoolEntity for $record {
                const TYPE: EntityType = EntityType::$variant;

                fn into_entity(self) -> Entity {
                    Entity::$variant(self)
                }

                fn from_entity(entity: &Entity) -> Option<&Self> {
                    match entity {
                        Entity::$variant(record) => Some(record),
                        _ => None,
                    }
                }
            }
        )*
    };
}

pool_entity! {
    Course => CourseEntity,
    Section => SectionEntity,
    Activity => ActivityEntity,
    Book => BookEntity,
    Chapter => ChapterEntity,
    Page => PageEntity,
    Quiz => QuizEntity,
    Forum => ForumEntity,
    Question => QuestionEntity,
    Answer => AnswerEntity,
    QuestionMultichoice => MultichoiceEntity,
    QuestionCategory => QuestionCategoryEntity,
    QuestionInstance => QuestionInstanceEntity,
    GradeCategory => GradeCategoryEntity,
    GradeItem => GradeItemEntity,
    File => FileEntity,
}
