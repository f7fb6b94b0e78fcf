// src/backup/builder/mod.rs

//! Reshape a source tree into the backup model
//!
//! The builder walks the course in document order (chapter, sequential,
//! vertical, item) and allocates every entity in that order, so ids are
//! reproducible for a given input. Grouping of leaf content into books,
//! pages and quizzes lives in `section`.

mod module;
mod quiz;
mod section;

use super::context::{COURSE_CONTEXT_ID, COURSE_ID, StampGenerator};
use super::entities::*;
use super::files::FileCollector;
use super::pool::EntityPool;
use super::refs::RefManager;
use crate::config::ConvertConfig;
use crate::error::Result;
use crate::olx::{NodeKind, SourceTree};
use crate::progress::ProgressTracker;
use std::path::Path;
use tracing::{debug, info};

/// `GRADE_AGGREGATE_SUM`
const GRADE_AGGREGATE_SUM: u32 = 13;

/// Entity pool and reference edges of one conversion run
#[derive(Debug, Default)]
pub struct BackupModel {
    pub pool: EntityPool,
    pub refs: RefManager,
}

impl BackupModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// The single course record
    pub fn course(&self) -> Option<&CourseEntity> {
        self.pool.all::<CourseEntity>().into_iter().next()
    }
}

/// Section being filled while its chapter is walked
#[derive(Debug, Clone, Copy)]
pub(crate) struct SectionSlot {
    pub(crate) id: u32,
    pub(crate) number: u32,
}

pub struct Builder<'a> {
    tree: &'a SourceTree,
    config: &'a ConvertConfig,
    files: FileCollector<'a>,
    stamps: StampGenerator,
    model: BackupModel,
    /// Next global module id, shared by every module kind
    next_moduleid: u32,
    /// Course grade category, created before any section
    grade_category: u32,
    now: i64,
}

impl<'a> Builder<'a> {
    pub fn new(tree: &'a SourceTree, course_root: &Path, config: &'a ConvertConfig) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            tree,
            config,
            files: FileCollector::new(course_root, &tree.course().assets, now),
            stamps: StampGenerator::new(&config.target.wwwroot),
            model: BackupModel::new(),
            next_moduleid: 1,
            grade_category: 0,
            now,
        }
    }

    /// Build the whole course, ticking `progress` once per chapter
    pub fn build(mut self, progress: &dyn ProgressTracker) -> Result<BackupModel> {
        let root = self.tree.root();
        let course = self.tree.course();

        let pool_id = self.model.pool.new_entity(EntityType::Course);
        self.model.pool.set(
            pool_id,
            CourseEntity {
                id: COURSE_ID,
                contextid: COURSE_CONTEXT_ID,
                shortname: course.display_name.clone(),
                fullname: course.display_name.clone(),
                format: self.config.course.format.clone(),
                startdate: course.start,
                enddate: course.end,
                timecreated: self.now,
                timemodified: self.now,
                category: CourseCategory {
                    id: self.config.course.category_id,
                    name: self.config.course.category_name.clone(),
                    description: self.config.course.category_description.clone(),
                },
            },
        )?;

        self.build_gradebook()?;

        let chapters: Vec<_> = self
            .tree
            .children(root.id)
            .filter(|n| n.kind() == NodeKind::Chapter)
            .map(|n| n.id)
            .collect();
        for (index, chapter) in chapters.into_iter().enumerate() {
            self.build_section(chapter, index as u32)?;
            progress.increment(1);
        }

        info!(
            "Built {} sections and {} modules",
            self.model.pool.count(EntityType::Section),
            self.model.pool.count(EntityType::Activity)
        );
        Ok(self.model)
    }

    /// Course grade category (SUM aggregation) and its course grade item
    fn build_gradebook(&mut self) -> Result<()> {
        let category_id = self.model.pool.new_entity(EntityType::GradeCategory);
        self.model.pool.set(
            category_id,
            GradeCategoryEntity {
                id: category_id,
                parent: None,
                fullname: "Default category".to_string(),
                aggregation: GRADE_AGGREGATE_SUM,
                path: format!("/{}/", category_id),
                depth: 1,
                timecreated: self.now,
                timemodified: self.now,
            },
        )?;
        self.grade_category = category_id;

        let item_id = self.model.pool.new_entity(EntityType::GradeItem);
        self.model.pool.set(
            item_id,
            GradeItemEntity {
                id: item_id,
                categoryid: category_id,
                itemname: String::new(),
                itemtype: "course".to_string(),
                itemmodule: None,
                iteminstance: category_id,
                grademax: 100.0,
                grademin: 0.0,
                sortorder: 1,
                timecreated: self.now,
                timemodified: self.now,
            },
        )?;
        debug!("Created grade category {} with course item {}", category_id, item_id);
        Ok(())
    }

    fn stamp(&self) -> String {
        self.stamps.stamp(self.now)
    }
}

/// Build the backup model for a parsed course
pub fn build_model(
    tree: &SourceTree,
    course_root: &Path,
    config: &ConvertConfig,
    progress: &dyn ProgressTracker,
) -> Result<BackupModel> {
    Builder::new(tree, course_root, config).build(progress)
}
