// src/export/mod.rs

//! Backup tree writer
//!
//! `Exporter` reads a built `BackupModel` and writes the Moodle backup
//! directory in a fixed order:
//!
//! 1. `moodle_backup.xml`
//! 2. `course/` with its gradebook and completion companions at the root
//! 3. `sections/section_<id>/`
//! 4. `activities/<kind>_<moduleid>/`, grouped by module kind
//! 5. `questions.xml`
//! 6. `files.xml` and the `files/` store
//!
//! Documents Moodle requires even when empty are written last, and only
//! where no handler produced them.

mod activity;
mod course;
mod files;
mod inforef;
mod manifest;
mod questions;
pub mod writer;

pub use files::StoreStats;
pub use manifest::{backup_filename, backup_id};
pub use writer::{DocumentWriter, XmlNode, render};

use crate::backup::context::COURSE_ID;
use crate::backup::entities::*;
use crate::backup::{BackupModel, ModuleKind};
use crate::config::ConvertConfig;
use crate::error::{Error, Result};
use crate::filesystem::FileStore;
use crate::progress::ProgressTracker;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What an export produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub output: PathBuf,
    pub sections: usize,
    pub activities: usize,
    pub documents: usize,
    pub placeholders: usize,
    pub files: StoreStats,
}

pub struct Exporter<'a> {
    model: &'a BackupModel,
    config: &'a ConvertConfig,
    writer: DocumentWriter,
    store: FileStore,
    now: i64,
}

impl<'a> Exporter<'a> {
    /// Prepare an export of `model` into `output`, creating it if needed
    pub fn new(model: &'a BackupModel, output: &Path, config: &'a ConvertConfig) -> Result<Self> {
        std::fs::create_dir_all(output)?;
        Ok(Self {
            model,
            config,
            writer: DocumentWriter::new(output),
            store: FileStore::new(output.join("files"))?,
            now: chrono::Utc::now().timestamp(),
        })
    }

    /// Units ticked by `export`: manifest, course, each section and
    /// activity, questions and files
    pub fn unit_count(&self) -> u64 {
        let pool = &self.model.pool;
        (4 + pool.count(EntityType::Section) + pool.count(EntityType::Activity)) as u64
    }

    pub fn export(mut self, progress: &dyn ProgressTracker) -> Result<ExportReport> {
        let model = self.model;
        let pool = &model.pool;
        let course = model.course().ok_or_else(|| Error::UnallocatedEntity {
            entity_type: EntityType::Course.to_string(),
            id: COURSE_ID,
        })?;
        let sections = pool.all::<SectionEntity>();
        let activities = activities_by_kind(pool.all::<ActivityEntity>());

        let manifest = manifest::manifest_document(course, &sections, &activities, &self.config.target, self.now);
        self.writer.write_document("moodle_backup.xml", &manifest)?;
        progress.increment(1);

        self.write_course(course)?;
        progress.increment(1);

        for section in &sections {
            let dir = manifest::section_directory(section.id);
            self.writer
                .write_document(format!("{}/section.xml", dir), &course::section_document(section))?;
            self.write_inforef(&dir, "section", section.id)?;
            progress.increment(1);
        }

        for activity in &activities {
            self.write_activity(activity)?;
            progress.increment(1);
        }

        let questions = questions::questions_document(pool)?;
        self.writer.write_document("questions.xml", &questions)?;
        progress.increment(1);

        let files = files::referenced_files(pool, &model.refs)?;
        self.writer.write_document("files.xml", &files::files_document(&files))?;
        let stats = files::store_files(&self.store, &files)?;
        debug!(
            "Stored {} files ({} copied, {} deduplicated)",
            files.len(),
            stats.copied,
            stats.deduplicated
        );
        progress.increment(1);

        let placeholders = self.ensure_placeholders(&activities)?;

        let report = ExportReport {
            output: self.writer.root().to_path_buf(),
            sections: sections.len(),
            activities: activities.len(),
            documents: self.writer.written(),
            placeholders,
            files: stats,
        };
        info!(
            "Exported {} sections, {} activities and {} documents to {}",
            report.sections,
            report.activities,
            report.documents,
            report.output.display()
        );
        Ok(report)
    }

    fn write_course(&mut self, course: &CourseEntity) -> Result<()> {
        let model = self.model;
        let pool = &model.pool;
        self.writer
            .write_document("course/course.xml", &course::course_document(course))?;
        self.write_inforef("course", "course", course.id)?;
        self.writer
            .write_document("course/enrolments.xml", &course::enrolments_document())?;
        self.writer
            .write_document("course/roles.xml", &course::roles_document())?;
        self.writer
            .write_document("course/completiondefaults.xml", &XmlNode::new("course_completion_defaults"))?;

        let categories = pool.all::<GradeCategoryEntity>();
        let course_items: Vec<_> = pool
            .all::<GradeItemEntity>()
            .into_iter()
            .filter(|item| item.itemmodule.is_none())
            .collect();
        self.writer
            .write_document("gradebook.xml", &course::gradebook_document(&categories, &course_items))?;
        self.writer
            .write_document("completion.xml", &course::completion_document(course))?;
        Ok(())
    }

    fn write_activity(&mut self, activity: &ActivityEntity) -> Result<()> {
        let model = self.model;
        let pool = &model.pool;
        let dir = activity.directory();
        let kind = activity.modulename;

        self.writer
            .write_document(format!("{}/module.xml", dir), &activity::module_document(activity))?;
        self.writer.write_document(
            format!("{}/{}.xml", dir, kind),
            &activity::instance_document(pool, activity)?,
        )?;

        let items: Vec<_> = pool
            .all::<GradeItemEntity>()
            .into_iter()
            .filter(|item| item.itemmodule == Some(kind) && item.iteminstance == activity.instance)
            .collect();
        self.writer
            .write_document(format!("{}/grades.xml", dir), &activity::grades_document(&items))?;
        self.write_inforef(&dir, kind.component(), activity.instance)?;

        debug!("Exported {} ({})", dir, activity.title);
        Ok(())
    }

    fn write_inforef(&mut self, dir: &str, owner_type: &str, owner_id: u32) -> Result<()> {
        let model = self.model;
        let doc = inforef::inforef_document(&model.refs, owner_type, owner_id);
        self.writer.write_document(format!("{}/inforef.xml", dir), &doc)
    }

    /// Write the empty documents no handler produced; returns how many
    fn ensure_placeholders(&mut self, activities: &[&ActivityEntity]) -> Result<usize> {
        let grade_history = || XmlNode::new("grade_history").child(XmlNode::new("grade_grades"));

        let mut documents: Vec<(String, XmlNode)> = vec![
            ("groups.xml".into(), XmlNode::new("groups").child(XmlNode::new("groupings"))),
            ("outcomes.xml".into(), XmlNode::new("outcomes_definition")),
            ("scales.xml".into(), XmlNode::new("scales_definition")),
            ("roles.xml".into(), XmlNode::new("roles_definition")),
            ("users.xml".into(), XmlNode::new("users")),
            ("questions.xml".into(), XmlNode::new("question_categories")),
            ("grade_history.xml".into(), grade_history()),
            ("course/roles.xml".into(), course::roles_document()),
            ("course/enrolments.xml".into(), course::enrolments_document()),
        ];
        for activity in activities {
            let dir = activity.directory();
            documents.push((format!("{}/roles.xml", dir), course::roles_document()));
            documents.push((format!("{}/calendar.xml", dir), XmlNode::new("events")));
            documents.push((format!("{}/grade_history.xml", dir), grade_history()));
        }

        let mut written = 0;
        for (path, root) in &documents {
            if !self.writer.ensure_exists(path, root)? {
                written += 1;
            }
        }
        Ok(written)
    }
}

/// Activities in export order: by kind, then by module id
fn activities_by_kind(activities: Vec<&ActivityEntity>) -> Vec<&ActivityEntity> {
    let mut ordered = Vec::with_capacity(activities.len());
    for kind in ModuleKind::ALL {
        let mut group: Vec<_> = activities.iter().copied().filter(|a| a.modulename == kind).collect();
        group.sort_by_key(|a| a.moduleid);
        ordered.extend(group);
    }
    ordered
}

/// Export `model` into `output`, ticking `progress` once per unit
pub fn export_backup(
    model: &BackupModel,
    output: &Path,
    config: &ConvertConfig,
    progress: &dyn ProgressTracker,
) -> Result<ExportReport> {
    Exporter::new(model, output, config)?.export(progress)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(id: u32, moduleid: u32, kind: ModuleKind) -> ActivityEntity {
        ActivityEntity {
            id,
            moduleid,
            modulename: kind,
            sectionid: 1,
            sectionnumber: 0,
            title: String::new(),
            added: 0,
            instance: 1,
        }
    }

    #[test]
    fn test_activities_grouped_by_kind() {
        let quiz = activity(1, 1, ModuleKind::Quiz);
        let page = activity(2, 2, ModuleKind::Page);
        let book = activity(3, 3, ModuleKind::Book);
        let page2 = activity(4, 4, ModuleKind::Page);

        let ordered = activities_by_kind(vec![&quiz, &page, &book, &page2]);
        let ids: Vec<_> = ordered.iter().map(|a| a.moduleid).collect();
        assert_eq!(ids, [3, 2, 4, 1]);
    }
}
