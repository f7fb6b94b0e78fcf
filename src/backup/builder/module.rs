// src/backup/builder/module.rs

//! Course modules: the shared activity record plus books, pages and forums

use super::{Builder, SectionSlot};
use crate::backup::content::rewrite_static_refs;
use crate::backup::context::module_context;
use crate::backup::entities::*;
use crate::backup::files::FileArea;
use crate::error::Result;
use crate::olx::{NodeData, NodeId, SourceNode};
use tracing::{debug, warn};

impl Builder<'_> {
    /// Allocate the activity record and the next global module id
    ///
    /// The record is stored right away with no instance; `associate` fills
    /// it in once the kind-specific entity exists.
    pub(super) fn new_module(&mut self, kind: ModuleKind, title: &str, section: SectionSlot) -> Result<ActivityEntity> {
        let id = self.model.pool.new_entity(EntityType::Activity);
        let moduleid = self.next_moduleid;
        self.next_moduleid += 1;

        let activity = ActivityEntity {
            id,
            moduleid,
            modulename: kind,
            sectionid: section.id,
            sectionnumber: section.number,
            title: title.to_string(),
            added: self.now,
            instance: 0,
        };
        self.model.pool.set(id, activity.clone())?;
        Ok(activity)
    }

    pub(super) fn associate(&mut self, mut activity: ActivityEntity, instance: u32) -> Result<()> {
        activity.instance = instance;
        debug!(
            "Module {} {} \"{}\" -> {} {}",
            activity.moduleid, activity.modulename, activity.title, activity.modulename, instance
        );
        let id = activity.id;
        self.model.pool.set(id, activity)
    }

    /// Register the files referenced by `raw` and record the owner's edges
    pub(super) fn collect_files(&mut self, area: FileArea<'_>, raw: &str) -> Result<()> {
        self.files
            .collect(&mut self.model.pool, &mut self.model.refs, &area, raw)?;
        Ok(())
    }

    pub(super) fn build_page(&mut self, item: NodeId, title: &str, section: SectionSlot) -> Result<()> {
        let tree = self.tree;
        let node = tree.node(item);
        let Some(raw) = static_content(node) else {
            return Ok(());
        };

        let activity = self.new_module(ModuleKind::Page, title, section)?;
        let page_id = self.model.pool.new_entity(EntityType::Page);
        let contextid = module_context(activity.moduleid);
        self.model.pool.set(
            page_id,
            PageEntity {
                id: page_id,
                moduleid: activity.moduleid,
                contextid,
                name: title.to_string(),
                intro: String::new(),
                content: rewrite_static_refs(&raw),
                timemodified: self.now,
            },
        )?;
        self.collect_files(
            FileArea {
                owner_type: ModuleKind::Page.component(),
                owner_id: page_id,
                component: ModuleKind::Page.component(),
                filearea: "content",
                itemid: 0,
                contextid,
            },
            &raw,
        )?;
        self.associate(activity, page_id)
    }

    pub(super) fn build_book(&mut self, items: &[NodeId], title: &str, section: SectionSlot) -> Result<()> {
        let tree = self.tree;
        let chapters: Vec<(&SourceNode, String)> = items
            .iter()
            .map(|id| tree.node(*id))
            .filter_map(|node| static_content(node).map(|raw| (node, raw)))
            .collect();
        if chapters.is_empty() {
            return Ok(());
        }

        let activity = self.new_module(ModuleKind::Book, title, section)?;
        let book_id = self.model.pool.new_entity(EntityType::Book);
        let contextid = module_context(activity.moduleid);

        let mut chapter_ids = Vec::with_capacity(chapters.len());
        for (index, (node, raw)) in chapters.iter().enumerate() {
            let chapter_id = self.model.pool.new_entity(EntityType::Chapter);
            self.model.pool.set(
                chapter_id,
                ChapterEntity {
                    id: chapter_id,
                    pagenum: index as u32 + 1,
                    subchapter: 0,
                    title: node.display_name().to_string(),
                    content: rewrite_static_refs(raw),
                    timemodified: self.now,
                },
            )?;
            self.collect_files(
                FileArea {
                    owner_type: ModuleKind::Book.component(),
                    owner_id: book_id,
                    component: ModuleKind::Book.component(),
                    filearea: "chapter",
                    itemid: chapter_id,
                    contextid,
                },
                raw,
            )?;
            chapter_ids.push(chapter_id);
        }

        self.model.pool.set(
            book_id,
            BookEntity {
                id: book_id,
                moduleid: activity.moduleid,
                contextid,
                name: title.to_string(),
                intro: String::new(),
                chapters: chapter_ids,
                timecreated: self.now,
                timemodified: self.now,
            },
        )?;
        self.associate(activity, book_id)
    }

    pub(super) fn build_forum(&mut self, item: NodeId, section: SectionSlot) -> Result<()> {
        let tree = self.tree;
        let NodeData::Discussion(discussion) = &tree.node(item).data else {
            return Ok(());
        };
        let name = if discussion.display_name.is_empty() {
            discussion.category.as_str()
        } else {
            discussion.display_name.as_str()
        };
        let intro = if discussion.target.is_empty() {
            name
        } else {
            discussion.target.as_str()
        };

        let activity = self.new_module(ModuleKind::Forum, name, section)?;
        let forum_id = self.model.pool.new_entity(EntityType::Forum);
        self.model.pool.set(
            forum_id,
            ForumEntity {
                id: forum_id,
                moduleid: activity.moduleid,
                contextid: module_context(activity.moduleid),
                forum_type: "general".to_string(),
                name: name.to_string(),
                intro: intro.to_string(),
                timecreated: self.now,
                timemodified: self.now,
            },
        )?;
        self.associate(activity, forum_id)
    }
}

/// Rendered content of a static item; anything else is dropped with a warning
pub(super) fn static_content(node: &SourceNode) -> Option<String> {
    if !node.kind().is_static() {
        warn!("{} {} should be static content, dropping it", node.kind(), node.url_name);
        return None;
    }
    node.data.content()
}
