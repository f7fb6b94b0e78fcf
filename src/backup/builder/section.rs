// src/backup/builder/section.rs

//! Chapter to section, and the grouping of leaf content into modules
//!
//! Two buffers are kept while a chapter's sequentials are walked:
//!
//! - statics: consecutive html/video items, flushed as a book (two or more
//!   items) or a page (exactly one). It spans the verticals of a sequential.
//! - quiz items: statics and problems of the current vertical. When the
//!   vertical holds a problem, the statics are flushed first and then
//!   everything in this buffer becomes one quiz.

use super::{Builder, SectionSlot};
use crate::backup::entities::{ActivityEntity, EntityType, SectionEntity};
use crate::error::Result;
use crate::olx::{NodeId, NodeKind};
use tracing::{debug, warn};

impl Builder<'_> {
    pub(super) fn build_section(&mut self, chapter: NodeId, number: u32) -> Result<()> {
        let tree = self.tree;
        let section = SectionSlot {
            id: self.model.pool.new_entity(EntityType::Section),
            number,
        };

        for sequential in tree.children(chapter) {
            if sequential.kind() != NodeKind::Sequential {
                continue;
            }
            self.build_sequential(sequential.id, section)?;
        }

        let sequence = self
            .model
            .pool
            .all::<ActivityEntity>()
            .into_iter()
            .filter(|a| a.sectionid == section.id)
            .map(|a| a.moduleid)
            .collect();

        let node = tree.node(chapter);
        self.model.pool.set(
            section.id,
            SectionEntity {
                id: section.id,
                number,
                title: node.display_name().to_string(),
                summary: String::new(),
                sequence,
                timemodified: self.now,
            },
        )?;
        debug!("Section {} ({}) built from chapter {}", section.id, number, node.url_name);
        Ok(())
    }

    fn build_sequential(&mut self, sequential: NodeId, section: SectionSlot) -> Result<()> {
        let tree = self.tree;
        let mut statics: Vec<NodeId> = Vec::new();

        for vertical in tree.children(sequential) {
            if vertical.kind() != NodeKind::Vertical {
                continue;
            }
            let mut quiz_items: Vec<NodeId> = Vec::new();
            let mut has_problem = false;

            for item in tree.children(vertical.id) {
                match item.kind() {
                    NodeKind::Html | NodeKind::Video => {
                        statics.push(item.id);
                        quiz_items.push(item.id);
                    }
                    NodeKind::Problem => {
                        quiz_items.push(item.id);
                        has_problem = true;
                    }
                    NodeKind::Discussion if self.config.convert.discussions_as_forums => {
                        self.purge_static(&mut statics, vertical.display_name(), section)?;
                        self.build_forum(item.id, section)?;
                    }
                    NodeKind::Discussion => {
                        warn!("Skipping discussion {} ({})", item.url_name, item.display_name());
                    }
                    other => {
                        warn!("Unexpected {} {} inside vertical {}", other, item.url_name, vertical.url_name);
                    }
                }
            }

            if has_problem {
                self.purge_static(&mut statics, vertical.display_name(), section)?;
                self.build_quiz(&quiz_items, vertical.display_name(), section)?;
            }
        }

        let title = tree.node(sequential).display_name();
        self.purge_static(&mut statics, title, section)
    }

    /// Flush the static buffer: book for several items, page for one
    fn purge_static(&mut self, statics: &mut Vec<NodeId>, title: &str, section: SectionSlot) -> Result<()> {
        match statics.len() {
            0 => {}
            1 => self.build_page(statics[0], title, section)?,
            _ => self.build_book(statics, title, section)?,
        }
        statics.clear();
        Ok(())
    }
}
