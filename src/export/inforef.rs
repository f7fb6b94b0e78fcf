// src/export/inforef.rs

//! `inforef.xml`: the entities a unit depends on, read from the reference
//! manager

use super::writer::XmlNode;
use crate::backup::{RefKind, RefManager};

/// Cross-reference document for one owner
///
/// Kinds come out in `RefKind::ALL` order. Repeated targets within a kind
/// are listed once, at their first position.
pub fn inforef_document(refs: &RefManager, owner_type: &str, owner_id: u32) -> XmlNode {
    let mut root = XmlNode::new("inforef");

    for kind in RefKind::ALL {
        let targets = refs.get_refs(owner_type, owner_id, kind);
        if targets.is_empty() {
            continue;
        }

        let mut seen = Vec::with_capacity(targets.len());
        for id in targets {
            if !seen.contains(id) {
                seen.push(*id);
            }
        }

        root = root.child(
            XmlNode::new(format!("{}ref", kind))
                .children(seen.into_iter().map(|id| XmlNode::new(kind.as_str()).field("id", id))),
        );
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_by_kind() {
        let mut refs = RefManager::new();
        refs.add("mod_quiz", 1, RefKind::GradeItem, 2);
        refs.add("mod_quiz", 1, RefKind::QuestionCategory, 4);
        refs.add("mod_quiz", 1, RefKind::QuestionCategory, 3);
        refs.add("mod_quiz", 2, RefKind::File, 9);

        let doc = inforef_document(&refs, "mod_quiz", 1);
        let names: Vec<_> = doc.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["grade_itemref", "question_categoryref"]);

        let ids: Vec<_> = doc.children[1]
            .children
            .iter()
            .map(|c| c.find("id").unwrap().text.clone().unwrap())
            .collect();
        assert_eq!(ids, ["4", "3"]);
    }

    #[test]
    fn test_duplicate_targets_listed_once() {
        let mut refs = RefManager::new();
        refs.add("mod_book", 1, RefKind::File, 5);
        refs.add("mod_book", 1, RefKind::File, 5);

        let doc = inforef_document(&refs, "mod_book", 1);
        assert_eq!(doc.find("fileref").unwrap().children.len(), 1);
    }

    #[test]
    fn test_owner_without_refs_is_empty() {
        let doc = inforef_document(&RefManager::new(), "course", 2);
        assert_eq!(doc.name, "inforef");
        assert!(doc.children.is_empty());
    }
}
