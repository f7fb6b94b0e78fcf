// src/backup/refs.rs

//! Reference manager: owner to dependency edges
//!
//! An owner is a component type (`course`, `section`, `mod_quiz`,
//! `question`...) plus an id. Edges accumulate per owner and kind in
//! insertion order; duplicates are kept.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Inforef item kinds known to Moodle's backup format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RefKind {
    User,
    Grouping,
    Group,
    Role,
    File,
    Scale,
    Outcome,
    GradeItem,
    QuestionCategory,
}

impl RefKind {
    /// `backup_helper::get_inforef_itemnames()` as of Moodle 3.9
    pub const ALL: [RefKind; 9] = [
        Self::User,
        Self::Grouping,
        Self::Group,
        Self::Role,
        Self::File,
        Self::Scale,
        Self::Outcome,
        Self::GradeItem,
        Self::QuestionCategory,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Grouping => "grouping",
            Self::Group => "group",
            Self::Role => "role",
            Self::File => "file",
            Self::Scale => "scale",
            Self::Outcome => "outcome",
            Self::GradeItem => "grade_item",
            Self::QuestionCategory => "question_category",
        }
    }
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RefKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::InvalidReferenceKind(s.to_string()))
    }
}

/// Edges grouped by owner type, owner id and kind
#[derive(Debug, Default)]
pub struct RefManager {
    refs: BTreeMap<String, BTreeMap<u32, BTreeMap<RefKind, Vec<u32>>>>,
}

impl RefManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an edge, validating `kind` against the known enumeration
    pub fn add_ref(&mut self, owner_type: &str, owner_id: u32, kind: &str, target: u32) -> Result<()> {
        let kind: RefKind = kind.parse()?;
        self.add(owner_type, owner_id, kind, target);
        Ok(())
    }

    /// Record an edge of an already-validated kind
    pub fn add(&mut self, owner_type: &str, owner_id: u32, kind: RefKind, target: u32) {
        self.refs
            .entry(owner_type.to_string())
            .or_default()
            .entry(owner_id)
            .or_default()
            .entry(kind)
            .or_default()
            .push(target);
    }

    /// Targets of one owner and kind, in insertion order
    pub fn get_refs(&self, owner_type: &str, owner_id: u32, kind: RefKind) -> &[u32] {
        self.refs
            .get(owner_type)
            .and_then(|owners| owners.get(&owner_id))
            .and_then(|kinds| kinds.get(&kind))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every owner holding edges of `kind`: owner type -> owner id -> targets
    pub fn get_refs_for_type(&self, kind: RefKind) -> BTreeMap<&str, BTreeMap<u32, Vec<u32>>> {
        let mut out: BTreeMap<&str, BTreeMap<u32, Vec<u32>>> = BTreeMap::new();
        for (owner_type, owners) in &self.refs {
            for (owner_id, kinds) in owners {
                if let Some(targets) = kinds.get(&kind).filter(|t| !t.is_empty()) {
                    out.entry(owner_type.as_str())
                        .or_default()
                        .insert(*owner_id, targets.clone());
                }
            }
        }
        out
    }

    /// All targets of `kind` across owners, flattened
    pub fn get_all_refs_for_type(&self, kind: RefKind) -> Vec<u32> {
        self.get_refs_for_type(kind)
            .into_values()
            .flat_map(BTreeMap::into_values)
            .flatten()
            .collect()
    }

    /// Total number of recorded edges
    pub fn len(&self) -> usize {
        self.refs
            .values()
            .flat_map(BTreeMap::values)
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_in_order() {
        let mut refs = RefManager::new();
        refs.add_ref("mod_book", 1, "file", 3).unwrap();
        refs.add_ref("mod_book", 1, "file", 1).unwrap();
        refs.add_ref("mod_book", 1, "file", 3).unwrap();

        assert_eq!(refs.get_refs("mod_book", 1, RefKind::File), &[3, 1, 3]);
        assert_eq!(refs.len(), 3);
    }

    #[test]
    fn test_unused_owner_is_empty() {
        let mut refs = RefManager::new();
        refs.add_ref("mod_quiz", 1, "question_category", 2).unwrap();

        assert!(refs.get_refs("mod_quiz", 1, RefKind::File).is_empty());
        assert!(refs.get_refs("mod_quiz", 2, RefKind::QuestionCategory).is_empty());
        assert!(refs.get_refs("section", 1, RefKind::File).is_empty());
    }

    #[test]
    fn test_invalid_kind_rejected() {
        let mut refs = RefManager::new();
        let err = refs.add_ref("mod_page", 1, "badge", 1).unwrap_err();
        assert!(matches!(err, Error::InvalidReferenceKind(k) if k == "badge"));
        assert!(refs.is_empty());
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in RefKind::ALL {
            assert_eq!(kind.as_str().parse::<RefKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_refs_for_type() {
        let mut refs = RefManager::new();
        refs.add("mod_page", 1, RefKind::File, 1);
        refs.add("mod_book", 1, RefKind::File, 2);
        refs.add("mod_book", 1, RefKind::File, 3);
        refs.add("mod_quiz", 1, RefKind::QuestionCategory, 1);

        let files = refs.get_refs_for_type(RefKind::File);
        assert_eq!(files.len(), 2);
        assert_eq!(files["mod_book"][&1], vec![2, 3]);
        assert!(!files.contains_key("mod_quiz"));

        let mut all = refs.get_all_refs_for_type(RefKind::File);
        all.sort();
        assert_eq!(all, vec![1, 2, 3]);
    }
}
