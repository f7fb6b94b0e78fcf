// src/export/files.rs

//! `files.xml` and the content-addressed `files/` store

use super::writer::XmlNode;
use crate::backup::entities::{EntityType, FileEntity, NULL_MARKER};
use crate::backup::{EntityPool, RefKind, RefManager};
use crate::error::{Error, Result};
use crate::filesystem::{FileStore, StoreOutcome};
use std::collections::BTreeSet;
use tracing::warn;

/// Blob copy counts of one export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub copied: usize,
    pub deduplicated: usize,
}

/// Files some owner references, by ascending id
///
/// A file edge pointing at an id with no entity is an error. Entities no
/// owner references are left out of the backup.
pub fn referenced_files<'p>(pool: &'p EntityPool, refs: &RefManager) -> Result<Vec<&'p FileEntity>> {
    let ids: BTreeSet<u32> = refs.get_all_refs_for_type(RefKind::File).into_iter().collect();
    let files = ids
        .into_iter()
        .map(|id| {
            pool.get::<FileEntity>(id).ok_or_else(|| Error::UnallocatedEntity {
                entity_type: EntityType::File.to_string(),
                id,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let unreferenced = pool.all::<FileEntity>().len().saturating_sub(files.len());
    if unreferenced > 0 {
        warn!("{} file entities have no owner, leaving them out", unreferenced);
    }
    Ok(files)
}

pub fn files_document(files: &[&FileEntity]) -> XmlNode {
    XmlNode::new("files").children(files.iter().map(|file| {
        XmlNode::new("file")
            .attr("id", file.id)
            .field("contenthash", &file.contenthash)
            .field("contextid", file.contextid)
            .field("component", &file.component)
            .field("filearea", &file.filearea)
            .field("itemid", file.itemid)
            .field("filepath", &file.filepath)
            .field("filename", &file.filename)
            .field("userid", file.userid)
            .field("filesize", file.filesize)
            .field("mimetype", &file.mimetype)
            .field("status", file.status)
            .field("timecreated", file.timecreated)
            .field("timemodified", file.timemodified)
            .field("source", &file.source)
            .field("author", NULL_MARKER)
            .field("license", NULL_MARKER)
            .field("sortorder", file.sortorder)
            .field("repositorytype", NULL_MARKER)
            .field("repositoryid", NULL_MARKER)
            .field("reference", NULL_MARKER)
    }))
}

/// Copy the bytes of every file entity into `store`
///
/// Entities sharing a content hash are stored once.
pub fn store_files(store: &FileStore, files: &[&FileEntity]) -> Result<StoreStats> {
    let mut stats = StoreStats::default();
    for file in files {
        match store.import(&file.source_path, &file.contenthash, file.filesize)? {
            StoreOutcome::Copied => stats.copied += 1,
            StoreOutcome::Deduplicated => stats.deduplicated += 1,
        }
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn file_entity(id: u32, source: &Path, content: &[u8]) -> FileEntity {
        FileEntity {
            id,
            contenthash: hash::sha1(content),
            contextid: 201,
            component: "mod_page".to_string(),
            filearea: "content".to_string(),
            itemid: 0,
            filepath: "/".to_string(),
            filename: source.file_name().unwrap().to_string_lossy().into_owned(),
            userid: 2,
            filesize: content.len() as u64,
            mimetype: "image/png".to_string(),
            status: 0,
            source: source.file_name().unwrap().to_string_lossy().into_owned(),
            sortorder: 0,
            timecreated: 0,
            timemodified: 0,
            source_path: source.to_path_buf(),
        }
    }

    #[test]
    fn test_identical_bytes_stored_once() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let a = src.path().join("a.png");
        let b = src.path().join("b.png");
        fs::write(&a, b"pixels").unwrap();
        fs::write(&b, b"pixels").unwrap();

        let first = file_entity(1, &a, b"pixels");
        let second = file_entity(2, &b, b"pixels");
        let store = FileStore::new(out.path().join("files")).unwrap();

        let stats = store_files(&store, &[&first, &second]).unwrap();
        assert_eq!(stats, StoreStats { copied: 1, deduplicated: 1 });
        assert!(store.exists(&first.contenthash));
    }

    #[test]
    fn test_collision_aborts() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let a = src.path().join("a.png");
        fs::write(&a, b"pixels").unwrap();
        let entity = file_entity(1, &a, b"pixels");

        let store = FileStore::new(out.path().join("files")).unwrap();
        let target = store.hash_to_path(&entity.contenthash);
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, b"different length").unwrap();

        let err = store_files(&store, &[&entity]).unwrap_err();
        assert!(matches!(err, Error::ContentIntegrity { .. }));
    }

    #[test]
    fn test_files_listed_through_references() {
        let src = TempDir::new().unwrap();
        let a = src.path().join("a.png");
        let mut pool = EntityPool::new();
        for _ in 0..3 {
            let id = pool.new_entity(EntityType::File);
            pool.set(id, file_entity(id, &a, b"x")).unwrap();
        }

        let mut refs = RefManager::new();
        refs.add("mod_book", 1, RefKind::File, 3);
        refs.add("mod_page", 2, RefKind::File, 1);
        refs.add("mod_book", 1, RefKind::File, 3);

        let ids: Vec<_> = referenced_files(&pool, &refs).unwrap().iter().map(|f| f.id).collect();
        assert_eq!(ids, [1, 3]);
    }

    #[test]
    fn test_dangling_file_reference_fails() {
        let src = TempDir::new().unwrap();
        let a = src.path().join("a.png");
        let mut pool = EntityPool::new();
        let id = pool.new_entity(EntityType::File);
        pool.set(id, file_entity(id, &a, b"x")).unwrap();

        let mut refs = RefManager::new();
        refs.add("mod_page", 1, RefKind::File, 4);

        let err = referenced_files(&pool, &refs).unwrap_err();
        assert!(matches!(err, Error::UnallocatedEntity { id: 4, .. }));
    }

    #[test]
    fn test_files_document_null_markers() {
        let src = TempDir::new().unwrap();
        let a = src.path().join("a.png");
        let entity = file_entity(7, &a, b"x");

        let doc = files_document(&[&entity]);
        let file = doc.find("file").unwrap();
        assert_eq!(file.get_attr("id"), Some("7"));
        assert_eq!(file.find("license").unwrap().text.as_deref(), Some(NULL_MARKER));
        assert_eq!(file.find("filesize").unwrap().text.as_deref(), Some("1"));
    }
}
