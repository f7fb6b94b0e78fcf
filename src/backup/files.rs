// src/backup/files.rs

//! File collector: static assets to `file` entities
//!
//! Every static reference found in a unit's content becomes one file entity
//! owned by that unit's file area. The same asset used by two units yields
//! two entities; the bytes are deduplicated later by the content store.

use super::content::{iframe_static_refs, src_refs, static_refs};
use super::entities::{ADMIN_USER_ID, EntityType, FileEntity};
use super::pool::EntityPool;
use super::refs::{RefKind, RefManager};
use crate::error::{Error, Result};
use crate::filesystem::path::safe_join;
use crate::hash::{HashAlgorithm, hash_file};
use crate::olx::AssetManifest;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Owner and location of registered files
#[derive(Debug, Clone, Copy)]
pub struct FileArea<'a> {
    /// Reference owner type (`mod_book`, `question`...)
    pub owner_type: &'a str,
    pub owner_id: u32,
    pub component: &'a str,
    pub filearea: &'a str,
    pub itemid: u32,
    pub contextid: u32,
}

pub struct FileCollector<'a> {
    static_dir: PathBuf,
    manifest: &'a AssetManifest,
    now: i64,
}

impl<'a> FileCollector<'a> {
    pub fn new(course_root: &Path, manifest: &'a AssetManifest, now: i64) -> Self {
        Self {
            static_dir: course_root.join("static"),
            manifest,
            now,
        }
    }

    /// Register every asset `raw_text` references and record the file edges
    ///
    /// Static HTML pulled in by an iframe is scanned once more for assets
    /// listed in the manifest. That scan does not recurse further.
    pub fn collect(
        &self,
        pool: &mut EntityPool,
        refs: &mut RefManager,
        area: &FileArea<'_>,
        raw_text: &str,
    ) -> Result<Vec<u32>> {
        let mut ids = Vec::new();

        for name in static_refs(raw_text) {
            ids.push(self.register(pool, &name, area)?);
        }

        for embedded in iframe_static_refs(raw_text) {
            if !self.known(&embedded) {
                continue;
            }
            let path = self.resolve(&embedded)?;
            if !path.is_file() {
                warn!("Embedded document {} not found", path.display());
                continue;
            }
            let html = String::from_utf8_lossy(&std::fs::read(&path)?).into_owned();
            for src in src_refs(&html) {
                let name = src.strip_prefix("/static/").unwrap_or(src.as_str());
                if !self.known(name) {
                    continue;
                }
                match self.resolve(name) {
                    Ok(path) if path.is_file() => ids.push(self.register(pool, name, area)?),
                    _ => warn!("Asset {} embedded in {} not found, skipping it", src, embedded),
                }
            }
        }

        for id in &ids {
            refs.add(area.owner_type, area.owner_id, RefKind::File, *id);
        }
        Ok(ids)
    }

    fn known(&self, name: &str) -> bool {
        self.manifest.contains(name) || self.manifest.contains(basename(name))
    }

    /// Location of an asset under `static/`
    ///
    /// The manifest is keyed by file name; an `import_path` overrides where
    /// the bytes live.
    fn resolve(&self, name: &str) -> Result<PathBuf> {
        let trimmed = name.trim_start_matches('/');
        let relative = if self.manifest.contains(trimmed) {
            self.manifest.source_path(trimmed)
        } else {
            let file = basename(trimmed);
            match self.manifest.get(file).and_then(|e| e.import_path.as_deref()) {
                Some(import) if !import.is_empty() => import,
                _ => trimmed,
            }
        };
        safe_join(&self.static_dir, relative)
    }

    /// Allocate a file entity for one asset
    pub fn register(&self, pool: &mut EntityPool, name: &str, area: &FileArea<'_>) -> Result<u32> {
        let name = name.trim_matches(|c| c == '"' || c == '\'');
        let source_path = self.resolve(name)?;
        if !source_path.is_file() {
            return Err(Error::missing("static asset", source_path));
        }

        let (hash, size) = hash_file(HashAlgorithm::Sha1, &source_path)?;
        let filename = basename(name).to_string();
        let filepath = virtual_dir(name);
        let mimetype = self
            .manifest
            .get(name)
            .or_else(|| self.manifest.get(&filename))
            .and_then(|e| e.content_type.clone())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| mime_type(&filename).to_string());

        let id = pool.new_entity(EntityType::File);
        pool.set(
            id,
            FileEntity {
                id,
                contenthash: hash.as_str().to_string(),
                contextid: area.contextid,
                component: area.component.to_string(),
                filearea: area.filearea.to_string(),
                itemid: area.itemid,
                filepath,
                source: filename.clone(),
                filename,
                userid: ADMIN_USER_ID,
                filesize: size,
                mimetype,
                status: 0,
                sortorder: 0,
                timecreated: self.now,
                timemodified: self.now,
                source_path,
            },
        )?;
        debug!("Registered file {} ({}) for {}/{}", name, hash, area.component, area.filearea);
        Ok(id)
    }
}

fn basename(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Moodle file path of an asset: `/` or `/dir/sub/`
fn virtual_dir(name: &str) -> String {
    match name.trim_start_matches('/').rsplit_once('/') {
        Some((dir, _)) if !dir.is_empty() => format!("/{}/", dir),
        _ => "/".to_string(),
    }
}

/// Mime type from the file extension
pub fn mime_type(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/vnd.microsoft.icon",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "json" => "application/json",
        "js" => "application/javascript",
        "css" => "text/css",
        "html" | "htm" => "text/html",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "xml" => "application/xml",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "srt" => "application/x-subrip",
        "vtt" => "text/vtt",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::sha1;
    use std::fs;
    use tempfile::TempDir;

    fn area(owner_id: u32) -> FileArea<'static> {
        FileArea {
            owner_type: "mod_page",
            owner_id,
            component: "mod_page",
            filearea: "content",
            itemid: 0,
            contextid: 201,
        }
    }

    fn course_with_static(files: &[(&str, &[u8])]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            let path = dir.path().join("static").join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    #[test]
    fn test_register_file_entity() {
        let dir = course_with_static(&[("img/logo.png", b"png bytes")]);
        let manifest = AssetManifest::default();
        let collector = FileCollector::new(dir.path(), &manifest, 100);
        let mut pool = EntityPool::new();

        let id = collector.register(&mut pool, "img/logo.png", &area(1)).unwrap();
        let file = pool.get::<FileEntity>(id).unwrap();

        assert_eq!(file.contenthash, sha1(b"png bytes"));
        assert_eq!(file.filesize, 9);
        assert_eq!(file.filename, "logo.png");
        assert_eq!(file.filepath, "/img/");
        assert_eq!(file.mimetype, "image/png");
        assert_eq!(file.userid, 2);
        assert_eq!(file.contextid, 201);
    }

    #[test]
    fn test_import_path_override() {
        let dir = course_with_static(&[("handouts/intro.pdf", b"%PDF")]);
        let manifest = AssetManifest::from_json(
            r#"{"intro.pdf": {"import_path": "handouts/intro.pdf", "contentType": "application/x-pdf"}}"#,
        )
        .unwrap();
        let collector = FileCollector::new(dir.path(), &manifest, 0);
        let mut pool = EntityPool::new();

        let id = collector.register(&mut pool, "intro.pdf", &area(1)).unwrap();
        let file = pool.get::<FileEntity>(id).unwrap();
        assert_eq!(file.filepath, "/");
        assert_eq!(file.mimetype, "application/x-pdf");
        assert!(file.source_path.ends_with("handouts/intro.pdf"));
    }

    #[test]
    fn test_missing_asset_fails() {
        let dir = course_with_static(&[]);
        let manifest = AssetManifest::default();
        let collector = FileCollector::new(dir.path(), &manifest, 0);
        let mut pool = EntityPool::new();

        let err = collector.register(&mut pool, "gone.png", &area(1)).unwrap_err();
        assert!(matches!(err, Error::MissingReference { .. }));
    }

    #[test]
    fn test_collect_one_entity_per_reference() {
        let dir = course_with_static(&[("a.png", b"a")]);
        let manifest = AssetManifest::default();
        let collector = FileCollector::new(dir.path(), &manifest, 0);
        let mut pool = EntityPool::new();
        let mut refs = RefManager::new();

        let html = r#"<img src="/static/a.png"><img src='/static/a.png'>"#;
        let ids = collector.collect(&mut pool, &mut refs, &area(3), html).unwrap();

        assert_eq!(ids, vec![1, 2]);
        assert_eq!(refs.get_refs("mod_page", 3, RefKind::File), &[1, 2]);
    }

    #[test]
    fn test_collect_follows_iframe_once() {
        let dir = course_with_static(&[
            ("sim.html", br#"<script src="sim.js"></script><a href="other.html">x</a>"#),
            ("sim.js", b"js"),
            ("other.html", b"<img src='deep.png'>"),
        ]);
        let manifest = AssetManifest::from_json(
            r#"{"sim.html": {}, "sim.js": {}, "other.html": {}, "deep.png": {}}"#,
        )
        .unwrap();
        let collector = FileCollector::new(dir.path(), &manifest, 0);
        let mut pool = EntityPool::new();
        let mut refs = RefManager::new();

        let html = r#"<iframe src="/static/sim.html"></iframe>"#;
        let ids = collector.collect(&mut pool, &mut refs, &area(1), html).unwrap();

        // sim.html itself, then sim.js and other.html from inside it
        let names: Vec<String> = ids
            .iter()
            .map(|id| pool.get::<FileEntity>(*id).unwrap().filename.clone())
            .collect();
        assert_eq!(names, vec!["sim.html", "sim.js", "other.html"]);
    }

    #[test]
    fn test_iframe_subreferences_with_static_prefix() {
        let dir = course_with_static(&[
            ("sim.html", br#"<script src="/static/sim.js"></script><img src="/static/gone.png">"#),
            ("sim.js", b"js"),
        ]);
        let manifest =
            AssetManifest::from_json(r#"{"sim.html": {}, "sim.js": {}, "gone.png": {}}"#).unwrap();
        let collector = FileCollector::new(dir.path(), &manifest, 0);
        let mut pool = EntityPool::new();
        let mut refs = RefManager::new();

        let html = r#"<iframe src="/static/sim.html"></iframe>"#;
        let ids = collector.collect(&mut pool, &mut refs, &area(1), html).unwrap();

        // listed but absent assets inside the embedded page are skipped
        let files: Vec<_> = ids.iter().map(|id| pool.get::<FileEntity>(*id).unwrap()).collect();
        assert_eq!(files.len(), 2);
        assert_eq!(files[1].filename, "sim.js");
        assert_eq!(files[1].filepath, "/");
        assert!(files[1].source_path.ends_with("static/sim.js"));
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type("a.JPG"), "image/jpeg");
        assert_eq!(mime_type("notes"), "application/octet-stream");
        assert_eq!(mime_type("style.css"), "text/css");
    }
}
