// src/filesystem/store.rs

//! Hash-bucketed file store of a Moodle backup
//!
//! Moodle keeps file bodies under `files/<first two hex chars>/<contenthash>`
//! where the content hash is the SHA-1 of the bytes. Identical bytes land on
//! the same path, so every file is stored once no matter how many file
//! records point at it.

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What `FileStore::import` did with a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    /// Bytes were copied into a new bucket entry
    Copied,
    /// An entry with the same hash and size was already present
    Deduplicated,
}

/// Content-addressed `files/` directory of a backup
#[derive(Debug, Clone)]
pub struct FileStore {
    files_dir: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) the store rooted at `files_dir`
    pub fn new<P: AsRef<Path>>(files_dir: P) -> Result<Self> {
        let files_dir = files_dir.as_ref().to_path_buf();

        if !files_dir.exists() {
            fs::create_dir_all(&files_dir)?;
            debug!("Created backup file store: {:?}", files_dir);
        }

        Ok(Self { files_dir })
    }

    /// Path for a hash: files/{first2}/{full hash}
    pub fn hash_to_path(&self, hash: &str) -> PathBuf {
        if hash.len() < 2 {
            return self.files_dir.join(hash);
        }
        self.files_dir.join(&hash[..2]).join(hash)
    }

    pub fn exists(&self, hash: &str) -> bool {
        self.hash_to_path(hash).exists()
    }

    /// Copy `source` into the store under `hash`
    ///
    /// An existing entry with the same size is reused. An existing entry of a
    /// different size is a hash collision or a corrupted store and is never
    /// overwritten. The copy is written to a temporary name first and its size
    /// checked before the rename.
    pub fn import(&self, source: &Path, hash: &str, expected_size: u64) -> Result<StoreOutcome> {
        let path = self.hash_to_path(hash);

        if path.exists() {
            let existing = fs::metadata(&path)?.len();
            if existing != expected_size {
                return Err(Error::ContentIntegrity {
                    hash: hash.to_string(),
                    message: format!(
                        "same hash different size: stored {} bytes, expected {}",
                        existing, expected_size
                    ),
                });
            }
            debug!("Content already in store: {}", hash);
            return Ok(StoreOutcome::Deduplicated);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("tmp");
        let copied = fs::copy(source, &temp_path)?;
        if copied != expected_size {
            fs::remove_file(&temp_path)?;
            return Err(Error::ContentIntegrity {
                hash: hash.to_string(),
                message: format!(
                    "copied {} bytes from {}, expected {}",
                    copied,
                    source.display(),
                    expected_size
                ),
            });
        }
        fs::rename(&temp_path, &path)?;

        debug!("Stored {} as {} ({} bytes)", source.display(), hash, copied);
        Ok(StoreOutcome::Copied)
    }

    pub fn files_dir(&self) -> &Path {
        &self.files_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash;
    use tempfile::TempDir;

    fn source_file(dir: &TempDir, name: &str, content: &[u8]) -> (PathBuf, String) {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        (path, hash::sha1(content))
    }

    #[test]
    fn test_hash_to_path_layout() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("files")).unwrap();

        let path = store.hash_to_path("2aae6c35c94fcfb415dbe95f408b9ce91ee846ed");
        assert_eq!(
            path,
            dir.path()
                .join("files/2a/2aae6c35c94fcfb415dbe95f408b9ce91ee846ed")
        );
    }

    #[test]
    fn test_import_then_dedup() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let store = FileStore::new(out.path().join("files")).unwrap();

        let (a, hash_a) = source_file(&src, "a.png", b"same bytes");
        let (b, hash_b) = source_file(&src, "b.png", b"same bytes");
        assert_eq!(hash_a, hash_b);

        assert_eq!(store.import(&a, &hash_a, 10).unwrap(), StoreOutcome::Copied);
        assert_eq!(store.import(&b, &hash_b, 10).unwrap(), StoreOutcome::Deduplicated);

        let bucket = store.files_dir().join(&hash_a[..2]);
        assert_eq!(fs::read_dir(&bucket).unwrap().count(), 1);
        assert_eq!(fs::read(store.hash_to_path(&hash_a)).unwrap(), b"same bytes");
    }

    #[test]
    fn test_collision_with_different_size_fails() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let store = FileStore::new(out.path().join("files")).unwrap();

        let (a, hash_a) = source_file(&src, "a.txt", b"original");
        let target = store.hash_to_path(&hash_a);
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, b"something much longer than the original").unwrap();

        let err = store.import(&a, &hash_a, 8).unwrap_err();
        assert!(matches!(err, Error::ContentIntegrity { .. }));
        // never overwritten
        assert_eq!(
            fs::read(&target).unwrap(),
            b"something much longer than the original"
        );
    }

    #[test]
    fn test_short_copy_fails() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let store = FileStore::new(out.path().join("files")).unwrap();

        let (a, hash_a) = source_file(&src, "a.txt", b"1234");
        let err = store.import(&a, &hash_a, 99).unwrap_err();

        assert!(matches!(err, Error::ContentIntegrity { .. }));
        assert!(!store.exists(&hash_a));
    }
}
