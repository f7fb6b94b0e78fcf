// src/archive.rs

//! Course archive front-end
//!
//! edX exports arrive as `.tar.gz` files whose single top-level directory
//! holds `course/`, `chapter/`, `static/`... Moodle restores from `.mbz`
//! files, which are gzip-compressed tarballs of the backup directory.

use crate::error::{Error, Result};
use crate::filesystem::path::sanitize_path;
use crate::hash::{Hash, HashAlgorithm, hash_file};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tar::{Archive, Builder, EntryType};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Container formats accepted as input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Tar,
    TarGz,
}

impl ArchiveFormat {
    /// Detect from magic bytes (gzip: `1f 8b`), anything else is read as tar
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b {
            Self::TarGz
        } else {
            Self::Tar
        }
    }
}

/// Extract `archive` into `dest` and return the course root inside it
pub fn decompress(archive: &Path, dest: &Path) -> Result<PathBuf> {
    let mut file = File::open(archive)?;
    let mut magic = [0u8; 2];
    let read = file.read(&mut magic)?;
    file.seek(SeekFrom::Start(0))?;

    let format = ArchiveFormat::from_magic_bytes(&magic[..read]);
    debug!("Extracting {} ({:?}) into {}", archive.display(), format, dest.display());

    let reader: Box<dyn Read> = match format {
        ArchiveFormat::TarGz => Box::new(GzDecoder::new(BufReader::new(file))),
        ArchiveFormat::Tar => Box::new(BufReader::new(file)),
    };
    unpack(Archive::new(reader), dest)?;

    find_course_root(dest)
}

fn unpack<R: Read>(mut archive: Archive<R>, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest)?;

    for entry in archive.entries()? {
        let mut entry = entry?;
        let raw_path = entry.path()?.to_path_buf();

        // pax headers and the "./" entry carry nothing to extract
        let relative = match sanitize_path(&raw_path) {
            Ok(path) => path,
            Err(Error::InvalidPath(_)) => continue,
            Err(e) => return Err(e),
        };
        let target = dest.join(&relative);

        match entry.header().entry_type() {
            EntryType::Directory => fs::create_dir_all(&target)?,
            EntryType::Regular | EntryType::Continuous => {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                entry.unpack(&target)?;
            }
            EntryType::XGlobalHeader | EntryType::XHeader => {}
            other => {
                warn!("Skipping archive entry {} of type {:?}", raw_path.display(), other);
            }
        }
    }

    Ok(())
}

/// Locate the directory that holds the course tree
///
/// Either `dir` itself or one of its descendants (two levels at most, since
/// exports are wrapped in a single directory named after the course run).
pub fn find_course_root(dir: &Path) -> Result<PathBuf> {
    for entry in WalkDir::new(dir)
        .min_depth(0)
        .max_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_dir() {
            continue;
        }
        let candidate = entry.path();
        if candidate.join("course").is_dir() || candidate.join("course.xml").is_file() {
            return Ok(candidate.to_path_buf());
        }
    }

    Err(Error::missing("course root", dir))
}

/// Pack a backup directory into a `.mbz` file
///
/// Returns the SHA-256 of the written archive.
pub fn pack_mbz(backup_dir: &Path, mbz_path: &Path) -> Result<Hash> {
    let file = File::create(mbz_path)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = Builder::new(encoder);

    for entry in WalkDir::new(backup_dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        let relative = entry
            .path()
            .strip_prefix(backup_dir)
            .map_err(|e| Error::InvalidPath(e.to_string()))?;

        if entry.file_type().is_dir() {
            builder.append_dir(relative, entry.path())?;
        } else if entry.file_type().is_file() {
            builder.append_path_with_name(entry.path(), relative)?;
        }
    }

    builder.into_inner()?.finish()?;

    let (checksum, size) = hash_file(HashAlgorithm::Sha256, mbz_path)?;
    debug!(
        "Packed {} into {} ({} bytes, sha256 {})",
        backup_dir.display(),
        mbz_path.display(),
        size,
        checksum
    );
    Ok(checksum)
}
