// src/filesystem/path.rs

//! Path sanitization for untrusted archive content
//!
//! Both tar entry names and `/static/...` references inside course HTML come
//! from the imported archive. Neither may resolve outside the directory it is
//! meant to live in.

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Normalize an untrusted relative path
///
/// Leading slashes and `.` components are dropped. Any `..` component is
/// rejected, as is a path that normalizes to nothing.
///
/// # Examples
///
/// ```
/// use olx_convert::filesystem::path::sanitize_path;
/// use std::path::PathBuf;
///
/// assert_eq!(sanitize_path("/static/img/a.png").unwrap(), PathBuf::from("static/img/a.png"));
/// assert!(sanitize_path("static/../../etc/passwd").is_err());
/// ```
pub fn sanitize_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy();
    let relative = path_str.trim_start_matches('/');

    let mut normalized = PathBuf::new();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(c) => normalized.push(c),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(Error::PathTraversal(path_str.to_string()));
            }
            Component::Prefix(_) | Component::RootDir => {}
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(Error::InvalidPath(format!("empty path: {:?}", path_str)));
    }

    Ok(normalized)
}

/// Join an untrusted path under `root`
pub fn safe_join(root: impl AsRef<Path>, path: impl AsRef<Path>) -> Result<PathBuf> {
    let root = root.as_ref();
    let joined = root.join(sanitize_path(path.as_ref())?);

    // Symlinks inside an extracted archive could still point outside
    if let (Ok(canonical_root), Ok(canonical_joined)) =
        (root.canonicalize(), joined.canonicalize())
        && !canonical_joined.starts_with(&canonical_root)
    {
        return Err(Error::PathTraversal(format!(
            "{} escapes {}",
            joined.display(),
            root.display()
        )));
    }

    Ok(joined)
}
