// src/filesystem/path.rs

//! Path validation for archive locations and archive entries
//!
//! Archive paths come from the command line or config files, so they are
//! checked and normalized before any filesystem mutation happens.

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Validate and lexically normalize a component archive path
///
/// This function:
/// 1. Rejects empty or whitespace-only paths and paths containing NUL bytes
/// 2. Drops `.` components and trailing separators
/// 3. Folds `dir/..` pairs (a leading `..` on a relative path is kept)
/// 4. Rejects paths that resolve to the filesystem root
///
/// A path that folds away entirely (for example `.`) becomes `.`.
///
/// # Examples
///
/// ```
/// use component_archive::filesystem::path::normalize_archive_path;
/// use std::path::PathBuf;
///
/// assert_eq!(
///     normalize_archive_path("/tmp/./out/").unwrap(),
///     PathBuf::from("/tmp/out")
/// );
/// assert_eq!(
///     normalize_archive_path("build/x/../archive").unwrap(),
///     PathBuf::from("build/archive")
/// );
/// assert!(normalize_archive_path("").is_err());
/// assert!(normalize_archive_path("/").is_err());
/// ```
pub fn normalize_archive_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let raw = path.to_string_lossy();

    if raw.trim().is_empty() {
        return Err(Error::InvalidArgument(
            "a component archive path must be defined".to_string(),
        ));
    }
    if raw.contains('\0') {
        return Err(Error::InvalidArgument(format!(
            "component archive path contains a NUL byte: {:?}",
            raw
        )));
    }

    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                // "/.." is "/"
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            Component::Normal(c) => normalized.push(c),
        }
    }

    if normalized.as_os_str().is_empty() {
        return Ok(PathBuf::from("."));
    }
    if normalized.has_root() && normalized.parent().is_none() {
        return Err(Error::InvalidArgument(format!(
            "component archive path must not be the filesystem root: {}",
            path.display()
        )));
    }

    Ok(normalized)
}

/// Validate a single entry name inside an archive (e.g. a blob filename)
///
/// Rejects path separators, `.`/`..`, and empty names.
///
/// # Examples
///
/// ```
/// use component_archive::filesystem::path::sanitize_filename;
///
/// assert_eq!(sanitize_filename("sha256.abc").unwrap(), "sha256.abc");
/// assert!(sanitize_filename("../descriptor").is_err());
/// assert!(sanitize_filename("blobs/x").is_err());
/// ```
pub fn sanitize_filename(name: &str) -> Result<&str> {
    if name.is_empty() {
        return Err(Error::InvalidArgument("empty archive entry name".to_string()));
    }
    if name.contains('/') || name.contains('\\') || name.contains('\0') {
        return Err(Error::InvalidArgument(format!(
            "archive entry name contains a path separator: {}",
            name
        )));
    }
    if name == ".." || name == "." {
        return Err(Error::InvalidArgument(format!(
            "invalid archive entry name: {}",
            name
        )));
    }
    Ok(name)
}
