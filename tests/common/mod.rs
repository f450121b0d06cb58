// tests/common/mod.rs

//! Shared helpers for component archive integration tests.

use std::fs;
use std::path::{Path, PathBuf};

/// Every file below `root` with its content, relative to `root`.
///
/// Directories are listed with `None` so that empty ones are compared too.
pub fn tree(root: &Path) -> Vec<(PathBuf, Option<Vec<u8>>)> {
    let mut entries = Vec::new();
    collect(root, root, &mut entries);
    entries.sort();
    entries
}

fn collect(root: &Path, dir: &Path, entries: &mut Vec<(PathBuf, Option<Vec<u8>>)>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        let rel = path.strip_prefix(root).unwrap().to_path_buf();
        if path.is_dir() {
            entries.push((rel, None));
            collect(root, &path, entries);
        } else {
            entries.push((rel, Some(fs::read(&path).unwrap())));
        }
    }
}
