// src/filesystem/mod.rs

//! Filesystem capability used by the archive builder
//!
//! This module provides:
//! - The [`Filesystem`] trait, the narrow set of path-based operations the
//!   builder needs (stat, create directory, write/read/rename/remove)
//! - [`OsFilesystem`], backed by `std::fs`
//! - [`MemFilesystem`], an in-memory tree for tests and dry runs
//! - Archive path normalization
//!
//! Both backends report failures as `std::io::Error` with the same
//! `io::ErrorKind`s, so callers observe identical semantics.

pub mod memory;
mod os;
pub mod path;

use std::io;
use std::path::Path;

pub use memory::MemFilesystem;
pub use os::OsFilesystem;

/// Kind of filesystem entry reported by [`Filesystem::stat`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Directory,
    File,
    /// Anything else (sockets, devices, dangling links)
    Other,
}

impl FileKind {
    #[inline]
    pub fn is_file(self) -> bool {
        matches!(self, Self::File)
    }
}

/// Path-based I/O capability
///
/// Implementations must be shareable across threads; the builder only ever
/// holds a shared reference.
pub trait Filesystem: Send + Sync {
    /// Report what exists at `path`, or `None` if nothing does
    fn stat(&self, path: &Path) -> io::Result<Option<FileKind>>;

    /// Create a directory and all missing parents
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Write a whole file, replacing any existing file at `path`
    ///
    /// The parent directory must already exist.
    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    /// Read a whole file
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// List entry names of a directory, sorted
    fn read_dir(&self, path: &Path) -> io::Result<Vec<String>>;

    /// Rename `from` to `to`, replacing a file at `to`
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Remove a file
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Remove an empty directory
    fn remove_dir(&self, path: &Path) -> io::Result<()>;

    /// Check whether anything exists at `path`
    fn exists(&self, path: &Path) -> io::Result<bool> {
        Ok(self.stat(path)?.is_some())
    }
}
