// src/archive/builder.rs
//! Component archive builder
//!
//! Materializes a new archive on a [`Filesystem`]: validates the options,
//! creates the archive directory (including missing parents) and writes the
//! initial descriptor.
//!
//! The filesystem ends up in one of two states: nothing created, or a
//! directory holding a complete descriptor. The descriptor is written to a
//! temporary file and renamed into place; if that fails, the temporary file
//! and every directory created by this build are removed again.

use crate::archive::descriptor::DESCRIPTOR_FILE_NAME;
use crate::archive::handle::{self, ComponentArchive};
use crate::archive::options::{BuilderOptions, ConflictPolicy};
use crate::error::{Error, IoResultExt, Result};
use crate::filesystem::{FileKind, Filesystem};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Single-shot archive creation
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    options: BuilderOptions,
    cancel_token: Option<Arc<AtomicBool>>,
}

impl ArchiveBuilder {
    /// Create a new builder
    pub fn new(options: BuilderOptions) -> Self {
        Self {
            options,
            cancel_token: None,
        }
    }

    /// Abort with [`Error::Cancelled`] if the token is set when `build` starts
    ///
    /// The token is checked once, before any filesystem access.
    pub fn with_cancel_token(mut self, token: Arc<AtomicBool>) -> Self {
        self.cancel_token = Some(token);
        self
    }

    /// Create the archive
    ///
    /// Returns a handle to the archive rooted at the normalized archive path.
    pub fn build<F: Filesystem + ?Sized>(&self, fs: &F) -> Result<ComponentArchive> {
        self.options.validate()?;
        let root = self.options.archive_root()?;

        let descriptor = self.options.seed_descriptor();
        descriptor
            .validate()
            .map_err(|e| Error::InvalidArgument(e.to_string()))?;
        let yaml = descriptor
            .to_yaml()
            .map_err(|e| Error::InvalidArgument(format!("cannot serialize descriptor: {}", e)))?;

        if self
            .cancel_token
            .as_ref()
            .is_some_and(|token| token.load(Ordering::SeqCst))
        {
            return Err(Error::Cancelled);
        }

        let descriptor_path = root.join(DESCRIPTOR_FILE_NAME);
        let mut created = Vec::new();

        match fs.stat(&root).at_path(&root)? {
            Some(FileKind::Directory) => {
                if let Some(kind) = fs.stat(&descriptor_path).at_path(&descriptor_path)? {
                    match self.options.on_conflict {
                        ConflictPolicy::Fail => {
                            return Err(Error::already_exists(
                                &root,
                                format!("{} is already present", DESCRIPTOR_FILE_NAME),
                            ));
                        }
                        ConflictPolicy::Reuse => {
                            debug!("Reusing existing component archive at {}", root.display());
                            return ComponentArchive::open(fs, &root);
                        }
                        ConflictPolicy::Overwrite if !kind.is_file() => {
                            return Err(Error::already_exists(
                                &descriptor_path,
                                "descriptor path is not a regular file",
                            ));
                        }
                        ConflictPolicy::Overwrite => {
                            debug!("Overwriting descriptor at {}", descriptor_path.display());
                        }
                    }
                }
            }
            Some(_) => {
                return Err(Error::already_exists(
                    &root,
                    "path exists and is not a directory",
                ));
            }
            None => {
                created = missing_dirs(fs, &root)?;
                debug!(
                    "Creating component archive directory {} ({} new directories)",
                    root.display(),
                    created.len()
                );
                if let Err(e) = fs.create_dir_all(&root) {
                    remove_created(fs, &created);
                    return Err(Error::io(&root, e));
                }
            }
        }

        if let Err(e) = handle::write_atomic(fs, &descriptor_path, yaml.as_bytes()) {
            remove_created(fs, &created);
            return Err(e);
        }

        debug!("Wrote {}", descriptor_path.display());
        Ok(ComponentArchive::from_parts(root, descriptor))
    }
}

/// Directories between `root` and its nearest existing ancestor, deepest first
fn missing_dirs<F: Filesystem + ?Sized>(fs: &F, root: &Path) -> Result<Vec<PathBuf>> {
    let mut missing = Vec::new();
    let mut current = Some(root);

    while let Some(dir) = current {
        if dir.as_os_str().is_empty() || fs.stat(dir).at_path(dir)?.is_some() {
            break;
        }
        missing.push(dir.to_path_buf());
        current = dir.parent();
    }

    Ok(missing)
}

/// Best-effort removal of directories created by a failed build
fn remove_created<F: Filesystem + ?Sized>(fs: &F, created: &[PathBuf]) {
    for dir in created {
        if let Err(e) = fs.remove_dir(dir) {
            debug!("Could not remove {}: {}", dir.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::descriptor::ComponentDescriptor;
    use crate::error::ErrorKind;
    use crate::filesystem::MemFilesystem;
    use std::io;

    fn descriptor_at(fs: &MemFilesystem, root: &str) -> ComponentDescriptor {
        let bytes = fs
            .read_file(&Path::new(root).join(DESCRIPTOR_FILE_NAME))
            .unwrap();
        ComponentDescriptor::parse(&bytes).unwrap()
    }

    #[test]
    fn test_build_creates_directory_and_descriptor() {
        let fs = MemFilesystem::new();
        let archive = ArchiveBuilder::new(BuilderOptions::new("/tmp/empty-target"))
            .build(&fs)
            .unwrap();

        assert_eq!(archive.path(), Path::new("/tmp/empty-target"));
        assert_eq!(
            fs.read_dir(Path::new("/tmp/empty-target")).unwrap(),
            vec![DESCRIPTOR_FILE_NAME]
        );
        let descriptor = descriptor_at(&fs, "/tmp/empty-target");
        assert!(descriptor.is_empty());
        assert_eq!(&descriptor, archive.descriptor());
    }

    #[test]
    fn test_build_seeds_identity() {
        let fs = MemFilesystem::new();
        let options =
            BuilderOptions::new("/work/ca").with_component("example.com/widget", "v0.1.0");
        options.build(&fs).unwrap();

        let descriptor = descriptor_at(&fs, "/work/ca");
        assert_eq!(descriptor.component.name, "example.com/widget");
        assert_eq!(descriptor.component.version, "v0.1.0");
    }

    #[test]
    fn test_invalid_options_do_not_touch_fs() {
        let fs = MemFilesystem::new();
        let before = fs.snapshot();

        let err = BuilderOptions::new("").build(&fs).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = BuilderOptions::new("/work/ca")
            .with_component("Not A Name", "1.0.0")
            .build(&fs)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        assert_eq!(fs.snapshot(), before);
    }

    #[test]
    fn test_existing_descriptor_fails_without_mutation() {
        let fs = MemFilesystem::new();
        BuilderOptions::new("/ca").build(&fs).unwrap();
        let before = fs.snapshot();

        for _ in 0..2 {
            let err = BuilderOptions::new("/ca").build(&fs).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::AlreadyExists);
            assert_eq!(fs.snapshot(), before);
        }
    }

    #[test]
    fn test_reuse_returns_existing_archive() {
        let fs = MemFilesystem::new();
        BuilderOptions::new("/ca")
            .with_component("example.com/widget", "1.0.0")
            .build(&fs)
            .unwrap();
        let before = fs.snapshot();

        let archive = BuilderOptions::new("/ca")
            .with_on_conflict(ConflictPolicy::Reuse)
            .build(&fs)
            .unwrap();

        assert_eq!(archive.descriptor().component.name, "example.com/widget");
        assert_eq!(fs.snapshot(), before);
    }

    #[test]
    fn test_overwrite_replaces_descriptor_only() {
        let fs = MemFilesystem::new();
        BuilderOptions::new("/ca").build(&fs).unwrap();
        fs.create_dir_all(Path::new("/ca/blobs")).unwrap();
        fs.write_file(Path::new("/ca/blobs/data"), b"keep").unwrap();

        BuilderOptions::new("/ca")
            .with_component("example.com/widget", "2.0.0")
            .with_on_conflict(ConflictPolicy::Overwrite)
            .build(&fs)
            .unwrap();

        assert_eq!(descriptor_at(&fs, "/ca").component.version, "2.0.0");
        assert_eq!(fs.read_file(Path::new("/ca/blobs/data")).unwrap(), b"keep");
        assert_eq!(
            fs.read_dir(Path::new("/ca")).unwrap(),
            vec!["blobs", DESCRIPTOR_FILE_NAME]
        );
    }

    #[test]
    fn test_failed_overwrite_keeps_previous_descriptor() {
        let fs = MemFilesystem::new();
        BuilderOptions::new("/ca")
            .with_component("example.com/widget", "1.0.0")
            .build(&fs)
            .unwrap();
        let before = fs.snapshot();
        fs.set_write_fault(Some(io::ErrorKind::StorageFull));

        let err = BuilderOptions::new("/ca")
            .with_component("example.com/widget", "2.0.0")
            .with_on_conflict(ConflictPolicy::Overwrite)
            .build(&fs)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::IoFailure);
        assert_eq!(fs.snapshot(), before);
        assert_eq!(descriptor_at(&fs, "/ca").component.version, "1.0.0");
    }

    #[test]
    fn test_file_at_target_is_a_conflict() {
        let fs = MemFilesystem::new();
        fs.write_file(Path::new("/ca"), b"not a directory").unwrap();

        for policy in [ConflictPolicy::Fail, ConflictPolicy::Reuse, ConflictPolicy::Overwrite] {
            let err = BuilderOptions::new("/ca")
                .with_on_conflict(policy)
                .build(&fs)
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        }
        assert_eq!(fs.read_file(Path::new("/ca")).unwrap(), b"not a directory");
    }

    #[test]
    fn test_existing_directory_without_descriptor_is_used() {
        let fs = MemFilesystem::new();
        fs.create_dir_all(Path::new("/ca")).unwrap();
        fs.write_file(Path::new("/ca/README"), b"user data").unwrap();

        BuilderOptions::new("/ca").build(&fs).unwrap();

        assert_eq!(fs.read_file(Path::new("/ca/README")).unwrap(), b"user data");
        assert!(descriptor_at(&fs, "/ca").is_empty());
    }

    #[test]
    fn test_read_only_store_is_io_failure() {
        let fs = MemFilesystem::new();
        fs.set_read_only(true);

        let err = BuilderOptions::new("/a/b/ca").build(&fs).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
        assert!(fs.is_empty());
    }

    #[test]
    fn test_failed_write_removes_created_directories() {
        let fs = MemFilesystem::new();
        fs.create_dir_all(Path::new("/work")).unwrap();
        let before = fs.snapshot();
        fs.set_write_fault(Some(io::ErrorKind::StorageFull));

        let err = BuilderOptions::new("/work/a/b/ca").build(&fs).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
        assert_eq!(fs.snapshot(), before);

        fs.set_write_fault(None);
        BuilderOptions::new("/work/a/b/ca").build(&fs).unwrap();
        assert!(descriptor_at(&fs, "/work/a/b/ca").is_empty());
    }

    #[test]
    fn test_failed_write_keeps_preexisting_directory() {
        let fs = MemFilesystem::new();
        fs.create_dir_all(Path::new("/ca")).unwrap();
        fs.set_write_fault(Some(io::ErrorKind::PermissionDenied));

        let err = BuilderOptions::new("/ca").build(&fs).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
        assert!(fs.read_dir(Path::new("/ca")).unwrap().is_empty());
    }

    #[test]
    fn test_cancelled_before_start() {
        let fs = MemFilesystem::new();
        let token = Arc::new(AtomicBool::new(true));

        let err = ArchiveBuilder::new(BuilderOptions::new("/ca"))
            .with_cancel_token(token.clone())
            .build(&fs)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert!(fs.is_empty());

        token.store(false, Ordering::SeqCst);
        ArchiveBuilder::new(BuilderOptions::new("/ca"))
            .with_cancel_token(token)
            .build(&fs)
            .unwrap();
    }

    #[test]
    fn test_shared_filesystem_across_threads() {
        let fs = Arc::new(MemFilesystem::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let fs = Arc::clone(&fs);
                std::thread::spawn(move || {
                    BuilderOptions::new(format!("/archives/ca-{}", i))
                        .build(fs.as_ref())
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(fs.read_dir(Path::new("/archives")).unwrap().len(), 4);
    }
}
