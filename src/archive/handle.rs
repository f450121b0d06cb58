// src/archive/handle.rs

//! Handle to a component archive on a filesystem
//!
//! A [`ComponentArchive`] is returned by the builder and by
//! [`ComponentArchive::open`]. It remembers the archive root and the
//! descriptor as last read or written; the filesystem is passed in per call.

use crate::archive::descriptor::{
    Access, BLOBS_DIR, ComponentDescriptor, DESCRIPTOR_FILE_NAME, Resource, ResourceRelation,
};
use crate::error::{Error, IoResultExt, Result};
use crate::filesystem::path::{normalize_archive_path, sanitize_filename};
use crate::filesystem::{FileKind, Filesystem};
use crate::hash::Digest;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A component archive rooted at a directory
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentArchive {
    root: PathBuf,
    descriptor: ComponentDescriptor,
}

impl ComponentArchive {
    pub(crate) fn from_parts(root: PathBuf, descriptor: ComponentDescriptor) -> Self {
        Self { root, descriptor }
    }

    /// Open an existing archive and validate its descriptor
    pub fn open<F: Filesystem + ?Sized>(fs: &F, root: impl AsRef<Path>) -> Result<Self> {
        let root = normalize_archive_path(root)?;
        let descriptor_path = root.join(DESCRIPTOR_FILE_NAME);

        let content = fs.read_file(&descriptor_path).at_path(&descriptor_path)?;
        let descriptor = ComponentDescriptor::parse(&content)
            .map_err(|e| Error::invalid_descriptor(&descriptor_path, e))?;

        debug!("Opened component archive at {}", root.display());
        Ok(Self { root, descriptor })
    }

    /// Archive root directory
    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn descriptor(&self) -> &ComponentDescriptor {
        &self.descriptor
    }

    /// Mutable descriptor; call [`ComponentArchive::save`] to persist changes
    pub fn descriptor_mut(&mut self) -> &mut ComponentDescriptor {
        &mut self.descriptor
    }

    pub fn descriptor_path(&self) -> PathBuf {
        self.root.join(DESCRIPTOR_FILE_NAME)
    }

    pub fn blobs_dir(&self) -> PathBuf {
        self.root.join(BLOBS_DIR)
    }

    /// Validate and atomically rewrite the descriptor
    pub fn save<F: Filesystem + ?Sized>(&self, fs: &F) -> Result<()> {
        let path = self.descriptor_path();
        self.descriptor
            .validate()
            .map_err(|e| Error::invalid_descriptor(&path, e))?;
        let yaml = self
            .descriptor
            .to_yaml()
            .map_err(|e| Error::invalid_descriptor(&path, e))?;
        write_atomic(fs, &path, yaml.as_bytes())?;
        debug!("Saved {}", path.display());
        Ok(())
    }

    /// Store content under `blobs/` and return an access pointing at it
    ///
    /// Blobs are named by digest, so storing the same content twice is a no-op.
    pub fn add_blob<F: Filesystem + ?Sized>(
        &self,
        fs: &F,
        data: &[u8],
        media_type: Option<&str>,
    ) -> Result<Access> {
        let digest = Digest::of(data);
        let filename = digest.filename();
        let blobs_dir = self.blobs_dir();
        let blob_path = blobs_dir.join(&filename);

        if fs.stat(&blob_path).at_path(&blob_path)? == Some(FileKind::File) {
            debug!("Blob already in archive: {}", digest);
        } else {
            fs.create_dir_all(&blobs_dir).at_path(&blobs_dir)?;
            write_atomic(fs, &blob_path, data)?;
            debug!("Stored blob {} ({} bytes)", digest, data.len());
        }

        Ok(Access::local_blob(&filename, media_type))
    }

    /// Read a blob by filename, verifying digest-named blobs
    pub fn read_blob<F: Filesystem + ?Sized>(&self, fs: &F, filename: &str) -> Result<Vec<u8>> {
        let filename = sanitize_filename(filename)?;
        let path = self.blobs_dir().join(filename);
        let content = fs.read_file(&path).at_path(&path)?;

        if let Ok(expected) = Digest::from_filename(filename) {
            let actual = Digest::of(&content);
            if actual != expected {
                return Err(Error::io(
                    &path,
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("digest mismatch: expected {}, got {}", expected, actual),
                    ),
                ));
            }
        }

        Ok(content)
    }

    /// Store `data` as a local blob and record `resource` pointing at it
    ///
    /// The descriptor is validated before anything is written and persisted
    /// afterwards.
    pub fn add_resource<F: Filesystem + ?Sized>(
        &mut self,
        fs: &F,
        mut resource: Resource,
        data: &[u8],
        media_type: Option<&str>,
    ) -> Result<()> {
        resource.relation = ResourceRelation::Local;
        resource.access = Some(Access::local_blob(
            &Digest::of(data).filename(),
            media_type,
        ));

        let mut candidate = self.descriptor.clone();
        candidate.component.resources.push(resource);
        candidate
            .validate()
            .map_err(|e| Error::InvalidArgument(e.to_string()))?;

        self.add_blob(fs, data, media_type)?;
        let previous = std::mem::replace(&mut self.descriptor, candidate);
        if let Err(e) = self.save(fs) {
            self.descriptor = previous;
            return Err(e);
        }
        Ok(())
    }
}

/// Write `data` next to `path` and rename it into place
///
/// On failure the temporary file is removed (best effort) and the error is
/// reported against the path that failed.
pub(crate) fn write_atomic<F: Filesystem + ?Sized>(fs: &F, path: &Path, data: &[u8]) -> Result<()> {
    let name = path
        .file_name()
        .ok_or_else(|| Error::InvalidArgument(format!("no file name in {}", path.display())))?;
    let temp_path = path.with_file_name(format!(".{}.tmp", name.to_string_lossy()));

    let result = fs
        .write_file(&temp_path, data)
        .at_path(&temp_path)
        .and_then(|()| fs.rename(&temp_path, path).at_path(path));

    if result.is_err() && fs.remove_file(&temp_path).is_ok() {
        debug!("Removed {}", temp_path.display());
    }
    result
}
