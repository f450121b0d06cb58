// src/lib.rs

//! Component archive builder
//!
//! Creates component archives: directories that hold a component descriptor
//! (`component-descriptor.yaml`) and the local blobs it references.
//!
//! # Architecture
//!
//! - Filesystem abstraction: every operation runs against a [`Filesystem`],
//!   either the host OS or an in-memory tree for tests
//! - No silent overwrites: an existing descriptor fails the build unless the
//!   caller picks a [`ConflictPolicy`]
//! - Atomic writes: descriptors and blobs are written to a temporary sibling
//!   and renamed into place
//! - Rollback: directories created by a failed build are removed again
//!
//! ```
//! use component_archive::{BuilderOptions, MemFilesystem};
//!
//! let fs = MemFilesystem::new();
//! let archive = BuilderOptions::new("/tmp/empty-target").build(&fs).unwrap();
//! assert!(archive.descriptor().is_empty());
//! ```

pub mod archive;
mod error;
pub mod filesystem;
pub mod hash;

pub use archive::{
    ArchiveBuilder, BuilderOptions, ComponentArchive, ComponentDescriptor, ConflictPolicy,
};
pub use error::{Error, ErrorKind, Result};
pub use filesystem::{FileKind, Filesystem, MemFilesystem, OsFilesystem};
pub use hash::Digest;
