// src/archive/mod.rs

//! Component archives
//!
//! A component archive is a directory holding a `component-descriptor.yaml`
//! and, optionally, a `blobs/` directory with content-addressed resources:
//!
//! ```text
//! <archive>/
//! ├── component-descriptor.yaml
//! └── blobs/
//!     └── sha256.<hex>
//! ```
//!
//! [`BuilderOptions`] describes the archive to create, [`ArchiveBuilder`]
//! materializes it on a [`Filesystem`](crate::filesystem::Filesystem), and
//! [`ComponentArchive`] is the handle returned for further work.

pub mod builder;
pub mod descriptor;
pub mod handle;
pub mod options;

pub use builder::ArchiveBuilder;
pub use descriptor::{
    Access, ComponentDescriptor, ComponentNameMapping, DescriptorError, Resource,
    ResourceRelation, BLOBS_DIR, DESCRIPTOR_FILE_NAME,
};
pub use handle::ComponentArchive;
pub use options::{BuilderOptions, ConflictPolicy};
