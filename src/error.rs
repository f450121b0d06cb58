// src/error.rs

//! Error types for component archive operations
//!
//! Every failure is returned to the immediate caller as an [`Error`]. Callers
//! that need to react differently per failure class (for example treating
//! an existing archive as a no-op) should match on [`Error::kind`].

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while building or opening a component archive
#[derive(Error, Debug)]
pub enum Error {
    /// Caller supplied a bad path or malformed options
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Target already holds a conflicting archive (or is not a directory)
    #[error("Component archive already exists at {}: {reason}", path.display())]
    AlreadyExists { path: PathBuf, reason: String },

    /// Underlying filesystem operation failed
    #[error("I/O failure at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Descriptor on disk could not be parsed or is not schema-valid
    #[error("Invalid component descriptor at {}: {reason}", path.display())]
    InvalidDescriptor { path: PathBuf, reason: String },

    /// The cancellation token was set before the operation started
    #[error("Operation cancelled before it started")]
    Cancelled,
}

/// Failure class of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    AlreadyExists,
    IoFailure,
    InvalidDescriptor,
    Cancelled,
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::Io { .. } => ErrorKind::IoFailure,
            Self::InvalidDescriptor { .. } => ErrorKind::InvalidDescriptor,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Wrap an I/O error with the path it occurred at
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn already_exists(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::AlreadyExists {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_descriptor(path: impl AsRef<Path>, reason: impl fmt::Display) -> Self {
        Self::InvalidDescriptor {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Attach a path to a raw `io::Result`
pub(crate) trait IoResultExt<T> {
    fn at_path(self, path: &Path) -> Result<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn at_path(self, path: &Path) -> Result<T> {
        self.map_err(|e| Error::io(path, e))
    }
}
