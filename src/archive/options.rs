// src/archive/options.rs

//! Builder options: where an archive is created and how it is seeded

use crate::archive::builder::ArchiveBuilder;
use crate::archive::descriptor::{
    self, ComponentDescriptor, ComponentNameMapping, RepositoryContext,
};
use crate::archive::handle::ComponentArchive;
use crate::error::{Error, IoResultExt, Result};
use crate::filesystem::Filesystem;
use crate::filesystem::path::normalize_archive_path;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// What to do when the target directory already holds a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Fail with `AlreadyExists` and leave the archive untouched
    #[default]
    Fail,
    /// Open and return the existing archive without modifying it
    Reuse,
    /// Replace the descriptor; blobs are kept
    Overwrite,
}

impl ConflictPolicy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fail => "fail",
            Self::Reuse => "reuse",
            Self::Overwrite => "overwrite",
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "reuse" => Ok(Self::Reuse),
            "overwrite" => Ok(Self::Overwrite),
            other => Err(format!(
                "unknown conflict policy {:?} (expected fail, reuse or overwrite)",
                other
            )),
        }
    }
}

/// Parameters for creating a component archive
///
/// Everything except `archive_path` can also be loaded from a TOML file:
///
/// ```toml
/// component-name = "github.com/acme/widget"
/// component-version = "v1.0.0"
/// repository-context = "registry.example.com/components"
/// component-name-mapping = "urlPath"
/// on-conflict = "fail"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct BuilderOptions {
    /// Destination directory of the archive
    #[serde(skip)]
    pub archive_path: PathBuf,

    /// Component name written into the descriptor
    pub component_name: Option<String>,

    /// Component version written into the descriptor
    pub component_version: Option<String>,

    /// Base URL of an OCI registry added as repository context
    pub repository_context: Option<String>,

    /// Name mapping used by the repository context
    pub component_name_mapping: ComponentNameMapping,

    /// Behaviour when the target already holds a descriptor
    pub on_conflict: ConflictPolicy,
}

impl BuilderOptions {
    /// Options for an archive at `archive_path` with an empty descriptor
    pub fn new(archive_path: impl Into<PathBuf>) -> Self {
        Self {
            archive_path: archive_path.into(),
            ..Default::default()
        }
    }

    /// Seed the descriptor identity
    pub fn with_component(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.component_name = Some(name.into());
        self.component_version = Some(version.into());
        self
    }

    /// Add an OCI registry repository context
    pub fn with_repository_context(
        mut self,
        base_url: impl Into<String>,
        mapping: ComponentNameMapping,
    ) -> Self {
        self.repository_context = Some(base_url.into());
        self.component_name_mapping = mapping;
        self
    }

    /// Set the conflict policy
    pub fn with_on_conflict(mut self, policy: ConflictPolicy) -> Self {
        self.on_conflict = policy;
        self
    }

    /// Parse options from TOML
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::InvalidArgument(format!("invalid builder config: {}", e)))
    }

    /// Load options from a TOML config file
    pub fn from_file<F: Filesystem + ?Sized>(fs: &F, path: &Path) -> Result<Self> {
        let content = fs.read_file(path).at_path(path)?;
        let content = String::from_utf8(content).map_err(|e| {
            Error::InvalidArgument(format!("config {} is not UTF-8: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Component name, treating an empty string as unset
    pub fn name(&self) -> Option<&str> {
        self.component_name.as_deref().filter(|s| !s.is_empty())
    }

    /// Component version, treating an empty string as unset
    pub fn version(&self) -> Option<&str> {
        self.component_version.as_deref().filter(|s| !s.is_empty())
    }

    /// Validate the options without touching any filesystem
    ///
    /// Safe to call repeatedly.
    pub fn validate(&self) -> Result<()> {
        normalize_archive_path(&self.archive_path)?;

        if let Some(name) = self.name() {
            descriptor::validate_component_name(name)
                .map_err(|e| Error::InvalidArgument(e.to_string()))?;
            if self.version().is_none() {
                return Err(Error::InvalidArgument(
                    "a version has to be provided for a minimal component descriptor".to_string(),
                ));
            }
        }
        if let Some(version) = self.version() {
            descriptor::validate_version(version)
                .map_err(|e| Error::InvalidArgument(e.to_string()))?;
        }
        match &self.repository_context {
            Some(base_url) if base_url.trim().is_empty() => {
                return Err(Error::InvalidArgument(
                    "repository context base url must not be empty".to_string(),
                ));
            }
            None if self.component_name_mapping != ComponentNameMapping::default() => {
                return Err(Error::InvalidArgument(format!(
                    "component name mapping {} requires a repository context",
                    self.component_name_mapping
                )));
            }
            _ => {}
        }

        Ok(())
    }

    /// Normalized archive root
    pub fn archive_root(&self) -> Result<PathBuf> {
        normalize_archive_path(&self.archive_path)
    }

    /// Descriptor written into a freshly created archive
    pub fn seed_descriptor(&self) -> ComponentDescriptor {
        let mut descriptor =
            ComponentDescriptor::new(self.name().unwrap_or(""), self.version().unwrap_or(""));
        if let Some(base_url) = &self.repository_context {
            descriptor
                .component
                .repository_contexts
                .push(RepositoryContext::oci_registry(
                    base_url,
                    self.component_name_mapping,
                ));
        }
        descriptor
    }

    /// Create the archive described by these options
    pub fn build<F: Filesystem + ?Sized>(&self, fs: &F) -> Result<ComponentArchive> {
        ArchiveBuilder::new(self.clone()).build(fs)
    }
}
