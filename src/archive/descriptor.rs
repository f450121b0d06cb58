// src/archive/descriptor.rs
//! Component descriptor (component-descriptor.yaml) data structures
//!
//! This module defines the v2 component descriptor schema and provides
//! parsing from and serialization to YAML.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// Well-known descriptor filename at the archive root
pub const DESCRIPTOR_FILE_NAME: &str = "component-descriptor.yaml";

/// Directory holding content blobs inside an archive
pub const BLOBS_DIR: &str = "blobs";

/// Descriptor schema version written by this crate
pub const SCHEMA_VERSION: &str = "v2";

/// Repository context type for OCI registries
pub const OCI_REGISTRY_TYPE: &str = "ociRegistry";

/// Access type for blobs stored inside the archive
pub const LOCAL_FILESYSTEM_BLOB_TYPE: &str = "localFilesystemBlob";

static COMPONENT_NAME_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^[a-z0-9.\-]+[.][a-z]{2,4}/[-a-z0-9/_.]*$").unwrap()
});

#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("Failed to parse descriptor: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid descriptor: {0}")]
    Invalid(String),
}

/// Root structure of component-descriptor.yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    pub meta: Meta,
    pub component: Component,
}

impl ComponentDescriptor {
    /// Descriptor shell with empty identity and no entries
    pub fn empty() -> Self {
        Self::new("", "")
    }

    /// Descriptor for the given identity with no entries
    pub fn new(name: &str, version: &str) -> Self {
        ComponentDescriptor {
            meta: Meta {
                schema_version: SCHEMA_VERSION.to_string(),
            },
            component: Component {
                name: name.to_string(),
                version: version.to_string(),
                repository_contexts: Vec::new(),
                provider: Provider::Internal,
                sources: Vec::new(),
                component_references: Vec::new(),
                resources: Vec::new(),
                labels: Vec::new(),
            },
        }
    }

    /// Parse a descriptor from YAML bytes and validate it
    pub fn parse(content: &[u8]) -> Result<Self, DescriptorError> {
        let descriptor: ComponentDescriptor = serde_yaml::from_slice(content)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// True when the descriptor carries no identity and no entries
    pub fn is_empty(&self) -> bool {
        let c = &self.component;
        c.name.is_empty()
            && c.version.is_empty()
            && c.sources.is_empty()
            && c.component_references.is_empty()
            && c.resources.is_empty()
    }

    /// Validate schema version, identity and entry uniqueness
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.meta.schema_version != SCHEMA_VERSION {
            return Err(DescriptorError::Invalid(format!(
                "unsupported schema version {:?}, expected {:?}",
                self.meta.schema_version, SCHEMA_VERSION
            )));
        }

        let component = &self.component;
        if !component.name.is_empty() {
            validate_component_name(&component.name)?;
        }
        if !component.version.is_empty() {
            validate_version(&component.version)?;
        }

        for ctx in &component.repository_contexts {
            if ctx.base_url.trim().is_empty() {
                return Err(DescriptorError::MissingField(
                    "component.repositoryContexts[].baseUrl".to_string(),
                ));
            }
        }

        check_unique(
            "resource",
            component.resources.iter().map(|r| (&r.name, &r.version, &r.resource_type)),
        )?;
        check_unique(
            "source",
            component.sources.iter().map(|s| (&s.name, &s.version, &s.source_type)),
        )?;

        let mut seen = HashSet::new();
        for reference in &component.component_references {
            if reference.name.is_empty() {
                return Err(DescriptorError::MissingField(
                    "component.componentReferences[].name".to_string(),
                ));
            }
            validate_component_name(&reference.component_name)?;
            validate_version(&reference.version)?;
            if !seen.insert((&reference.name, &reference.version)) {
                return Err(DescriptorError::Invalid(format!(
                    "duplicate component reference {}:{}",
                    reference.name, reference.version
                )));
            }
        }

        Ok(())
    }
}

fn check_unique<'a>(
    what: &str,
    entries: impl Iterator<Item = (&'a String, &'a String, &'a String)>,
) -> Result<(), DescriptorError> {
    let mut seen = HashSet::new();
    for (name, version, entry_type) in entries {
        if name.is_empty() {
            return Err(DescriptorError::MissingField(format!("{}.name", what)));
        }
        if entry_type.is_empty() {
            return Err(DescriptorError::MissingField(format!("{}.type", what)));
        }
        if !seen.insert((name, version)) {
            return Err(DescriptorError::Invalid(format!(
                "duplicate {} {}:{}",
                what, name, version
            )));
        }
    }
    Ok(())
}

/// Check a component name such as `github.com/acme/widget`
pub fn validate_component_name(name: &str) -> Result<(), DescriptorError> {
    if COMPONENT_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(DescriptorError::Invalid(format!(
            "component name {:?} does not match {}",
            name,
            COMPONENT_NAME_RE.as_str()
        )))
    }
}

/// Check a semantic version, optionally prefixed with `v`
pub fn validate_version(version: &str) -> Result<(), DescriptorError> {
    let bare = version.strip_prefix('v').unwrap_or(version);
    semver::Version::parse(bare)
        .map(|_| ())
        .map_err(|e| DescriptorError::Invalid(format!("invalid version {:?}: {}", version, e)))
}

/// Descriptor metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub schema_version: String,
}

/// Component identity and the entries it references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub name: String,
    pub version: String,

    #[serde(default)]
    pub repository_contexts: Vec<RepositoryContext>,

    #[serde(default)]
    pub provider: Provider,

    #[serde(default)]
    pub sources: Vec<Source>,

    #[serde(default)]
    pub component_references: Vec<ComponentReference>,

    #[serde(default)]
    pub resources: Vec<Resource>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
}

/// Who provides the component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Internal,
    External,
}

/// Where the component is (or will be) published
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryContext {
    #[serde(rename = "type")]
    pub context_type: String,

    pub base_url: String,

    #[serde(default)]
    pub component_name_mapping: ComponentNameMapping,
}

impl RepositoryContext {
    /// OCI registry context for the given base URL
    pub fn oci_registry(base_url: &str, mapping: ComponentNameMapping) -> Self {
        Self {
            context_type: OCI_REGISTRY_TYPE.to_string(),
            base_url: base_url.to_string(),
            component_name_mapping: mapping,
        }
    }
}

/// How component names map onto OCI repository paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ComponentNameMapping {
    #[default]
    #[serde(rename = "urlPath")]
    UrlPath,
    #[serde(rename = "sha256-digest")]
    Sha256Digest,
}

impl ComponentNameMapping {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UrlPath => "urlPath",
            Self::Sha256Digest => "sha256-digest",
        }
    }
}

impl fmt::Display for ComponentNameMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentNameMapping {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "urlPath" => Ok(Self::UrlPath),
            "sha256-digest" => Ok(Self::Sha256Digest),
            other => Err(DescriptorError::Invalid(format!(
                "unknown component name mapping method {:?}",
                other
            ))),
        }
    }
}

/// Source code the component was built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,

    #[serde(default)]
    pub version: String,

    #[serde(rename = "type")]
    pub source_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<Access>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
}

/// Dependency on another component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentReference {
    pub name: String,
    pub component_name: String,
    pub version: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
}

/// Artifact delivered with the component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,

    #[serde(default)]
    pub version: String,

    #[serde(rename = "type")]
    pub resource_type: String,

    #[serde(default)]
    pub relation: ResourceRelation,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<Access>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
}

impl Resource {
    pub fn new(name: &str, version: &str, resource_type: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            resource_type: resource_type.to_string(),
            relation: ResourceRelation::Local,
            access: None,
            labels: Vec::new(),
        }
    }
}

/// Whether a resource is built with the component or consumed from elsewhere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceRelation {
    #[default]
    Local,
    External,
}

/// Typed access specification; fields beyond `type` depend on the type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Access {
    #[serde(rename = "type")]
    pub access_type: String,

    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_yaml::Value>,
}

impl Access {
    /// Access to a blob stored under `blobs/` in the same archive
    pub fn local_blob(filename: &str, media_type: Option<&str>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(
            "filename".to_string(),
            serde_yaml::Value::String(filename.to_string()),
        );
        if let Some(media_type) = media_type {
            fields.insert(
                "mediaType".to_string(),
                serde_yaml::Value::String(media_type.to_string()),
            );
        }
        Self {
            access_type: LOCAL_FILESYSTEM_BLOB_TYPE.to_string(),
            fields,
        }
    }

    /// String field lookup
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_str())
    }
}

/// Free-form key/value annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub value: serde_yaml::Value,
}
