// src/commands/create.rs

//! `create` command: build a new component archive on the host filesystem

use anyhow::{Context, Result};
use component_archive::archive::ComponentNameMapping;
use component_archive::{BuilderOptions, ConflictPolicy, OsFilesystem};
use std::path::PathBuf;
use tracing::info;

/// Arguments of `component-archive create`
#[derive(Debug, Default)]
pub struct CreateArgs {
    pub archive_path: PathBuf,
    pub component_name: Option<String>,
    pub component_version: Option<String>,
    pub repo_ctx: Option<String>,
    pub component_name_mapping: Option<ComponentNameMapping>,
    pub on_conflict: Option<ConflictPolicy>,
    pub overwrite: bool,
    pub config: Option<PathBuf>,
}

impl CreateArgs {
    /// Merge config file defaults with command line values
    ///
    /// Flags given on the command line win over the config file.
    pub fn into_options(self, fs: &OsFilesystem) -> Result<BuilderOptions> {
        let mut options = match &self.config {
            Some(path) => BuilderOptions::from_file(fs, path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => BuilderOptions::default(),
        };

        options.archive_path = self.archive_path;
        if self.component_name.is_some() {
            options.component_name = self.component_name;
        }
        if self.component_version.is_some() {
            options.component_version = self.component_version;
        }
        if self.repo_ctx.is_some() {
            options.repository_context = self.repo_ctx;
        }
        if let Some(mapping) = self.component_name_mapping {
            options.component_name_mapping = mapping;
        }
        if self.overwrite {
            options.on_conflict = ConflictPolicy::Overwrite;
        } else if let Some(policy) = self.on_conflict {
            options.on_conflict = policy;
        }

        Ok(options)
    }
}

/// Create a component archive
pub fn cmd_create(args: CreateArgs) -> Result<()> {
    let fs = OsFilesystem::new();
    let options = args.into_options(&fs)?;
    options.validate()?;

    info!(
        "Creating component archive at {} (on conflict: {})",
        options.archive_path.display(),
        options.on_conflict
    );

    let archive = options.build(&fs).with_context(|| {
        format!(
            "Unable to create component archive at {}",
            options.archive_path.display()
        )
    })?;

    let component = &archive.descriptor().component;
    if !component.name.is_empty() {
        info!("Component {}:{}", component.name, component.version);
    }

    println!(
        "Successfully created component archive at {}",
        archive.path().display()
    );
    Ok(())
}
