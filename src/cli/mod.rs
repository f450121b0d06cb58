// src/cli/mod.rs
//! CLI definitions for the component archive tool
//!
//! Argument parsing only; the command implementations live in the
//! `commands` module.

use clap::{Parser, Subcommand};
use component_archive::ConflictPolicy;
use component_archive::archive::ComponentNameMapping;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "component-archive")]
#[command(version)]
#[command(about = "Create component archives with a component descriptor", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new component archive
    ///
    /// The archive is a directory with a component-descriptor.yaml. Missing
    /// parent directories are created. An existing descriptor is never
    /// replaced unless --on-conflict says so.
    Create {
        /// Directory to create the archive in
        archive_path: PathBuf,

        /// Component name (e.g. github.com/acme/widget)
        #[arg(long)]
        component_name: Option<String>,

        /// Component version (semver, optional leading "v")
        #[arg(long)]
        component_version: Option<String>,

        /// Base URL of the OCI registry repository context
        #[arg(long)]
        repo_ctx: Option<String>,

        /// Name mapping of the repository context: urlPath or sha256-digest
        #[arg(long)]
        component_name_mapping: Option<ComponentNameMapping>,

        /// Behaviour if the archive already has a descriptor: fail, reuse or overwrite
        #[arg(long, conflicts_with = "overwrite")]
        on_conflict: Option<ConflictPolicy>,

        /// Replace an existing descriptor (same as --on-conflict overwrite)
        #[arg(short = 'w', long)]
        overwrite: bool,

        /// TOML file with default builder options
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
