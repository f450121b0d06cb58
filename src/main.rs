// src/main.rs

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Create {
            archive_path,
            component_name,
            component_version,
            repo_ctx,
            component_name_mapping,
            on_conflict,
            overwrite,
            config,
        } => commands::cmd_create(commands::CreateArgs {
            archive_path,
            component_name,
            component_version,
            repo_ctx,
            component_name_mapping,
            on_conflict,
            overwrite,
            config,
        }),
    }
}
