// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

fn build_cli() -> Command {
    Command::new("component-archive")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Create component archives with a component descriptor")
        .subcommand_required(true)
        .subcommand(
            Command::new("create")
                .about("Create a new component archive")
                .arg(
                    Arg::new("archive_path")
                        .required(true)
                        .value_name("ARCHIVE_PATH")
                        .help("Directory to create the archive in"),
                )
                .arg(
                    Arg::new("component_name")
                        .long("component-name")
                        .help("Component name (e.g. github.com/acme/widget)"),
                )
                .arg(
                    Arg::new("component_version")
                        .long("component-version")
                        .help("Component version (semver, optional leading \"v\")"),
                )
                .arg(
                    Arg::new("repo_ctx")
                        .long("repo-ctx")
                        .help("Base URL of the OCI registry repository context"),
                )
                .arg(
                    Arg::new("component_name_mapping")
                        .long("component-name-mapping")
                        .value_parser(["urlPath", "sha256-digest"])
                        .help("Name mapping of the repository context"),
                )
                .arg(
                    Arg::new("on_conflict")
                        .long("on-conflict")
                        .value_parser(["fail", "reuse", "overwrite"])
                        .help("Behaviour if the archive already has a descriptor"),
                )
                .arg(
                    Arg::new("overwrite")
                        .short('w')
                        .long("overwrite")
                        .action(ArgAction::SetTrue)
                        .help("Replace an existing descriptor"),
                )
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .value_name("FILE")
                        .help("TOML file with default builder options"),
                ),
        )
}

fn render(cmd: Command, path: &Path) -> Result<(), String> {
    let mut buffer = Vec::new();
    Man::new(cmd)
        .render(&mut buffer)
        .map_err(|e| format!("Failed to render man page: {}", e))?;
    fs::write(path, buffer).map_err(|e| format!("Failed to write man page: {}", e))
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = match env::var("OUT_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=OUT_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = out_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let cmd = build_cli();
    let create = cmd
        .find_subcommand("create")
        .cloned()
        .map(|sub| sub.name("component-archive-create"));

    if let Err(e) = render(cmd, &man_dir.join("component-archive.1")) {
        println!("cargo:warning={}", e);
        return;
    }
    if let Some(create) = create
        && let Err(e) = render(create, &man_dir.join("component-archive-create.1"))
    {
        println!("cargo:warning={}", e);
    }
}
