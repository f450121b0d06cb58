// src/commands/mod.rs
//! Command handlers for the component archive CLI

mod create;

pub use create::{CreateArgs, cmd_create};
