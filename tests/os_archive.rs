// tests/os_archive.rs

//! Integration tests for component archive creation on the host filesystem.
//!
//! These tests verify that:
//! 1. A fresh target gets a directory with a descriptor and nothing else
//! 2. Bad options are rejected before anything is written
//! 3. An existing archive is never modified unless the caller opts in
//! 4. Archives can be reopened and extended with blobs and resources

mod common;

use component_archive::archive::{DESCRIPTOR_FILE_NAME, Resource};
use component_archive::{
    BuilderOptions, ComponentArchive, ComponentDescriptor, ConflictPolicy, ErrorKind,
    OsFilesystem,
};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_create_in_fresh_directory() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("empty-target");
    let fs_os = OsFilesystem::new();

    let archive = BuilderOptions::new(&target).build(&fs_os).unwrap();

    assert_eq!(archive.path(), target.as_path());
    let names: Vec<_> = fs::read_dir(&target)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names, vec![DESCRIPTOR_FILE_NAME]);

    let content = fs::read(target.join(DESCRIPTOR_FILE_NAME)).unwrap();
    let descriptor = ComponentDescriptor::parse(&content).unwrap();
    assert!(descriptor.is_empty());
    assert_eq!(descriptor.meta.schema_version, "v2");
}

#[test]
fn test_missing_parents_are_created() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("a").join("b").join("c");

    BuilderOptions::new(&target)
        .with_component("github.com/acme/widget", "v0.1.0")
        .build(&OsFilesystem::new())
        .unwrap();

    let opened = ComponentArchive::open(&OsFilesystem::new(), &target).unwrap();
    assert_eq!(opened.descriptor().component.name, "github.com/acme/widget");
    assert_eq!(opened.descriptor().component.version, "v0.1.0");
}

#[test]
fn test_empty_path_rejected_without_side_effects() {
    let temp_dir = TempDir::new().unwrap();
    let before = common::tree(temp_dir.path());

    let err = BuilderOptions::new("").build(&OsFilesystem::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(common::tree(temp_dir.path()), before);
}

#[test]
fn test_existing_archive_left_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("ca");
    fs::create_dir(&target).unwrap();
    fs::write(target.join(DESCRIPTOR_FILE_NAME), b"hand written, not yaml: [").unwrap();
    fs::write(target.join("notes.txt"), b"keep me").unwrap();
    let before = common::tree(temp_dir.path());

    let err = BuilderOptions::new(&target)
        .build(&OsFilesystem::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert_eq!(common::tree(temp_dir.path()), before);

    // Same result on retry
    let err = BuilderOptions::new(&target)
        .build(&OsFilesystem::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert_eq!(common::tree(temp_dir.path()), before);
}

#[test]
fn test_file_at_target_is_already_exists() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("ca");
    fs::write(&target, b"plain file").unwrap();

    for policy in [
        ConflictPolicy::Fail,
        ConflictPolicy::Reuse,
        ConflictPolicy::Overwrite,
    ] {
        let err = BuilderOptions::new(&target)
            .with_on_conflict(policy)
            .build(&OsFilesystem::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }
    assert_eq!(fs::read(&target).unwrap(), b"plain file");
}

#[test]
fn test_overwrite_keeps_blobs() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("ca");
    let fs_os = OsFilesystem::new();

    let mut archive = BuilderOptions::new(&target)
        .with_component("github.com/acme/widget", "v1.0.0")
        .build(&fs_os)
        .unwrap();
    archive
        .add_resource(
            &fs_os,
            Resource::new("readme", "v1.0.0", "plainText"),
            b"hello",
            Some("text/plain"),
        )
        .unwrap();
    let blobs_before = common::tree(&archive.blobs_dir());

    let replaced = BuilderOptions::new(&target)
        .with_component("github.com/acme/widget", "v2.0.0")
        .with_on_conflict(ConflictPolicy::Overwrite)
        .build(&fs_os)
        .unwrap();

    assert!(replaced.descriptor().component.resources.is_empty());
    assert_eq!(common::tree(&replaced.blobs_dir()), blobs_before);
    let reopened = ComponentArchive::open(&fs_os, &target).unwrap();
    assert_eq!(reopened.descriptor().component.version, "v2.0.0");
}

#[test]
fn test_reuse_returns_existing_descriptor() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("ca");
    let fs_os = OsFilesystem::new();

    BuilderOptions::new(&target)
        .with_component("github.com/acme/widget", "v1.0.0")
        .build(&fs_os)
        .unwrap();
    let before = common::tree(temp_dir.path());

    let reused = BuilderOptions::new(&target)
        .with_component("github.com/acme/other", "v9.9.9")
        .with_on_conflict(ConflictPolicy::Reuse)
        .build(&fs_os)
        .unwrap();

    assert_eq!(reused.descriptor().component.name, "github.com/acme/widget");
    assert_eq!(common::tree(temp_dir.path()), before);
}

#[test]
fn test_blob_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("ca");
    let fs_os = OsFilesystem::new();

    let mut archive = BuilderOptions::new(&target)
        .with_component("github.com/acme/widget", "v1.0.0")
        .build(&fs_os)
        .unwrap();
    archive
        .add_resource(
            &fs_os,
            Resource::new("chart", "v1.0.0", "helm"),
            b"chart bytes",
            None,
        )
        .unwrap();

    let reopened = ComponentArchive::open(&fs_os, &target).unwrap();
    let resource = &reopened.descriptor().component.resources[0];
    let filename = resource.access.as_ref().unwrap().field("filename").unwrap();
    assert!(filename.starts_with("sha256."));
    assert_eq!(reopened.read_blob(&fs_os, filename).unwrap(), b"chart bytes");

    // No temporary files are left behind
    let leftovers: Vec<_> = common::tree(&target)
        .into_iter()
        .filter(|(path, _)| path.to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}
