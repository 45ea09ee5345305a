// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::fs;
use tempfile::TempDir;

fn write_manifest(dir: &Path, name: &str) {
    write_manifest_body(
        dir,
        &format!(
            r#"{{
                "name": "{name}",
                "version": "1.0.0",
                "keywords": ["compressarr-plugin"],
                "engines": {{ "compressarr": "*" }}
            }}"#
        ),
    );
}

fn write_manifest_body(dir: &Path, body: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(MANIFEST_FILE), body).unwrap();
}

#[test]
fn scans_immediate_children() {
    let root = TempDir::new().unwrap();
    write_manifest(&root.path().join("compressarr-a"), "compressarr-a");
    write_manifest(&root.path().join("compressarr-b"), "compressarr-b");
    fs::create_dir_all(root.path().join("empty-dir")).unwrap();

    let found = discover(&[root.path().to_path_buf()]);
    let ids: Vec<&str> = found.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["compressarr-a", "compressarr-b"]);
}

#[test]
fn expands_scope_directories_one_level() {
    let root = TempDir::new().unwrap();
    write_manifest(&root.path().join("@acme/compressarr-x"), "@acme/compressarr-x");

    let found = discover(&[root.path().to_path_buf()]);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id.as_str(), "@acme/compressarr-x");
    assert_eq!(found[0].id.scope(), Some("acme"));
}

#[test]
fn a_root_with_its_own_manifest_is_a_single_plugin() {
    let root = TempDir::new().unwrap();
    write_manifest(root.path(), "compressarr-solo");
    // A nested package must not be picked up in this mode.
    write_manifest(&root.path().join("compressarr-nested"), "compressarr-nested");

    let found = discover(&[root.path().to_path_buf()]);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id.as_str(), "compressarr-solo");
}

#[test]
fn ordinary_packages_are_ignored() {
    let root = TempDir::new().unwrap();
    write_manifest_body(
        &root.path().join("left-pad"),
        r#"{ "name": "left-pad", "version": "1.0.0" }"#,
    );

    assert!(discover(&[root.path().to_path_buf()]).is_empty());
}

#[test]
fn plugin_shaped_candidates_failing_validation_are_skipped() {
    let root = TempDir::new().unwrap();
    // Right name pattern, but no keyword and no engines range.
    write_manifest_body(
        &root.path().join("compressarr-bad"),
        r#"{ "name": "compressarr-bad", "version": "1.0.0" }"#,
    );

    assert!(discover(&[root.path().to_path_buf()]).is_empty());
}

#[test]
fn unreadable_manifests_are_skipped() {
    let root = TempDir::new().unwrap();
    write_manifest_body(&root.path().join("compressarr-broken"), "{broken");

    assert!(discover(&[root.path().to_path_buf()]).is_empty());
}

#[test]
fn duplicate_search_paths_are_visited_once() {
    let root = TempDir::new().unwrap();
    write_manifest(&root.path().join("compressarr-a"), "compressarr-a");

    let found = discover(&[root.path().to_path_buf(), root.path().to_path_buf()]);
    assert_eq!(found.len(), 1);
}

#[test]
fn missing_search_paths_are_silently_dropped() {
    let found = discover(&[PathBuf::from("/definitely/not/here")]);
    assert!(found.is_empty());
}

#[test]
fn peer_dependency_range_is_promoted_during_discovery() {
    let root = TempDir::new().unwrap();
    write_manifest_body(
        &root.path().join("compressarr-peer"),
        r#"{
            "name": "compressarr-peer",
            "version": "0.3.0",
            "keywords": ["compressarr-plugin"],
            "peerDependencies": { "compressarr": "^0.2.0" }
        }"#,
    );

    let found = discover(&[root.path().to_path_buf()]);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].manifest.host_range(), Some("^0.2.0"));
}

#[test]
fn extra_path_lands_last_in_search_order() {
    let paths = search_paths(Some(Path::new("/extra/plugins")));
    assert_eq!(paths.last(), Some(&PathBuf::from("/extra/plugins")));
}
