// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
fn set_before_read_wins() {
    let paths = UserPaths::new();
    paths.set(PathBuf::from("/s")).unwrap();
    assert_eq!(paths.root().unwrap(), PathBuf::from("/s"));
}

#[test]
fn set_after_read_fails() {
    let paths = UserPaths::new();
    paths.set(PathBuf::from("/s")).unwrap();
    let _ = paths.root().unwrap();
    assert!(matches!(paths.set(PathBuf::from("/elsewhere")), Err(StorageError::AlreadySet)));
}

#[test]
fn second_set_fails() {
    let paths = UserPaths::new();
    paths.set(PathBuf::from("/s")).unwrap();
    assert!(paths.set(PathBuf::from("/t")).is_err());
}

#[test]
fn derived_paths_hang_off_the_root() {
    let paths = UserPaths::new();
    paths.set(PathBuf::from("/s")).unwrap();
    assert_eq!(paths.config_path().unwrap(), PathBuf::from("/s/config.json"));
    assert_eq!(paths.job_root().unwrap(), PathBuf::from("/s/jobs"));
    assert_eq!(paths.persist_dir().unwrap(), PathBuf::from("/s/persist"));
    assert_eq!(paths.job_actions_dir().unwrap(), PathBuf::from("/s/job actions"));
}

#[test]
#[serial]
fn default_root_prefers_env_override() {
    std::env::set_var("COMPRESSARR_STORAGE_PATH", "/env-storage");
    let paths = UserPaths::new();
    assert_eq!(paths.root().unwrap(), PathBuf::from("/env-storage"));
    std::env::remove_var("COMPRESSARR_STORAGE_PATH");
}

#[test]
#[serial]
fn default_root_falls_back_to_home() {
    std::env::remove_var("COMPRESSARR_STORAGE_PATH");
    std::env::set_var("HOME", "/home/someone");
    let paths = UserPaths::new();
    assert_eq!(paths.root().unwrap(), PathBuf::from("/home/someone/.compressarr"));
}
