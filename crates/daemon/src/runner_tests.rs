// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

#[tokio::test]
async fn replace_file_overwrites_the_target() {
    let dir = TempDir::new().unwrap();
    let from = dir.path().join("x-1.mkv");
    let to = dir.path().join("x.mp4");
    std::fs::write(&from, b"artifact").unwrap();
    std::fs::write(&to, b"original").unwrap();

    replace_file(&from, &to).await.unwrap();

    assert!(!from.exists());
    assert_eq!(std::fs::read(&to).unwrap(), b"artifact");
}

#[tokio::test]
async fn replace_file_fails_without_a_source() {
    let dir = TempDir::new().unwrap();
    let result = replace_file(&dir.path().join("missing"), &dir.path().join("target")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn remove_temp_swallows_missing_paths() {
    let dir = TempDir::new().unwrap();
    // Nothing at the prefix: cleanup is a silent no-op.
    remove_temp(&dir.path().join("x")).await;
}

#[tokio::test]
async fn remove_temp_deletes_recursively() {
    let dir = TempDir::new().unwrap();
    let prefix = dir.path().join("x");
    std::fs::create_dir_all(prefix.join("nested")).unwrap();
    std::fs::write(prefix.join("nested/part"), b"data").unwrap();

    remove_temp(&prefix).await;
    assert!(!prefix.exists());
}
