// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage root resolution and derived paths.
//!
//! The storage root is set at most once (by the CLI, before anything reads
//! it) and read many times; changing it after the first read fails.

use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

/// Process-wide storage root.
pub static USER_PATHS: UserPaths = UserPaths::new();

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage root is already set")]
    AlreadySet,

    #[error("could not determine a storage root (no HOME)")]
    NoHome,
}

/// One-shot storage root cell with derived subpaths.
///
/// `set` wins only before the first `root` call; afterwards the resolved
/// value is pinned for the rest of the process.
pub struct UserPaths {
    cell: OnceLock<PathBuf>,
}

impl UserPaths {
    pub const fn new() -> Self {
        Self { cell: OnceLock::new() }
    }

    /// Set the storage root. Fails once any value (including the default)
    /// has been pinned.
    pub fn set(&self, root: PathBuf) -> Result<(), StorageError> {
        self.cell.set(root).map_err(|_| StorageError::AlreadySet)
    }

    /// Resolve the storage root, pinning the default on first read:
    /// `$COMPRESSARR_STORAGE_PATH` > `$HOME/.compressarr`.
    pub fn root(&self) -> Result<PathBuf, StorageError> {
        if let Some(root) = self.cell.get() {
            return Ok(root.clone());
        }
        let default = default_storage_root()?;
        Ok(self.cell.get_or_init(|| default).clone())
    }

    /// `<storage>/config.json`
    pub fn config_path(&self) -> Result<PathBuf, StorageError> {
        Ok(self.root()?.join("config.json"))
    }

    /// `<storage>/jobs`, the default job temp-root.
    pub fn job_root(&self) -> Result<PathBuf, StorageError> {
        Ok(self.root()?.join("jobs"))
    }

    /// `<storage>/persist` (reserved).
    pub fn persist_dir(&self) -> Result<PathBuf, StorageError> {
        Ok(self.root()?.join("persist"))
    }

    /// `<storage>/job actions` (reserved).
    pub fn job_actions_dir(&self) -> Result<PathBuf, StorageError> {
        Ok(self.root()?.join("job actions"))
    }
}

impl Default for UserPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn default_storage_root() -> Result<PathBuf, StorageError> {
    if let Ok(dir) = std::env::var("COMPRESSARR_STORAGE_PATH") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").map_err(|_| StorageError::NoHome)?;
    Ok(PathBuf::from(home).join(".compressarr"))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
