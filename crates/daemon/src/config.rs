// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk configuration: `<storage>/config.json`.

use serde::Deserialize;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse {path}: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },

    #[error("duplicate library name '{0}'")]
    DuplicateLibrary(String),
}

/// A watched library root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LibraryConfig {
    #[serde(rename = "library")]
    pub root: PathBuf,
    pub name: String,
}

/// One configured pipeline stage.
#[derive(Debug, Clone, Deserialize)]
pub struct JobActionConfig {
    /// Bare action name or qualified `plugin-id.name`.
    #[serde(rename = "jobAction")]
    pub action: String,
    /// Display name for the constructed instance.
    pub name: String,
    /// Action-specific fields, passed through to the worker untouched.
    #[serde(flatten)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub libraries: Vec<LibraryConfig>,
    #[serde(rename = "jobActions")]
    pub job_actions: Vec<JobActionConfig>,
    /// Allow-list: when present, only these plugins are loaded.
    pub plugins: Option<Vec<String>>,
    /// Deny-list: these plugins load but stay disabled.
    #[serde(rename = "disabledPlugins")]
    pub disabled_plugins: Vec<String>,
    #[serde(rename = "disabledLibraries")]
    pub disabled_libraries: Vec<String>,
}

impl Config {
    /// Load configuration from disk.
    ///
    /// A missing file is tolerated (empty configuration, warning); an
    /// unparseable file is fatal.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(
                    path = %path.display(),
                    "no config file; starting with an empty configuration"
                );
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Read { path: path.to_path_buf(), source }),
        };
        let config: Self = serde_json::from_str(&data)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for library in &self.libraries {
            if !names.insert(library.name.as_str()) {
                return Err(ConfigError::DuplicateLibrary(library.name.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
