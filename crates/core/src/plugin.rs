// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin identifiers and package manifests.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Package name of the host, as plugins reference it in their manifests.
pub const HOST_PACKAGE: &str = "compressarr";

/// Keyword a package manifest must carry to be considered a plugin.
pub const PLUGIN_KEYWORD: &str = "compressarr-plugin";

/// Manifest key for the declared runtime version range (`engines.rustc`).
pub const RUNTIME_ENGINE: &str = "rustc";

/// A validated plugin identifier: `((@scope)/)?compressarr-<slug>`.
///
/// Unique across the process; the registry rejects re-discovery of the same
/// identifier at a different path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PluginId(String);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("plugin name '{0}' does not match ((@scope)/)?compressarr-<slug>")]
pub struct PluginIdError(String);

fn is_name_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.')
}

impl PluginId {
    pub fn parse(name: &str) -> Result<Self, PluginIdError> {
        let err = || PluginIdError(name.to_string());
        let bare = match name.strip_prefix('@') {
            Some(rest) => {
                let (scope, bare) = rest.split_once('/').ok_or_else(err)?;
                if scope.is_empty() || !scope.chars().all(is_name_char) {
                    return Err(err());
                }
                bare
            }
            None => name,
        };
        let slug = bare.strip_prefix("compressarr-").ok_or_else(err)?;
        if slug.is_empty() || !slug.chars().all(is_name_char) {
            return Err(err());
        }
        Ok(Self(name.to_string()))
    }

    /// The `@scope` portion of the identifier, without the `@`, if any.
    pub fn scope(&self) -> Option<&str> {
        self.0.strip_prefix('@').and_then(|rest| rest.split_once('/')).map(|(scope, _)| scope)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PluginId {
    type Error = PluginIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<PluginId> for String {
    fn from(id: PluginId) -> Self {
        id.0
    }
}

/// A plugin package manifest (`package.json`), as read from disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginManifest {
    pub name: String,
    pub version: String,
    pub keywords: Vec<String>,
    pub engines: BTreeMap<String, String>,
    #[serde(rename = "peerDependencies")]
    pub peer_dependencies: BTreeMap<String, String>,
    pub dependencies: BTreeMap<String, String>,
    pub main: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ManifestError {
    #[error(transparent)]
    Name(#[from] PluginIdError),

    #[error("manifest for '{0}' is missing the '{PLUGIN_KEYWORD}' keyword")]
    NotAPlugin(String),

    #[error("manifest for '{0}' has an empty version")]
    EmptyVersion(String),

    #[error("manifest for '{0}' declares no compressarr version range")]
    NoHostRange(String),
}

impl PluginManifest {
    /// Validate the manifest against the plugin package contract.
    ///
    /// A missing `engines.compressarr` range is promoted from
    /// `peerDependencies.compressarr` when present. Returns the parsed
    /// plugin identifier on success.
    pub fn validate(&mut self) -> Result<PluginId, ManifestError> {
        let id = PluginId::parse(&self.name)?;
        if !self.keywords.iter().any(|k| k == PLUGIN_KEYWORD) {
            return Err(ManifestError::NotAPlugin(self.name.clone()));
        }
        if self.version.trim().is_empty() {
            return Err(ManifestError::EmptyVersion(self.name.clone()));
        }
        if !self.engines.contains_key(HOST_PACKAGE) {
            let Some(range) = self.peer_dependencies.get(HOST_PACKAGE) else {
                return Err(ManifestError::NoHostRange(self.name.clone()));
            };
            self.engines.insert(HOST_PACKAGE.to_string(), range.clone());
        }
        Ok(id)
    }

    /// Declared host version range (`engines.compressarr`).
    pub fn host_range(&self) -> Option<&str> {
        self.engines.get(HOST_PACKAGE).map(String::as_str)
    }

    /// Declared runtime version range (`engines.rustc`).
    pub fn runtime_range(&self) -> Option<&str> {
        self.engines.get(RUNTIME_ENGINE).map(String::as_str)
    }

    /// Whether the plugin bundles the host in its regular dependencies.
    pub fn bundles_host(&self) -> bool {
        self.dependencies.contains_key(HOST_PACKAGE)
    }

    /// Entry module path relative to the package directory.
    pub fn entry(&self) -> &str {
        self.main.as_deref().unwrap_or("index")
    }
}

crate::builder! {
    pub struct PluginManifestBuilder => PluginManifest {
        into {
            name: String = "compressarr-test",
            version: String = "1.0.0",
        }
        set {
            keywords: Vec<String> = vec![PLUGIN_KEYWORD.to_string()],
            engines: BTreeMap<String, String> =
                BTreeMap::from([(HOST_PACKAGE.to_string(), "*".to_string())]),
            peer_dependencies: BTreeMap<String, String> = BTreeMap::new(),
            dependencies: BTreeMap<String, String> = BTreeMap::new(),
            main: Option<String> = None,
        }
    }
}

#[cfg(test)]
#[path = "plugin_tests.rs"]
mod tests;
