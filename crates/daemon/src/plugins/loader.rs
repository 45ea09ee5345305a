// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin entry-point loading.

use super::PluginError;
use crate::host::HostApi;
use compressarr_core::{PluginId, PluginManifest};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// A plugin's initializer, invoked once with a plugin-bound API handle to
/// collect the action constructors the plugin contributes.
pub type Initializer = Box<dyn FnOnce(HostApi) + Send>;

/// Resolves a validated plugin's entry module and extracts its initializer.
///
/// Executing foreign code is host-runtime work, so the registry consumes it
/// through this seam. Failure is fatal for that plugin alone.
pub trait PluginLoader: Send + Sync {
    fn load(
        &self,
        plugin: &PluginId,
        manifest: &PluginManifest,
        dir: &Path,
    ) -> Result<Initializer, PluginError>;
}

type Entry = Arc<dyn Fn(HostApi) + Send + Sync>;

/// Loader backed by a table of entry points compiled into the host.
#[derive(Default)]
pub struct StaticLoader {
    entries: HashMap<PluginId, Entry>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the entry point for a compiled-in plugin.
    pub fn register(&mut self, plugin: PluginId, entry: impl Fn(HostApi) + Send + Sync + 'static) {
        self.entries.insert(plugin, Arc::new(entry));
    }
}

impl PluginLoader for StaticLoader {
    fn load(
        &self,
        plugin: &PluginId,
        _manifest: &PluginManifest,
        _dir: &Path,
    ) -> Result<Initializer, PluginError> {
        let entry = self
            .entries
            .get(plugin)
            .cloned()
            .ok_or_else(|| PluginError::NoInitializer { plugin: plugin.clone() })?;
        Ok(Box::new(move |api| entry(api)))
    }
}
