// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin registry: discovery, validation, loading, initialization, and
//! action-name resolution.

pub mod discovery;
mod loader;

pub use discovery::{discover, search_paths, Candidate};
pub use loader::{Initializer, PluginLoader, StaticLoader};

use crate::host::{HostApi, HostContext, HOST_VERSION, RUNTIME_VERSION};
use compressarr_core::{ActionRef, Event, JobAction, PluginId, PluginManifest};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Constructs a worker from its per-action context. Invoked once per
/// configured pipeline stage at startup.
pub type ActionFactory =
    Arc<dyn Fn(ActionContext) -> Result<Box<dyn JobAction>, PluginError> + Send + Sync>;

/// Everything an action constructor receives.
pub struct ActionContext {
    /// Display name from the config entry.
    pub name: String,
    /// The action-specific config block, untouched.
    pub config: serde_json::Value,
    /// Host handle, bound to the owning plugin.
    pub api: HostApi,
}

/// A registration captured while a plugin's initializer ran.
pub struct PendingRegistration {
    /// Plugin id the registration self-declared, if any.
    pub declared: Option<PluginId>,
    pub name: String,
    pub factory: ActionFactory,
}

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("plugin '{plugin}' has no callable initializer")]
    NoInitializer { plugin: PluginId },

    #[error("failed to load plugin '{plugin}': {reason}")]
    Load { plugin: PluginId, reason: String },

    #[error("failed to construct action '{name}': {reason}")]
    Construct { name: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("no enabled plugin provides action '{0}'")]
    Unknown(String),

    #[error("action '{name}' is ambiguous; qualify it as one of: {}", options.join(", "))]
    Ambiguous { name: String, options: Vec<String> },

    #[error("plugin '{0}' is not registered")]
    UnknownPlugin(String),

    #[error("plugin '{0}' is disabled")]
    Disabled(PluginId),

    #[error("plugin '{plugin}' provides no action '{name}'")]
    UnknownAction { plugin: PluginId, name: String },
}

/// A loaded plugin. Owned exclusively by the registry from creation until
/// process exit; never unloaded.
pub struct Plugin {
    pub id: PluginId,
    pub path: PathBuf,
    pub manifest: PluginManifest,
    pub disabled: bool,
    actions: HashMap<String, ActionFactory>,
    /// Present between load and initialization.
    initializer: Option<Initializer>,
}

impl Plugin {
    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }
}

/// The process-wide plugin table. Populated during startup, read-only
/// afterwards.
#[derive(Default)]
pub struct PluginRegistry {
    /// Plugins in discovery order.
    plugins: IndexMap<PluginId, Plugin>,
    /// Global action-name index: name -> contributing plugins.
    by_action: HashMap<String, Vec<PluginId>>,
    /// Mis-declared plugin ids -> the plugin that actually registered.
    translations: HashMap<PluginId, PluginId>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load validated candidates into the registry.
    ///
    /// The allow-list restricts which candidates are loaded at all; the
    /// deny-list loads them but marks them disabled, so their config
    /// blocks stay recognizable. Per-plugin failures drop that plugin and
    /// leave the rest alone.
    pub fn load(
        &mut self,
        candidates: Vec<Candidate>,
        loader: &dyn PluginLoader,
        allow: Option<&[String]>,
        deny: &[String],
    ) {
        for candidate in candidates {
            if let Some(allow) = allow {
                if !allow.iter().any(|id| id == candidate.id.as_str()) {
                    tracing::debug!(plugin = %candidate.id, "not on the active plugin list; skipping");
                    continue;
                }
            }
            if let Some(existing) = self.plugins.get(&candidate.id) {
                tracing::warn!(
                    plugin = %candidate.id,
                    first = %existing.path.display(),
                    duplicate = %candidate.path.display(),
                    "duplicate plugin identifier; keeping the first"
                );
                continue;
            }

            check_versions(&candidate);

            let initializer =
                match loader.load(&candidate.id, &candidate.manifest, &candidate.path) {
                    Ok(initializer) => initializer,
                    Err(err) => {
                        tracing::error!(plugin = %candidate.id, error = %err, "failed to load plugin; dropping it");
                        continue;
                    }
                };

            let disabled = deny.iter().any(|id| id == candidate.id.as_str());
            if disabled {
                tracing::info!(plugin = %candidate.id, "plugin loaded but disabled by configuration");
            }
            self.plugins.insert(
                candidate.id.clone(),
                Plugin {
                    id: candidate.id,
                    path: candidate.path,
                    manifest: candidate.manifest,
                    disabled,
                    actions: HashMap::new(),
                    initializer: Some(initializer),
                },
            );
        }
    }

    /// Run every loaded plugin's initializer, in discovery order.
    ///
    /// Each initializer receives an API handle bound to its plugin, so the
    /// registration call itself carries the owner. Registrations that
    /// self-declare a different plugin id are accepted and recorded in the
    /// identifier-translation table.
    pub fn initialize(&mut self, host: &HostContext) {
        let ids: Vec<PluginId> = self.plugins.keys().cloned().collect();
        for id in ids {
            let Some(initializer) =
                self.plugins.get_mut(&id).and_then(|plugin| plugin.initializer.take())
            else {
                continue;
            };
            initializer(host.api_for(id.clone()));
            let registrations = host.drain_registrations();
            if registrations.is_empty() {
                tracing::debug!(plugin = %id, "initializer registered no actions");
            }
            for registration in registrations {
                self.attribute(&id, registration, host);
            }
        }
    }

    fn attribute(&mut self, owner: &PluginId, registration: PendingRegistration, host: &HostContext) {
        if let Some(declared) = registration.declared {
            if declared != *owner && !self.translations.contains_key(&declared) {
                tracing::warn!(
                    plugin = %owner,
                    declared = %declared,
                    "registration declared a different plugin id; recording translation"
                );
                self.translations.insert(declared, owner.clone());
            }
        }
        let Some(plugin) = self.plugins.get_mut(owner) else { return };
        plugin.actions.insert(registration.name.clone(), registration.factory);
        let contributors = self.by_action.entry(registration.name.clone()).or_default();
        if !contributors.contains(owner) {
            contributors.push(owner.clone());
        }
        host.bus.publish(Event::ActionRegistered {
            plugin: owner.clone(),
            name: registration.name,
        });
    }

    /// Resolve a configured action reference to its plugin and factory.
    ///
    /// Bare names must match exactly one enabled plugin; qualified lookups
    /// fall back to the translation table for legacy self-declared ids.
    pub fn resolve(
        &self,
        reference: &ActionRef,
    ) -> Result<(&Plugin, ActionFactory), ResolutionError> {
        match reference {
            ActionRef::Bare(name) => {
                let contributors: Vec<&Plugin> = self
                    .by_action
                    .get(name)
                    .into_iter()
                    .flatten()
                    .filter_map(|id| self.plugins.get(id))
                    .collect();
                let enabled: Vec<&Plugin> =
                    contributors.iter().copied().filter(|plugin| !plugin.disabled).collect();
                match enabled.as_slice() {
                    [] => match contributors.first() {
                        Some(disabled) => Err(ResolutionError::Disabled(disabled.id.clone())),
                        None => Err(ResolutionError::Unknown(name.clone())),
                    },
                    &[plugin] => self.factory_of(plugin, name),
                    many => Err(ResolutionError::Ambiguous {
                        name: name.clone(),
                        options: many
                            .iter()
                            .map(|plugin| format!("{}.{}", plugin.id, name))
                            .collect(),
                    }),
                }
            }
            ActionRef::Qualified { plugin, name } => {
                let actual = self.translations.get(plugin).unwrap_or(plugin);
                let Some(plugin) = self.plugins.get(actual) else {
                    return Err(ResolutionError::UnknownPlugin(actual.to_string()));
                };
                if plugin.disabled {
                    return Err(ResolutionError::Disabled(plugin.id.clone()));
                }
                self.factory_of(plugin, name)
            }
        }
    }

    fn factory_of<'a>(
        &self,
        plugin: &'a Plugin,
        name: &str,
    ) -> Result<(&'a Plugin, ActionFactory), ResolutionError> {
        match plugin.actions.get(name) {
            Some(factory) => Ok((plugin, factory.clone())),
            None => Err(ResolutionError::UnknownAction {
                plugin: plugin.id.clone(),
                name: name.to_string(),
            }),
        }
    }

    /// Look up a plugin, following the translation table.
    pub fn get(&self, id: &PluginId) -> Option<&Plugin> {
        let actual = self.translations.get(id).unwrap_or(id);
        self.plugins.get(actual)
    }

    pub fn plugins(&self) -> impl Iterator<Item = &Plugin> {
        self.plugins.values()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

/// Non-fatal compatibility checks, logged per plugin at load time.
fn check_versions(candidate: &Candidate) {
    if let Some(range) = candidate.manifest.host_range() {
        match matches_range(HOST_VERSION, range) {
            Some(true) => {}
            Some(false) => tracing::warn!(
                plugin = %candidate.id,
                range,
                host = HOST_VERSION,
                "plugin declares an incompatible compressarr range"
            ),
            None => tracing::warn!(
                plugin = %candidate.id,
                range,
                "unparseable compressarr version range"
            ),
        }
    }
    if let Some(range) = candidate.manifest.runtime_range() {
        match matches_range(RUNTIME_VERSION, range) {
            Some(true) => {}
            Some(false) => tracing::warn!(
                plugin = %candidate.id,
                range,
                runtime = RUNTIME_VERSION,
                "plugin declares an incompatible runtime range"
            ),
            None => tracing::warn!(
                plugin = %candidate.id,
                range,
                "unparseable runtime version range"
            ),
        }
    }
    if candidate.manifest.bundles_host() {
        tracing::warn!(
            plugin = %candidate.id,
            "plugin bundles compressarr in its dependencies; declare it under peerDependencies"
        );
    }
}

fn matches_range(version: &str, range: &str) -> Option<bool> {
    let version = lenient_version(version)?;
    let req = semver::VersionReq::parse(range).ok()?;
    Some(req.matches(&version))
}

/// Parse versions that may omit the patch (rust-version style "1.75").
fn lenient_version(version: &str) -> Option<semver::Version> {
    if let Ok(parsed) = semver::Version::parse(version) {
        return Some(parsed);
    }
    semver::Version::parse(&format!("{version}.0")).ok()
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
