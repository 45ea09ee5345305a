// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: assembly, launch, the event loop, and teardown.

use crate::adapters::{ProbeAdapter, WatchAdapter};
use crate::bus::{EventBus, EventReader};
use crate::config::{Config, ConfigError, JobActionConfig};
use crate::env::{StorageError, UserPaths};
use crate::host::HostContext;
use crate::library::{LibraryError, LibraryManager};
use crate::plugins::{self, ActionContext, PluginLoader, PluginRegistry};
use crate::runtime::{ActionInstance, Runtime};
use crate::scheduler::Scheduler;
use compressarr_core::{ActionRef, Event};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Library(#[from] LibraryError),
}

/// Knobs the CLI hands to `startup`.
#[derive(Debug, Clone, Default)]
pub struct DaemonOptions {
    /// Maximum concurrent jobs. Zero is clamped to one.
    pub instances: usize,
    /// Job temp-root override (`-J`); defaults to `<storage>/jobs`.
    pub job_root: Option<PathBuf>,
    /// Additional plugin search path (`-P`).
    pub plugin_path: Option<PathBuf>,
}

/// The assembled daemon, ready to run its event loop.
pub struct Daemon {
    pub runtime: Arc<Runtime>,
    pub bus: EventBus,
    /// Read-only after startup; owned until process exit.
    pub registry: PluginRegistry,
    reader: EventReader,
    _libraries: LibraryManager,
}

/// Boot the daemon.
///
/// Order matters: the plugin registry populates action constructors before
/// the library manager starts emitting media events, and
/// `system:launch_complete` goes out last. The scheduler is subscribed
/// from the first event the loop processes.
pub async fn startup(
    paths: &UserPaths,
    options: DaemonOptions,
    loader: &dyn PluginLoader,
    watcher: &dyn WatchAdapter,
    probe: Arc<dyn ProbeAdapter>,
) -> Result<Daemon, LifecycleError> {
    let config = Config::load(&paths.config_path()?)?;
    let job_root = match options.job_root {
        Some(root) => root,
        None => paths.job_root()?,
    };
    for dir in [&job_root, &paths.persist_dir()?, &paths.job_actions_dir()?] {
        if let Err(err) = std::fs::create_dir_all(dir) {
            tracing::warn!(path = %dir.display(), error = %err, "could not create storage directory");
        }
    }

    let (bus, reader) = EventBus::new();
    let host = HostContext::new(bus.clone());

    let mut registry = PluginRegistry::new();
    let candidates = plugins::discover(&plugins::search_paths(options.plugin_path.as_deref()));
    registry.load(candidates, loader, config.plugins.as_deref(), &config.disabled_plugins);
    registry.initialize(&host);
    tracing::info!(plugins = registry.len(), "plugin registry initialized");

    let actions = build_actions(&config.job_actions, &registry, &host);
    tracing::info!(actions = actions.len(), "action pipeline assembled");

    let libraries = LibraryManager::start(
        &config.libraries,
        &config.disabled_libraries,
        watcher,
        probe,
        bus.clone(),
    )?;

    let scheduler = Scheduler::new(options.instances, job_root);
    let runtime =
        Arc::new(Runtime::new(bus.clone(), scheduler, actions, host.subscribers.clone()));

    bus.publish(Event::LaunchComplete);
    Ok(Daemon { runtime, bus, registry, reader, _libraries: libraries })
}

/// Instantiate the configured pipeline, in configuration order.
///
/// A stage that cannot be resolved or constructed is skipped with a
/// warning; the rest of the pipeline still loads.
pub fn build_actions(
    configs: &[JobActionConfig],
    registry: &PluginRegistry,
    host: &HostContext,
) -> Vec<ActionInstance> {
    let mut instances = Vec::new();
    for entry in configs {
        let reference = ActionRef::parse(&entry.action);
        let (plugin, factory) = match registry.resolve(&reference) {
            Ok(resolved) => resolved,
            Err(err) => {
                tracing::warn!(
                    action = %entry.action,
                    name = %entry.name,
                    error = %err,
                    "cannot resolve action; skipping"
                );
                continue;
            }
        };
        let context = ActionContext {
            name: entry.name.clone(),
            config: serde_json::Value::Object(entry.options.clone()),
            api: host.api_for(plugin.id.clone()),
        };
        match factory(context) {
            Ok(worker) => instances.push(ActionInstance { name: entry.name.clone(), worker }),
            Err(err) => tracing::warn!(
                action = %entry.action,
                name = %entry.name,
                error = %err,
                "failed to construct action; skipping"
            ),
        }
    }
    instances
}

impl Daemon {
    /// Drive the event loop until shutdown, then join runner tasks.
    ///
    /// Cascade events returned by a handler are processed before the next
    /// external receive, in publication order. After `system:shutdown` the
    /// loop drains its cascades (unregistering every active job) and
    /// stops; runner tasks are joined before returning.
    pub async fn run(mut self) {
        let mut queue: VecDeque<Event> = VecDeque::new();
        let mut shutting_down = false;
        loop {
            let event = match queue.pop_front() {
                Some(event) => event,
                None => {
                    if shutting_down {
                        break;
                    }
                    match self.reader.recv().await {
                        Some(event) => event,
                        None => break,
                    }
                }
            };
            if matches!(event, Event::Shutdown) {
                shutting_down = true;
            }
            queue.extend(self.runtime.handle_event(event).await);
        }
        self.runtime.join_tasks().await;
        tracing::info!("event loop stopped");
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
