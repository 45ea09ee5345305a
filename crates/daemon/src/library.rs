// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Libraries: watched roots that translate filesystem events into media
//! events on the bus.

use crate::adapters::{ProbeAdapter, WatchAdapter, WatchError, WatchHandle, WatchKind, WatchSignal};
use crate::bus::EventBus;
use crate::config::LibraryConfig;
use compressarr_core::{media, Event, MediaRef};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("duplicate library name '{0}'")]
    DuplicateName(String),

    #[error(transparent)]
    Watch(#[from] WatchError),
}

/// One watched library root.
pub struct Library {
    pub name: String,
    /// Canonicalized root; all table keys derive from it.
    pub root: PathBuf,
    pub disabled: bool,
    /// Present while the watch is live.
    _watch: Option<WatchHandle>,
}

/// Owns the libraries and their watcher bridge tasks.
///
/// The root set is fixed at initialization: configured-but-nonexistent
/// roots are dropped with a warning, duplicate names are a configuration
/// error, and disabled libraries are constructed without starting their
/// watcher.
pub struct LibraryManager {
    libraries: Vec<Library>,
}

impl LibraryManager {
    pub fn start(
        configs: &[LibraryConfig],
        disabled: &[String],
        watcher: &dyn WatchAdapter,
        probe: Arc<dyn ProbeAdapter>,
        bus: EventBus,
    ) -> Result<Self, LibraryError> {
        let mut names = HashSet::new();
        let mut libraries = Vec::new();
        for config in configs {
            if !names.insert(config.name.clone()) {
                return Err(LibraryError::DuplicateName(config.name.clone()));
            }
            let root = match std::fs::canonicalize(&config.root) {
                Ok(root) => root,
                Err(_) => {
                    tracing::warn!(
                        library = %config.name,
                        root = %config.root.display(),
                        "library root does not exist; skipping"
                    );
                    continue;
                }
            };
            let is_disabled = disabled.contains(&config.name);
            let watch = if is_disabled {
                tracing::info!(library = %config.name, "library disabled; not watching");
                None
            } else {
                let (tx, rx) = mpsc::unbounded_channel();
                let handle = watcher.watch(&root, tx)?;
                tokio::spawn(bridge(root.clone(), rx, probe.clone(), bus.clone()));
                tracing::info!(library = %config.name, root = %root.display(), "watching library");
                Some(handle)
            };
            libraries.push(Library {
                name: config.name.clone(),
                root,
                disabled: is_disabled,
                _watch: watch,
            });
        }
        Ok(Self { libraries })
    }

    pub fn libraries(&self) -> &[Library] {
        &self.libraries
    }
}

/// Translate one library's watch signals into media events.
///
/// Added/changed files are gated by the probe: no usable media info means
/// the signal is dropped. Removals cannot be probed and pass straight
/// through; the scheduler treats unknown paths as no-ops.
async fn bridge(
    root: PathBuf,
    mut rx: mpsc::UnboundedReceiver<WatchSignal>,
    probe: Arc<dyn ProbeAdapter>,
    bus: EventBus,
) {
    while let Some(signal) = rx.recv().await {
        let Some(rel) = media::relative_to(&root, &signal.path) else {
            tracing::debug!(
                root = %root.display(),
                path = %signal.path.display(),
                "signal outside library root; dropping"
            );
            continue;
        };
        let media = MediaRef { library: root.clone(), path: rel };
        let event = match signal.kind {
            WatchKind::Removed => Event::MediaUnregister { media },
            kind => match probe.probe(&signal.path).await {
                Ok(Some(info)) => {
                    tracing::debug!(
                        path = %signal.path.display(),
                        format = %info.format,
                        "probed media file"
                    );
                    if kind == WatchKind::Added {
                        Event::MediaRegister { media }
                    } else {
                        Event::MediaUpdate { media }
                    }
                }
                Ok(None) => continue,
                Err(err) => {
                    tracing::debug!(
                        path = %signal.path.display(),
                        error = %err,
                        "probe failed; dropping event"
                    );
                    continue;
                }
            },
        };
        bus.publish(event);
    }
}

#[cfg(test)]
#[path = "library_tests.rs"]
mod tests;
