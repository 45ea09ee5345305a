// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `notify`-backed watch adapter.

use super::{WatchAdapter, WatchError, WatchHandle, WatchKind, WatchSignal};
use notify::event::{AccessKind, AccessMode, CreateKind, ModifyKind, RenameMode};
use notify::{EventKind, RecursiveMode, Watcher};
use std::ffi::OsStr;
use std::path::Path;
use tokio::sync::mpsc;

/// Watches a library root with the platform's native watcher.
#[derive(Debug, Default, Clone, Copy)]
pub struct NotifyWatcher;

impl WatchAdapter for NotifyWatcher {
    fn watch(
        &self,
        root: &Path,
        tx: mpsc::UnboundedSender<WatchSignal>,
    ) -> Result<WatchHandle, WatchError> {
        let watch_err = |reason: &dyn std::fmt::Display| WatchError::Watch {
            path: root.to_path_buf(),
            reason: reason.to_string(),
        };

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => {
                    for signal in translate(&event) {
                        if tx.send(signal).is_err() {
                            break;
                        }
                    }
                }
                Err(err) => tracing::warn!(error = %err, "filesystem watch error"),
            }
        })
        .map_err(|e| watch_err(&e))?;

        watcher.watch(root, RecursiveMode::Recursive).map_err(|e| watch_err(&e))?;
        Ok(WatchHandle::new(watcher))
    }
}

/// Map a raw notify event onto library signals.
///
/// `Added` fires on file creation and rename-into-place (the atomic-write
/// pattern); `Changed` on data writes and write-close. Every emitted entry
/// is stat'ed so only regular files pass, except removals, which cannot be.
fn translate(event: &notify::Event) -> Vec<WatchSignal> {
    let kind = match event.kind {
        EventKind::Create(CreateKind::File) | EventKind::Create(CreateKind::Any) => {
            WatchKind::Added
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => WatchKind::Added,
        EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any) => {
            WatchKind::Changed
        }
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => WatchKind::Changed,
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) | EventKind::Remove(_) => {
            WatchKind::Removed
        }
        _ => return Vec::new(),
    };

    event
        .paths
        .iter()
        .filter(|path| !is_dotfile(path))
        .filter(|path| kind == WatchKind::Removed || path.is_file())
        .map(|path| WatchSignal { kind, path: path.clone() })
        .collect()
}

fn is_dotfile(path: &Path) -> bool {
    path.file_name().and_then(OsStr::to_str).map(|name| name.starts_with('.')).unwrap_or(false)
}

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
