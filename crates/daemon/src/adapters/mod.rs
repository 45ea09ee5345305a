// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collaborator seams: the filesystem-watch and media-probe primitives.
//!
//! The core consumes these through traits so the scheduling machinery can
//! be exercised without inotify or ffprobe on the box.

mod ffprobe;
mod notify;

pub use self::ffprobe::FfprobeAdapter;
pub use self::notify::NotifyWatcher;

use async_trait::async_trait;
use compressarr_core::MediaInfo;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc;

/// Kind of change a library watcher observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchKind {
    Added,
    Changed,
    Removed,
}

compressarr_core::simple_display! {
    WatchKind {
        Added => "added",
        Changed => "changed",
        Removed => "removed",
    }
}

/// One filesystem observation under a watched root. Paths are absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSignal {
    pub kind: WatchKind,
    pub path: PathBuf,
}

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to watch {path}: {reason}")]
    Watch { path: PathBuf, reason: String },
}

/// Token that keeps a watch alive; dropping it stops the watch.
pub struct WatchHandle {
    _keepalive: Box<dyn std::any::Any + Send>,
}

impl WatchHandle {
    pub fn new(keepalive: impl std::any::Any + Send) -> Self {
        Self { _keepalive: Box::new(keepalive) }
    }
}

/// Filesystem watch primitive.
///
/// Watches one root recursively, following symlinks, ignoring dotfiles,
/// reporting only regular files, and waiting for write completion before
/// emitting `Added`/`Changed`.
pub trait WatchAdapter: Send + Sync {
    fn watch(
        &self,
        root: &Path,
        tx: mpsc::UnboundedSender<WatchSignal>,
    ) -> Result<WatchHandle, WatchError>;
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe timed out")]
    Timeout,

    #[error("unreadable probe output: {0}")]
    Parse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Media probe primitive. `Ok(None)` means "not a media file"; errors are
/// treated the same way by callers, at debug level.
#[async_trait]
pub trait ProbeAdapter: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<Option<MediaInfo>, ProbeError>;
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
