// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake adapters for exercising the core without inotify or ffprobe.

#![allow(clippy::panic)]

use super::{
    ProbeAdapter, ProbeError, WatchAdapter, WatchError, WatchHandle, WatchKind, WatchSignal,
};
use async_trait::async_trait;
use compressarr_core::MediaInfo;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Watch adapter driven by tests: records watched roots and lets the test
/// inject signals for any of them.
#[derive(Clone, Default)]
pub struct FakeWatcher {
    taps: Arc<Mutex<Vec<(PathBuf, mpsc::UnboundedSender<WatchSignal>)>>>,
}

impl FakeWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Roots currently being watched.
    pub fn roots(&self) -> Vec<PathBuf> {
        self.taps.lock().iter().map(|(root, _)| root.clone()).collect()
    }

    /// Inject a signal for a watched root. Panics if the root is unwatched.
    pub fn emit(&self, root: &Path, kind: WatchKind, path: impl Into<PathBuf>) {
        let taps = self.taps.lock();
        let (_, tx) = taps
            .iter()
            .find(|(watched, _)| watched == root)
            .unwrap_or_else(|| panic!("no watch registered for {}", root.display()));
        let _ = tx.send(WatchSignal { kind, path: path.into() });
    }
}

impl WatchAdapter for FakeWatcher {
    fn watch(
        &self,
        root: &Path,
        tx: mpsc::UnboundedSender<WatchSignal>,
    ) -> Result<WatchHandle, WatchError> {
        self.taps.lock().push((root.to_path_buf(), tx));
        Ok(WatchHandle::new(()))
    }
}

/// Probe adapter that recognizes media by file extension.
#[derive(Clone, Default)]
pub struct FakeProbe {
    extensions: Vec<String>,
}

impl FakeProbe {
    pub fn accepting<S: Into<String>>(extensions: impl IntoIterator<Item = S>) -> Self {
        Self { extensions: extensions.into_iter().map(Into::into).collect() }
    }
}

#[async_trait]
impl ProbeAdapter for FakeProbe {
    async fn probe(&self, path: &Path) -> Result<Option<MediaInfo>, ProbeError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        if self.extensions.iter().any(|known| known == ext) {
            Ok(Some(MediaInfo::new(ext)))
        } else {
            Ok(None)
        }
    }
}
