// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Media identity and probe results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Identity of a discovered media item: library root plus relative path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaRef {
    /// Canonical absolute library root.
    pub library: PathBuf,
    /// Path relative to the library root.
    pub path: PathBuf,
}

impl MediaRef {
    pub fn new(library: impl Into<PathBuf>, path: impl Into<PathBuf>) -> Self {
        Self { library: library.into(), path: path.into() }
    }

    /// Absolute path of the media file.
    pub fn source(&self) -> PathBuf {
        self.library.join(&self.path)
    }
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source().display())
    }
}

/// What the media-probe collaborator reported for a file.
///
/// A probe that yields no usable info (not a media file, probe failure)
/// is represented as the absence of this struct, and the triggering
/// filesystem event is dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Container format name as reported by the probe.
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<String>,
}

impl MediaInfo {
    pub fn new(format: impl Into<String>) -> Self {
        Self { format: format.into(), duration_secs: None, video_codec: None }
    }
}

/// Strip `root` from an absolute path, yielding the library-relative path.
pub fn relative_to(root: &Path, absolute: &Path) -> Option<PathBuf> {
    absolute.strip_prefix(root).ok().map(Path::to_path_buf)
}

#[cfg(test)]
#[path = "media_tests.rs"]
mod tests;
