// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job configuration and the per-file pipeline context.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Immutable description of a job awaiting admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Display name, the media file stem.
    pub name: String,
    /// Absolute path of the source media file.
    #[serde(rename = "srcPath")]
    pub source: PathBuf,
    /// Absolute directory-plus-stem prefix for intermediates.
    #[serde(rename = "tempPath")]
    pub temp_prefix: PathBuf,
}

impl JobConfig {
    pub fn new(
        name: impl Into<String>,
        source: impl Into<PathBuf>,
        temp_prefix: impl Into<PathBuf>,
    ) -> Self {
        Self { name: name.into(), source: source.into(), temp_prefix: temp_prefix.into() }
    }
}

crate::builder! {
    pub struct JobConfigBuilder => JobConfig {
        into {
            name: String = "x",
            source: PathBuf = "/lib/x.mp4",
            temp_prefix: PathBuf = "/s/jobs/x",
        }
    }
}

/// The mutable per-file context threaded through the action pipeline.
///
/// Actions receive the job by value from `start` and hand back an updated
/// one, typically with `source` rewritten to point at their artifact under
/// the temp prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    /// Display name.
    pub name: String,
    /// Path of the media file that triggered this job. Doubles as the
    /// job identifier in the scheduler tables.
    pub original: PathBuf,
    /// Directory-plus-stem prefix under the job root where intermediates
    /// are allocated.
    pub temp_prefix: PathBuf,
    /// Where the next action reads its input from. Starts at `original`.
    pub source: PathBuf,
    /// Next intermediate suffix to try. Monotonically increasing so a
    /// taken index is never retried.
    next_index: u32,
}

impl Job {
    pub fn new(config: &JobConfig) -> Self {
        Self {
            name: config.name.clone(),
            original: config.source.clone(),
            temp_prefix: config.temp_prefix.clone(),
            source: config.source.clone(),
            next_index: 1,
        }
    }

    /// The job identifier: the original source path.
    pub fn id(&self) -> &Path {
        &self.original
    }

    /// Whether any action has rewritten the current source away from the
    /// original media file.
    pub fn has_artifact(&self) -> bool {
        self.source != self.original
    }

    /// Allocate the next intermediate destination under the temp prefix.
    ///
    /// Picks the smallest untried integer suffix `i >= 1` such that
    /// `<temp-prefix>-<i>` does not yet exist on disk. A requested
    /// extension is appended as `.<ext>` after stripping leading dots.
    /// This is the only disk stat the pipeline driver performs.
    pub fn next_destination(&mut self, extension: Option<&str>) -> PathBuf {
        let ext =
            extension.map(|e| e.trim_start_matches('.')).filter(|e| !e.is_empty());
        let mut index = self.next_index.max(1);
        loop {
            let candidate = self.candidate(index, ext);
            if !candidate.exists() {
                self.next_index = index + 1;
                return candidate;
            }
            index += 1;
        }
    }

    fn candidate(&self, index: u32, ext: Option<&str>) -> PathBuf {
        let mut name =
            self.temp_prefix.file_name().map(|s| s.to_os_string()).unwrap_or_default();
        name.push(format!("-{index}"));
        if let Some(ext) = ext {
            name.push(".");
            name.push(ext);
        }
        self.temp_prefix.with_file_name(name)
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
