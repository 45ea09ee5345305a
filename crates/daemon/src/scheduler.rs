// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job scheduler: the pending queue, the active table, and admission.
//!
//! All methods run inside bus handlers under one mutex; they return the
//! events to publish rather than publishing themselves, so every table
//! mutation stays on the event-loop task.

use compressarr_core::{Event, JobConfig, MediaRef};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// An admitted job. The generation distinguishes successive admissions of
/// the same source path, so a runner from a cancelled admission can never
/// mistake its successor's active entry for its own.
#[derive(Debug, Clone)]
pub struct AdmittedJob {
    pub gen: u64,
    pub config: JobConfig,
}

pub struct Scheduler {
    /// Concurrency cap.
    instances: usize,
    /// Root under which temp prefixes are derived.
    job_root: PathBuf,
    next_gen: u64,
    /// Insertion-ordered queue awaiting admission; one entry per source.
    pending: IndexMap<PathBuf, JobConfig>,
    /// Jobs currently executing; bounded by `instances`.
    active: HashMap<PathBuf, AdmittedJob>,
}

impl Scheduler {
    pub fn new(instances: usize, job_root: impl Into<PathBuf>) -> Self {
        Self {
            instances: instances.max(1),
            job_root: job_root.into(),
            next_gen: 0,
            pending: IndexMap::new(),
            active: HashMap::new(),
        }
    }

    /// Derive the job config for a media item:
    /// `tempPrefix = jobRoot / dir(rel) / stem(rel)`, named after the stem.
    fn job_config(&self, media: &MediaRef) -> JobConfig {
        let stem = media
            .path
            .file_stem()
            .map(|s| s.to_os_string())
            .unwrap_or_default();
        let mut prefix = self.job_root.clone();
        if let Some(parent) = media.path.parent() {
            prefix.push(parent);
        }
        prefix.push(&stem);
        JobConfig {
            name: stem.to_string_lossy().into_owned(),
            source: media.source(),
            temp_prefix: prefix,
        }
    }

    /// Media discovered: queue a job and admit what fits.
    ///
    /// A source that is already active is treated as updated, so the path
    /// never sits in both tables.
    pub fn register_media(&mut self, media: &MediaRef) -> Vec<Event> {
        if self.active.contains_key(&media.source()) {
            return self.update_media(media);
        }
        let config = self.job_config(media);
        self.pending.insert(config.source.clone(), config);
        self.advance()
    }

    /// Media changed: re-queue, and cancel any in-flight admission. The
    /// resulting `job:unregister` handler releases the slot and re-admits.
    pub fn update_media(&mut self, media: &MediaRef) -> Vec<Event> {
        let config = self.job_config(media);
        let source = config.source.clone();
        self.pending.insert(source.clone(), config);
        self.active.remove(&source);
        vec![Event::JobUnregister { source }]
    }

    /// Media removed: drop the job wherever it is and cancel in-flight work.
    pub fn unregister_media(&mut self, media: &MediaRef) -> Vec<Event> {
        let source = media.source();
        self.pending.shift_remove(&source);
        self.active.remove(&source);
        vec![Event::JobUnregister { source }]
    }

    /// A job published its artifact: free the slot and admit the next.
    pub fn publish_job(&mut self, source: &Path) -> Vec<Event> {
        self.pending.shift_remove(source);
        self.active.remove(source);
        self.advance()
    }

    /// Release a slot without publication (cancellation or failure), then
    /// admit whatever now fits.
    pub fn release(&mut self, source: &Path) -> Vec<Event> {
        self.active.remove(source);
        self.advance()
    }

    /// Drain for shutdown: clear the queue and return the sources whose
    /// runners must be told to stop.
    pub fn drain(&mut self) -> Vec<PathBuf> {
        self.pending.clear();
        self.active.keys().cloned().collect()
    }

    /// Admit pending jobs FIFO while slots are free. Loops rather than
    /// recursing; always terminates because each admission shrinks
    /// `pending` and grows `active`.
    fn advance(&mut self) -> Vec<Event> {
        let mut admitted = Vec::new();
        while self.active.len() < self.instances {
            let Some((source, config)) = self.pending.shift_remove_index(0) else {
                break;
            };
            self.next_gen += 1;
            self.active.insert(
                source.clone(),
                AdmittedJob { gen: self.next_gen, config: config.clone() },
            );
            admitted.push(Event::JobRegister { source, config });
        }
        admitted
    }

    /// Whether the admission with this generation still owns the slot.
    pub fn is_active(&self, source: &Path, gen: u64) -> bool {
        self.active.get(source).map(|job| job.gen == gen).unwrap_or(false)
    }

    /// Generation of the current admission for a source, if any.
    pub fn active_gen(&self, source: &Path) -> Option<u64> {
        self.active.get(source).map(|job| job.gen)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn pending_sources(&self) -> Vec<PathBuf> {
        self.pending.keys().cloned().collect()
    }

    pub fn active_sources(&self) -> Vec<PathBuf> {
        self.active.keys().cloned().collect()
    }

    pub fn pending_config(&self, source: &Path) -> Option<&JobConfig> {
        self.pending.get(source)
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
