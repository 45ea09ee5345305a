// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job pipeline driver.

use crate::bus::EventBus;
use crate::runtime::ActionInstance;
use crate::scheduler::Scheduler;
use compressarr_core::{Event, Job, JobConfig};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shared state a runner task needs.
#[derive(Clone)]
pub(crate) struct RunnerContext {
    pub scheduler: Arc<Mutex<Scheduler>>,
    pub actions: Arc<[ActionInstance]>,
    /// Job source -> (admission generation, index of the action whose
    /// `start` is in flight). The generation keeps a cancelled runner's
    /// cleanup from clobbering its successor's entry.
    pub current_steps: Arc<Mutex<HashMap<PathBuf, (u64, usize)>>>,
    pub bus: EventBus,
}

/// Drive one admitted job through the configured pipeline.
///
/// Active-table membership is re-checked before every step, so a
/// `job:unregister` published before the first action still prevents it
/// from starting. A job that survives all steps is committed: the final
/// artifact replaces the original, the temp prefix is deleted best-effort,
/// and `job:publish` releases the slot.
pub(crate) async fn run_job(ctx: RunnerContext, config: JobConfig, gen: u64) {
    let mut job = Job::new(&config);
    let source = job.id().to_path_buf();

    // Intermediates land next to the temp prefix; make sure that
    // directory exists before any action allocates a destination.
    if let Some(parent) = job.temp_prefix.parent() {
        if let Err(err) = tokio::fs::create_dir_all(parent).await {
            tracing::warn!(path = %parent.display(), error = %err, "could not create job temp directory");
        }
    }

    for (index, action) in ctx.actions.iter().enumerate() {
        if !ctx.scheduler.lock().is_active(&source, gen) {
            tracing::debug!(job = %source.display(), "job unregistered; stopping before next action");
            return;
        }
        ctx.current_steps.lock().insert(source.clone(), (gen, index));
        let outcome = action.worker.start(job).await;
        {
            let mut steps = ctx.current_steps.lock();
            if steps.get(&source).map(|(owner, _)| *owner == gen).unwrap_or(false) {
                steps.remove(&source);
            }
        }
        match outcome {
            Ok(updated) => job = updated,
            Err(err) if err.is_killed() => {
                tracing::debug!(job = %source.display(), action = %action.name, "action killed");
                return;
            }
            Err(err) => {
                tracing::error!(
                    job = %source.display(),
                    action = %action.name,
                    error = %err,
                    "action failed; abandoning job"
                );
                ctx.bus.publish(Event::JobUnregister { source });
                return;
            }
        }
    }

    if !ctx.scheduler.lock().is_active(&source, gen) {
        tracing::debug!(job = %source.display(), "job unregistered; skipping commit");
        return;
    }
    if job.has_artifact() {
        if let Err(err) = replace_file(&job.source, &job.original).await {
            tracing::error!(
                job = %source.display(),
                artifact = %job.source.display(),
                error = %err,
                "failed to move artifact into place; abandoning job"
            );
            ctx.bus.publish(Event::JobUnregister { source });
            return;
        }
    }
    remove_temp(&job.temp_prefix).await;
    tracing::info!(job = %source.display(), "job published");
    ctx.bus.publish(Event::JobPublish { source });
}

/// Move `from` over `to`, falling back to copy-then-remove when rename
/// fails (cross-device temp roots).
async fn replace_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(_) => {
            tokio::fs::copy(from, to).await?;
            tokio::fs::remove_file(from).await
        }
    }
}

/// Best-effort recursive removal of the temp prefix; errors swallowed.
async fn remove_temp(prefix: &Path) {
    if let Err(err) = tokio::fs::remove_dir_all(prefix).await {
        tracing::debug!(path = %prefix.display(), error = %err, "temp cleanup skipped");
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
