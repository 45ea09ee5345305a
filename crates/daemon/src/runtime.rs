// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime: routes bus events to the scheduler, the runner tasks, and
//! plugin subscribers.

use crate::bus::EventBus;
use crate::host::Subscribers;
use crate::runner::{self, RunnerContext};
use crate::scheduler::Scheduler;
use compressarr_core::{Event, JobAction, JobConfig};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;

/// One configured pipeline stage: a display name plus its worker.
/// Instances are created once at startup, in configuration order, and
/// live for the process lifetime.
pub struct ActionInstance {
    pub name: String,
    pub worker: Box<dyn JobAction>,
}

/// Coordinates the scheduler tables, runner tasks, and subscribers.
///
/// `handle_event` runs on the event-loop task and returns the cascade of
/// events to process before the next receive; that single task is what
/// serializes every mutation of the shared tables.
pub struct Runtime {
    bus: EventBus,
    scheduler: Arc<Mutex<Scheduler>>,
    actions: Arc<[ActionInstance]>,
    current_steps: Arc<Mutex<HashMap<PathBuf, (u64, usize)>>>,
    subscribers: Arc<Mutex<Subscribers>>,
    tasks: Mutex<JoinSet<()>>,
}

impl Runtime {
    pub fn new(
        bus: EventBus,
        scheduler: Scheduler,
        actions: Vec<ActionInstance>,
        subscribers: Arc<Mutex<Subscribers>>,
    ) -> Self {
        Self {
            bus,
            scheduler: Arc::new(Mutex::new(scheduler)),
            actions: actions.into(),
            current_steps: Arc::new(Mutex::new(HashMap::new())),
            subscribers,
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    /// Handle one bus event, returning the cascade to publish next.
    pub async fn handle_event(&self, event: Event) -> Vec<Event> {
        match event {
            Event::MediaRegister { media } => self.scheduler.lock().register_media(&media),
            Event::MediaUpdate { media } => self.scheduler.lock().update_media(&media),
            Event::MediaUnregister { media } => self.scheduler.lock().unregister_media(&media),
            Event::JobPublish { source } => self.scheduler.lock().publish_job(&source),
            Event::JobRegister { source, config } => {
                self.spawn_runner(&source, config);
                Vec::new()
            }
            Event::JobUnregister { source } => {
                // Kill before releasing the slot: a successor admission
                // must not start while the old action still runs.
                self.kill_owner(&source).await;
                self.scheduler.lock().release(&source)
            }
            Event::ActionRegistered { plugin, name } => {
                tracing::info!(plugin = %plugin, action = %name, "action registered");
                Vec::new()
            }
            Event::LaunchComplete => {
                tracing::info!("launch complete");
                self.subscribers.lock().notify_launch();
                Vec::new()
            }
            Event::Shutdown => {
                tracing::info!("shutdown requested; draining scheduler");
                self.subscribers.lock().notify_shutdown();
                let sources = self.scheduler.lock().drain();
                sources.into_iter().map(|source| Event::JobUnregister { source }).collect()
            }
            Event::Custom => Vec::new(),
        }
    }

    /// Spawn the runner task for an admitted job.
    fn spawn_runner(&self, source: &Path, config: JobConfig) {
        let Some(gen) = self.scheduler.lock().active_gen(source) else {
            tracing::debug!(job = %source.display(), "job:register without an admission; ignoring");
            return;
        };
        let ctx = RunnerContext {
            scheduler: self.scheduler.clone(),
            actions: self.actions.clone(),
            current_steps: self.current_steps.clone(),
            bus: self.bus.clone(),
        };
        self.tasks.lock().spawn(runner::run_job(ctx, config, gen));
    }

    /// Kill the action instance currently handling a job, if any.
    async fn kill_owner(&self, source: &Path) {
        let index = self.current_steps.lock().get(source).map(|(_, index)| *index);
        let Some(action) = index.and_then(|index| self.actions.get(index)) else {
            return;
        };
        tracing::debug!(job = %source.display(), action = %action.name, "killing in-flight action");
        if let Err(err) = action.worker.kill(source).await {
            tracing::warn!(
                job = %source.display(),
                action = %action.name,
                error = %err,
                "kill failed"
            );
        }
    }

    /// Join every runner task; used by teardown after the queue drains.
    pub async fn join_tasks(&self) {
        let mut tasks = std::mem::take(&mut *self.tasks.lock());
        while tasks.join_next().await.is_some() {}
    }

    /// Read the scheduler tables under their mutex.
    pub fn with_scheduler<T>(&self, f: impl FnOnce(&Scheduler) -> T) -> T {
        f(&self.scheduler.lock())
    }

    /// Display names of the configured pipeline, in execution order.
    pub fn action_names(&self) -> Vec<&str> {
        self.actions.iter().map(|action| action.name.as_str()).collect()
    }
}

#[cfg(test)]
#[path = "runtime_tests/mod.rs"]
mod tests;
