// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime tests: the scheduler, runner, and bus working together.
//!
//! Tests run on the current-thread runtime, so spawned runner tasks only
//! make progress at explicit await points. That makes event interleavings
//! deterministic: nothing the runner does can overtake the chain the test
//! is currently handling.

mod scenarios;

use super::*;
use crate::bus::EventReader;
use crate::host::Subscribers;
use crate::scheduler::Scheduler;
use async_trait::async_trait;
use compressarr_core::{ActionError, Job, MediaRef};
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;

type Log = Arc<Mutex<Vec<String>>>;

fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

/// A scripted pipeline stage: records starts, optionally rewrites the
/// source, fails, or parks until killed.
struct ScriptedAction {
    name: &'static str,
    log: Log,
    rewrite_ext: Option<&'static str>,
    fail: bool,
    /// How many `start` calls park until `kill` arrives.
    blocks_remaining: Mutex<u32>,
    killed: Arc<Mutex<HashSet<PathBuf>>>,
    poke: Arc<Notify>,
}

impl ScriptedAction {
    fn new(name: &'static str, log: &Log) -> Self {
        Self {
            name,
            log: log.clone(),
            rewrite_ext: None,
            fail: false,
            blocks_remaining: Mutex::new(0),
            killed: Arc::new(Mutex::new(HashSet::new())),
            poke: Arc::new(Notify::new()),
        }
    }

    fn passthrough(name: &'static str, log: &Log) -> ActionInstance {
        ActionInstance { name: name.to_string(), worker: Box::new(Self::new(name, log)) }
    }

    fn rewriting(name: &'static str, log: &Log, ext: &'static str) -> ActionInstance {
        let mut action = Self::new(name, log);
        action.rewrite_ext = Some(ext);
        ActionInstance { name: name.to_string(), worker: Box::new(action) }
    }

    fn failing(name: &'static str, log: &Log) -> ActionInstance {
        let mut action = Self::new(name, log);
        action.fail = true;
        ActionInstance { name: name.to_string(), worker: Box::new(action) }
    }

    /// Blocks the first `blocks` starts until killed; later starts pass.
    fn blocking(
        name: &'static str,
        log: &Log,
        blocks: u32,
    ) -> (ActionInstance, Arc<Mutex<HashSet<PathBuf>>>) {
        let mut action = Self::new(name, log);
        *action.blocks_remaining.get_mut() = blocks;
        let killed = action.killed.clone();
        (ActionInstance { name: name.to_string(), worker: Box::new(action) }, killed)
    }
}

#[async_trait]
impl JobAction for ScriptedAction {
    async fn start(&self, mut job: Job) -> Result<Job, ActionError> {
        self.log.lock().push(format!("start {} {}", self.name, job.name));

        let parked = {
            let mut remaining = self.blocks_remaining.lock();
            if *remaining > 0 {
                *remaining -= 1;
                true
            } else {
                false
            }
        };
        if parked {
            loop {
                if self.killed.lock().contains(job.id()) {
                    return Err(ActionError::Killed);
                }
                let _ = tokio::time::timeout(Duration::from_millis(20), self.poke.notified()).await;
            }
        }

        if self.fail {
            return Err(ActionError::failed("scripted failure"));
        }
        if let Some(ext) = self.rewrite_ext {
            let dest = job.next_destination(Some(ext));
            tokio::fs::write(&dest, format!("artifact of {}", self.name)).await?;
            job.source = dest;
        }
        Ok(job)
    }

    async fn kill(&self, job_id: &Path) -> Result<(), ActionError> {
        self.killed.lock().insert(job_id.to_path_buf());
        self.poke.notify_waiters();
        Ok(())
    }
}

struct TestContext {
    _storage: TempDir,
    lib_root: PathBuf,
    job_root: PathBuf,
    runtime: Arc<Runtime>,
    reader: EventReader,
    subscribers: Arc<Mutex<Subscribers>>,
    /// Every event handled, external and cascade, in handling order.
    events: Vec<Event>,
}

fn context(instances: usize, actions: Vec<ActionInstance>) -> TestContext {
    let storage = TempDir::new().unwrap();
    let lib_root = storage.path().join("lib");
    let job_root = storage.path().join("jobs");
    std::fs::create_dir_all(&lib_root).unwrap();
    std::fs::create_dir_all(&job_root).unwrap();

    let (bus, reader) = EventBus::new();
    let subscribers = Arc::new(Mutex::new(Subscribers::default()));
    let runtime = Arc::new(Runtime::new(
        bus,
        Scheduler::new(instances, &job_root),
        actions,
        subscribers.clone(),
    ));
    TestContext { _storage: storage, lib_root, job_root, runtime, reader, subscribers, events: Vec::new() }
}

impl TestContext {
    fn media(&self, rel: &str) -> MediaRef {
        MediaRef::new(self.lib_root.clone(), rel)
    }

    fn source(&self, rel: &str) -> PathBuf {
        self.lib_root.join(rel)
    }

    fn drop_file(&self, rel: &str) -> PathBuf {
        let path = self.source(rel);
        std::fs::write(&path, format!("original {rel}")).unwrap();
        path
    }

    /// Handle one event and its full cascade, recording everything.
    async fn handle_chain(&mut self, event: Event) {
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            self.events.push(event.clone());
            queue.extend(self.runtime.handle_event(event).await);
        }
    }

    /// Pump runner-published events until one matching `pred` has been
    /// handled (including its cascade).
    async fn pump_until(&mut self, pred: impl Fn(&Event) -> bool) {
        loop {
            let event = tokio::time::timeout(Duration::from_secs(2), self.reader.recv())
                .await
                .expect("timed out waiting for a bus event")
                .expect("bus closed");
            let matched = pred(&event);
            self.handle_chain(event).await;
            if matched {
                return;
            }
        }
    }

    fn event_names(&self) -> Vec<&str> {
        self.events.iter().map(Event::name).collect()
    }

    fn tables_empty(&self) -> bool {
        self.runtime.with_scheduler(|s| s.pending_len() == 0 && s.active_len() == 0)
    }
}

/// Spin the current-thread runtime until `pred` holds.
async fn wait_until(pred: impl Fn() -> bool) {
    for _ in 0..200 {
        if pred() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition never became true");
}

#[tokio::test]
async fn unregister_before_first_action_prevents_any_start() {
    let log = new_log();
    let mut ctx = context(1, vec![ScriptedAction::passthrough("A", &log)]);
    ctx.drop_file("x.mp4");

    // The runner task is spawned but cannot run until we next yield, so
    // the unregister lands before its first active-table check.
    ctx.handle_chain(Event::MediaRegister { media: ctx.media("x.mp4") }).await;
    ctx.handle_chain(Event::MediaUnregister { media: ctx.media("x.mp4") }).await;

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(ctx.reader.try_recv().is_none(), "no publish may escape a cancelled job");
    assert!(log.lock().is_empty(), "the first action must never start");
    assert!(ctx.tables_empty());
}

#[tokio::test]
async fn failing_action_releases_the_slot_without_publishing() {
    let log = new_log();
    let mut ctx = context(1, vec![ScriptedAction::failing("A", &log)]);
    ctx.drop_file("a.mp4");
    ctx.drop_file("b.mp4");

    ctx.handle_chain(Event::MediaRegister { media: ctx.media("a.mp4") }).await;
    ctx.handle_chain(Event::MediaRegister { media: ctx.media("b.mp4") }).await;

    let b = ctx.source("b.mp4");
    ctx.pump_until(|e| matches!(e, Event::JobUnregister { source } if *source == b)).await;

    assert_eq!(
        ctx.event_names(),
        [
            "media:register",
            "job:register",
            "media:register",
            "job:unregister", // a failed; slot released
            "job:register",   // b admitted
            "job:unregister", // b failed too
        ]
    );
    assert!(!ctx.event_names().contains(&"job:publish"));
    assert!(ctx.tables_empty());
    assert_eq!(*log.lock(), vec!["start A a", "start A b"]);
}

#[tokio::test]
async fn shutdown_unregisters_active_jobs_and_joins_runners() {
    let log = new_log();
    let (blocker, _killed) = ScriptedAction::blocking("A", &log, 1);
    let mut ctx = context(1, vec![blocker]);
    ctx.drop_file("x.mp4");

    ctx.handle_chain(Event::MediaRegister { media: ctx.media("x.mp4") }).await;
    wait_until(|| !log.lock().is_empty()).await;

    ctx.handle_chain(Event::Shutdown).await;
    assert!(ctx.tables_empty());

    // The killed runner settles; joining must not hang.
    tokio::time::timeout(Duration::from_secs(2), ctx.runtime.join_tasks())
        .await
        .expect("runner tasks failed to settle after shutdown");
}

#[tokio::test]
async fn shutdown_notifies_subscribers_and_drains_pending() {
    let log = new_log();
    let mut ctx = context(1, vec![ScriptedAction::passthrough("A", &log)]);
    ctx.drop_file("queued.mp4");

    let flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    {
        let flag = flag.clone();
        ctx.subscribers
            .lock()
            .on_shutdown(move || flag.store(true, std::sync::atomic::Ordering::SeqCst));
    }

    ctx.handle_chain(Event::Shutdown).await;
    assert!(flag.load(std::sync::atomic::Ordering::SeqCst));
    assert!(ctx.tables_empty());
}

#[tokio::test]
async fn launch_complete_reaches_subscribers() {
    let mut ctx = context(1, Vec::new());
    let count = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    {
        let count = count.clone();
        ctx.subscribers.lock().on_launch(move || {
            count.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });
    }
    ctx.handle_chain(Event::LaunchComplete).await;
    assert_eq!(count.load(std::sync::atomic::Ordering::SeqCst), 1);
}
