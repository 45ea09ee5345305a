// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scheduling scenarios driven through `handle_event`.

use super::*;

fn count(ctx: &TestContext, name: &str) -> usize {
    ctx.event_names().iter().filter(|n| **n == name).count()
}

#[tokio::test]
async fn happy_path_with_one_action() {
    let log = new_log();
    let mut ctx = context(1, vec![ScriptedAction::passthrough("dummy", &log)]);
    ctx.drop_file("x.mp4");

    ctx.handle_chain(Event::MediaRegister { media: ctx.media("x.mp4") }).await;
    ctx.pump_until(|e| matches!(e, Event::JobPublish { .. })).await;

    assert_eq!(ctx.event_names(), ["media:register", "job:register", "job:publish"]);

    let config = ctx
        .events
        .iter()
        .find_map(|event| match event {
            Event::JobRegister { config, .. } => Some(config.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(config.name, "x");
    assert_eq!(config.source, ctx.source("x.mp4"));
    assert_eq!(config.temp_prefix, ctx.job_root.join("x"));

    assert!(ctx.tables_empty());
    assert!(!ctx.job_root.join("x").exists());
    assert_eq!(*log.lock(), vec!["start dummy x"]);
    // A passthrough pipeline leaves the original untouched.
    assert_eq!(std::fs::read_to_string(ctx.source("x.mp4")).unwrap(), "original x.mp4");
}

#[tokio::test]
async fn two_step_pipeline_moves_the_artifact_into_place() {
    let log = new_log();
    let mut ctx = context(
        1,
        vec![ScriptedAction::rewriting("A", &log, "mkv"), ScriptedAction::passthrough("B", &log)],
    );
    ctx.drop_file("x.mp4");

    ctx.handle_chain(Event::MediaRegister { media: ctx.media("x.mp4") }).await;
    ctx.pump_until(|e| matches!(e, Event::JobPublish { .. })).await;

    assert_eq!(*log.lock(), vec!["start A x", "start B x"]);
    assert_eq!(std::fs::read_to_string(ctx.source("x.mp4")).unwrap(), "artifact of A");
    assert!(!ctx.job_root.join("x-1.mkv").exists(), "the intermediate was moved into place");
    assert!(ctx.tables_empty());
}

#[tokio::test]
async fn admission_cap_defers_the_third_job() {
    let log = new_log();
    let mut ctx = context(2, vec![ScriptedAction::passthrough("enc", &log)]);
    for rel in ["a.mp4", "b.mp4", "c.mp4"] {
        ctx.drop_file(rel);
    }

    ctx.handle_chain(Event::MediaRegister { media: ctx.media("a.mp4") }).await;
    ctx.handle_chain(Event::MediaRegister { media: ctx.media("b.mp4") }).await;
    ctx.handle_chain(Event::MediaRegister { media: ctx.media("c.mp4") }).await;

    // a and b admitted immediately; c waits for a slot.
    assert_eq!(count(&ctx, "job:register"), 2);
    ctx.runtime.with_scheduler(|s| {
        assert_eq!(s.active_len(), 2);
        assert_eq!(s.pending_len(), 1);
    });

    ctx.pump_until(|e| matches!(e, Event::JobPublish { .. })).await;

    // c's admission came strictly after the first publish.
    let names = ctx.event_names();
    let first_publish = names.iter().position(|n| *n == "job:publish").unwrap();
    let third_register = names
        .iter()
        .enumerate()
        .filter(|(_, n)| **n == "job:register")
        .nth(2)
        .map(|(i, _)| i)
        .unwrap();
    assert!(third_register > first_publish);

    while !ctx.tables_empty() {
        ctx.pump_until(|e| matches!(e, Event::JobPublish { .. })).await;
    }
    assert_eq!(count(&ctx, "job:publish"), 3);
}

#[tokio::test]
async fn update_during_run_cancels_and_requeues() {
    let log = new_log();
    let (blocker, killed) = ScriptedAction::blocking("A", &log, 1);
    let mut ctx = context(1, vec![blocker]);
    ctx.drop_file("y.mp4");

    ctx.handle_chain(Event::MediaRegister { media: ctx.media("y.mp4") }).await;
    wait_until(|| !log.lock().is_empty()).await;

    ctx.handle_chain(Event::MediaUpdate { media: ctx.media("y.mp4") }).await;

    // The in-flight action was killed and a fresh admission made.
    assert!(killed.lock().contains(&ctx.source("y.mp4")));
    assert_eq!(
        ctx.event_names(),
        ["media:register", "job:register", "media:update", "job:unregister", "job:register"]
    );

    ctx.pump_until(|e| matches!(e, Event::JobPublish { .. })).await;
    assert_eq!(*log.lock(), vec!["start A y", "start A y"]);
    assert!(ctx.tables_empty());
    assert_eq!(count(&ctx, "job:publish"), 1);
}

#[tokio::test]
async fn job_register_without_admission_is_ignored() {
    let log = new_log();
    let mut ctx = context(1, vec![ScriptedAction::passthrough("A", &log)]);
    let config = JobConfig::new("ghost", ctx.source("ghost.mp4"), ctx.job_root.join("ghost"));

    ctx.handle_chain(Event::JobRegister { source: config.source.clone(), config }).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(log.lock().is_empty());
    assert!(ctx.tables_empty());
}
