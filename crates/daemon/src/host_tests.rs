// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

fn api() -> (HostApi, HostContext, crate::bus::EventReader) {
    let (bus, reader) = EventBus::new();
    let ctx = HostContext::new(bus);
    let id = PluginId::parse("compressarr-test").unwrap();
    (ctx.api_for(id), ctx, reader)
}

#[test]
fn version_surface() {
    let (api, _ctx, _reader) = api();
    assert_eq!(api.version(), HOST_VERSION);
    assert_eq!(api.api_version(), API_VERSION);
    assert!(api.api_at_least(API_VERSION));
    assert!(api.api_at_least(0));
    assert!(!api.api_at_least(API_VERSION + 1));
}

#[tokio::test]
async fn job_calls_republish_onto_the_bus() {
    let (api, _ctx, mut reader) = api();
    api.register_job(JobConfig::new("x", "/lib/x.mp4", "/s/jobs/x"));
    api.unregister_job("/lib/x.mp4");
    api.publish_job("/lib/x.mp4");

    assert_eq!(reader.recv().await.unwrap().name(), "job:register");
    assert_eq!(reader.recv().await.unwrap().name(), "job:unregister");
    assert_eq!(reader.recv().await.unwrap().name(), "job:publish");
}

#[tokio::test]
async fn media_calls_republish_onto_the_bus() {
    let (api, _ctx, mut reader) = api();
    api.register_media(MediaRef::new("/lib", "x.mp4"));
    api.update_media(MediaRef::new("/lib", "x.mp4"));
    api.unregister_media(MediaRef::new("/lib", "x.mp4"));

    assert_eq!(reader.recv().await.unwrap().name(), "media:register");
    assert_eq!(reader.recv().await.unwrap().name(), "media:update");
    assert_eq!(reader.recv().await.unwrap().name(), "media:unregister");
}

#[test]
fn registrations_accumulate_until_drained() {
    let (api, ctx, _reader) = api();
    api.register_action("noop", |_ctx| Err(PluginError::Construct {
        name: "noop".to_string(),
        reason: "unused".to_string(),
    }));
    api.register_action_as(
        PluginId::parse("compressarr-elsewhere").unwrap(),
        "other",
        |_ctx| {
            Err(PluginError::Construct { name: "other".to_string(), reason: "unused".to_string() })
        },
    );

    let drained = ctx.drain_registrations();
    assert_eq!(drained.len(), 2);
    assert_eq!(drained[0].name, "noop");
    assert!(drained[0].declared.is_none());
    assert_eq!(drained[1].declared.as_ref().map(PluginId::as_str), Some("compressarr-elsewhere"));
    assert!(ctx.drain_registrations().is_empty());
}

#[test]
fn subscriptions_fire_on_notify() {
    let (api, ctx, _reader) = api();
    let launches = Arc::new(AtomicUsize::new(0));
    let shutdowns = Arc::new(AtomicUsize::new(0));

    let counted = launches.clone();
    api.on_launch_complete(move || {
        counted.fetch_add(1, Ordering::SeqCst);
    });
    let counted = shutdowns.clone();
    api.on_shutdown(move || {
        counted.fetch_add(1, Ordering::SeqCst);
    });

    ctx.subscribers.lock().notify_launch();
    ctx.subscribers.lock().notify_launch();
    ctx.subscribers.lock().notify_shutdown();

    assert_eq!(launches.load(Ordering::SeqCst), 2);
    assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
}
