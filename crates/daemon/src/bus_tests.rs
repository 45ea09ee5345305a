// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use compressarr_core::MediaRef;

#[tokio::test]
async fn delivery_preserves_publication_order() {
    let (bus, mut reader) = EventBus::new();
    bus.publish(Event::MediaRegister { media: MediaRef::new("/lib", "a.mp4") });
    bus.publish(Event::MediaRegister { media: MediaRef::new("/lib", "b.mp4") });
    bus.publish(Event::LaunchComplete);

    let first = reader.recv().await.unwrap();
    let second = reader.recv().await.unwrap();
    let third = reader.recv().await.unwrap();
    assert_eq!(first.name(), "media:register");
    assert_eq!(second.name(), "media:register");
    assert_eq!(third, Event::LaunchComplete);
}

#[tokio::test]
async fn publish_after_reader_dropped_is_silent() {
    let (bus, reader) = EventBus::new();
    drop(reader);
    // Must not panic or block.
    bus.publish(Event::Shutdown);
}

#[tokio::test]
async fn try_recv_drains_without_blocking() {
    let (bus, mut reader) = EventBus::new();
    assert!(reader.try_recv().is_none());
    bus.publish(Event::Shutdown);
    assert_eq!(reader.try_recv(), Some(Event::Shutdown));
    assert!(reader.try_recv().is_none());
}
