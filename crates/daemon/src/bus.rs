// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The in-process event bus.
//!
//! Publishers push onto an unbounded channel; one event-loop task drains it
//! and runs every handler to completion before the next event is
//! dispatched. That single consumer is the mutual-exclusion protocol for
//! the shared scheduler tables.

use compressarr_core::Event;
use tokio::sync::mpsc;

/// Cloneable publisher handle.
#[derive(Clone)]
pub struct EventBus {
    tx: mpsc::UnboundedSender<Event>,
}

impl EventBus {
    pub fn new() -> (Self, EventReader) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, EventReader { rx })
    }

    /// Publish an event. Delivery is in publication order per publisher.
    /// Once the reader is gone (teardown), events are dropped.
    pub fn publish(&self, event: Event) {
        tracing::debug!(event = %event.log_summary(), "publish");
        if self.tx.send(event).is_err() {
            tracing::debug!("event bus closed; event dropped");
        }
    }
}

/// Consuming side of the bus, owned by the event loop.
pub struct EventReader {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventReader {
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Non-blocking receive, for tests and drain loops.
    pub fn try_recv(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
