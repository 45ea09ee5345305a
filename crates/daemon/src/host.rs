// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The versioned host surface passed to plugin initializers and actions.
//!
//! Everything here is a thin republisher onto the internal bus, plus the
//! registration and subscription sinks the registry drains during
//! initialization.

use crate::bus::EventBus;
use crate::plugins::{ActionContext, ActionFactory, PendingRegistration, PluginError};
use compressarr_core::{Event, JobAction, JobConfig, MediaRef, PluginId};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;

/// Host version string reported to plugins.
pub const HOST_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Numeric host API version; plugins gate features with `api_at_least`.
pub const API_VERSION: u32 = 1;

/// Runtime (rustc) version the host targets.
pub const RUNTIME_VERSION: &str = env!("CARGO_PKG_RUST_VERSION");

type Callback = Box<dyn Fn() + Send + Sync>;

/// Callbacks plugins registered for lifecycle events. Late subscribers get
/// no replay.
#[derive(Default)]
pub struct Subscribers {
    launch: Vec<Callback>,
    shutdown: Vec<Callback>,
}

impl Subscribers {
    pub fn on_launch(&mut self, callback: impl Fn() + Send + Sync + 'static) {
        self.launch.push(Box::new(callback));
    }

    pub fn on_shutdown(&mut self, callback: impl Fn() + Send + Sync + 'static) {
        self.shutdown.push(Box::new(callback));
    }

    pub fn notify_launch(&self) {
        for callback in &self.launch {
            callback();
        }
    }

    pub fn notify_shutdown(&self) {
        for callback in &self.shutdown {
            callback();
        }
    }
}

/// Shared host state handed to the registry and runtime at startup.
#[derive(Clone)]
pub struct HostContext {
    pub bus: EventBus,
    pub subscribers: Arc<Mutex<Subscribers>>,
    registrations: Arc<Mutex<Vec<PendingRegistration>>>,
}

impl HostContext {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            subscribers: Arc::new(Mutex::new(Subscribers::default())),
            registrations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// An API handle bound to the given plugin.
    pub fn api_for(&self, plugin: PluginId) -> HostApi {
        HostApi { plugin, ctx: self.clone() }
    }

    /// Take the registrations accumulated since the last drain.
    pub fn drain_registrations(&self) -> Vec<PendingRegistration> {
        std::mem::take(&mut *self.registrations.lock())
    }
}

/// Versioned surface exposed to plugin code.
///
/// Cheap to clone and bound to the plugin it was handed to, so a
/// registration call carries its owner without any ambient state.
#[derive(Clone)]
pub struct HostApi {
    plugin: PluginId,
    ctx: HostContext,
}

impl HostApi {
    /// The plugin this handle is bound to.
    pub fn plugin(&self) -> &PluginId {
        &self.plugin
    }

    pub fn version(&self) -> &'static str {
        HOST_VERSION
    }

    pub fn api_version(&self) -> u32 {
        API_VERSION
    }

    /// Whether the host API is at least `version`.
    pub fn api_at_least(&self, version: u32) -> bool {
        API_VERSION >= version
    }

    /// Contribute an action constructor under this handle's plugin.
    pub fn register_action(
        &self,
        name: impl Into<String>,
        factory: impl Fn(ActionContext) -> Result<Box<dyn JobAction>, PluginError>
            + Send
            + Sync
            + 'static,
    ) {
        self.push_registration(None, name.into(), Arc::new(factory));
    }

    /// Legacy registration form that self-declares a plugin id. A mismatch
    /// with the bound plugin is accepted and recorded in the registry's
    /// identifier-translation table.
    pub fn register_action_as(
        &self,
        declared: PluginId,
        name: impl Into<String>,
        factory: impl Fn(ActionContext) -> Result<Box<dyn JobAction>, PluginError>
            + Send
            + Sync
            + 'static,
    ) {
        self.push_registration(Some(declared), name.into(), Arc::new(factory));
    }

    fn push_registration(&self, declared: Option<PluginId>, name: String, factory: ActionFactory) {
        self.ctx.registrations.lock().push(PendingRegistration { declared, name, factory });
    }

    pub fn register_job(&self, config: JobConfig) {
        self.ctx.bus.publish(Event::JobRegister { source: config.source.clone(), config });
    }

    pub fn unregister_job(&self, source: impl Into<PathBuf>) {
        self.ctx.bus.publish(Event::JobUnregister { source: source.into() });
    }

    pub fn publish_job(&self, source: impl Into<PathBuf>) {
        self.ctx.bus.publish(Event::JobPublish { source: source.into() });
    }

    pub fn register_media(&self, media: MediaRef) {
        self.ctx.bus.publish(Event::MediaRegister { media });
    }

    pub fn update_media(&self, media: MediaRef) {
        self.ctx.bus.publish(Event::MediaUpdate { media });
    }

    pub fn unregister_media(&self, media: MediaRef) {
        self.ctx.bus.publish(Event::MediaUnregister { media });
    }

    pub fn on_launch_complete(&self, callback: impl Fn() + Send + Sync + 'static) {
        self.ctx.subscribers.lock().on_launch(callback);
    }

    pub fn on_shutdown(&self, callback: impl Fn() + Send + Sync + 'static) {
        self.ctx.subscribers.lock().on_shutdown(callback);
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
