// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events that couple the plugin registry, libraries, and scheduler.

use crate::job::JobConfig;
use crate::media::MediaRef;
use crate::plugin::PluginId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Events carried on the internal bus.
///
/// Serializes with `{"type": "event:name", ...fields}` format.
/// Unknown type tags deserialize to `Custom`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // -- system --
    /// Startup finished: registry populated, libraries watching.
    #[serde(rename = "system:launch_complete")]
    LaunchComplete,

    /// Orderly teardown requested.
    #[serde(rename = "system:shutdown")]
    Shutdown,

    // -- action --
    /// A plugin initializer contributed an action constructor.
    #[serde(rename = "action:registered")]
    ActionRegistered { plugin: PluginId, name: String },

    // -- job --
    /// A pending job was admitted into the active table.
    #[serde(rename = "job:register")]
    JobRegister { source: PathBuf, config: JobConfig },

    /// An in-flight job should terminate at its next action boundary.
    #[serde(rename = "job:unregister")]
    JobUnregister { source: PathBuf },

    /// A job committed its artifact; its slot is released.
    #[serde(rename = "job:publish")]
    JobPublish { source: PathBuf },

    // -- media --
    #[serde(rename = "media:register")]
    MediaRegister { media: MediaRef },

    #[serde(rename = "media:update")]
    MediaUpdate { media: MediaRef },

    #[serde(rename = "media:unregister")]
    MediaUnregister { media: MediaRef },

    /// Catch-all for unknown event types (extensibility)
    #[serde(other, skip_serializing)]
    Custom,
}

impl Event {
    pub fn name(&self) -> &str {
        match self {
            Event::LaunchComplete => "system:launch_complete",
            Event::Shutdown => "system:shutdown",
            Event::ActionRegistered { .. } => "action:registered",
            Event::JobRegister { .. } => "job:register",
            Event::JobUnregister { .. } => "job:unregister",
            Event::JobPublish { .. } => "job:publish",
            Event::MediaRegister { .. } => "media:register",
            Event::MediaUpdate { .. } => "media:update",
            Event::MediaUnregister { .. } => "media:unregister",
            Event::Custom => "custom",
        }
    }

    /// Compact one-line description for the event log.
    pub fn log_summary(&self) -> String {
        let t = self.name();
        match self {
            Event::LaunchComplete | Event::Shutdown | Event::Custom => t.to_string(),
            Event::ActionRegistered { plugin, name } => {
                format!("{t} plugin={plugin} action={name}")
            }
            Event::JobRegister { source, config } => {
                format!("{t} src={} name={}", source.display(), config.name)
            }
            Event::JobUnregister { source } | Event::JobPublish { source } => {
                format!("{t} src={}", source.display())
            }
            Event::MediaRegister { media }
            | Event::MediaUpdate { media }
            | Event::MediaUnregister { media } => {
                format!("{t} lib={} path={}", media.library.display(), media.path.display())
            }
        }
    }

    /// The job source path this event targets, if any.
    pub fn source(&self) -> Option<&Path> {
        match self {
            Event::JobRegister { source, .. }
            | Event::JobUnregister { source }
            | Event::JobPublish { source } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
