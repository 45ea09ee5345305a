// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job-action identifiers and the worker contract.

use crate::job::Job;
use crate::plugin::PluginId;
use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Reference to an action as written in configuration: either a bare name
/// resolved against the global action index, or qualified as
/// `plugin-id.name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionRef {
    Bare(String),
    Qualified { plugin: PluginId, name: String },
}

impl ActionRef {
    /// Parse a configured `jobAction` identifier.
    ///
    /// The portion before the last dot must itself be a valid plugin
    /// identifier for the reference to count as qualified; anything else
    /// is treated as a bare action name.
    pub fn parse(raw: &str) -> Self {
        if let Some((plugin, name)) = raw.rsplit_once('.') {
            if !name.is_empty() {
                if let Ok(plugin) = PluginId::parse(plugin) {
                    return Self::Qualified { plugin, name: name.to_string() };
                }
            }
        }
        Self::Bare(raw.to_string())
    }

    /// The action name without any plugin qualifier.
    pub fn name(&self) -> &str {
        match self {
            Self::Bare(name) => name,
            Self::Qualified { name, .. } => name,
        }
    }
}

impl fmt::Display for ActionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bare(name) => f.write_str(name),
            Self::Qualified { plugin, name } => write!(f, "{plugin}.{name}"),
        }
    }
}

/// Errors raised by an action worker's `start`.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Sentinel raised in response to `kill`. Not a failure: the pipeline
    /// driver logs at debug level and abandons the job silently.
    #[error("killed")]
    Killed,

    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ActionError {
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    pub fn is_killed(&self) -> bool {
        matches!(self, Self::Killed)
    }
}

/// The worker contract consumed (never implemented) by the core.
///
/// `start` may suspend; on success it returns the job with `source`
/// pointing at the produced artifact. `kill` must be idempotent, must be
/// a no-op for identifiers the worker is not currently handling, and must
/// cause any outstanding `start` for the same identifier to settle with
/// [`ActionError::Killed`].
#[async_trait]
pub trait JobAction: Send + Sync {
    async fn start(&self, job: Job) -> Result<Job, ActionError>;

    async fn kill(&self, job_id: &Path) -> Result<(), ActionError>;
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
