// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! compressarr: the media-transcoding orchestrator front-end.
//!
//! Parses flags, pins the storage root, boots the daemon, and turns
//! signals into an orderly shutdown with a bounded grace window.

use clap::Parser;
use compressarr_core::Event;
use compressarr_daemon::adapters::{FfprobeAdapter, NotifyWatcher};
use compressarr_daemon::{startup, DaemonOptions, StaticLoader, USER_PATHS};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// How long a signal-initiated shutdown may take before the process is
/// forced out.
const GRACE: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "compressarr", version, about = "Media transcoding orchestrator")]
struct Cli {
    /// Force color output
    #[arg(short = 'C', long)]
    color: bool,

    /// Enable debug-level logging
    #[arg(short = 'D', long)]
    debug: bool,

    /// Maximum concurrent jobs
    #[arg(short = 'I', long, value_name = "N", default_value_t = 1)]
    instances: usize,

    /// Override the job temp-root
    #[arg(short = 'J', long, value_name = "PATH")]
    job_path: Option<PathBuf>,

    /// Additional plugin search path
    #[arg(short = 'P', long, value_name = "PATH")]
    plugin_path: Option<PathBuf>,

    /// Override the storage root (applies before anything reads it)
    #[arg(short = 'U', long, value_name = "PATH")]
    user_storage_path: Option<PathBuf>,
}

fn init_tracing(debug: bool, color: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if color {
        builder.with_ansi(true).init();
    } else {
        builder.init();
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> i32 {
    use tokio::signal::unix::{signal, SignalKind};
    match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
        (Ok(mut int), Ok(mut term)) => tokio::select! {
            _ = int.recv() => 2,
            _ = term.recv() => 15,
        },
        _ => {
            let _ = tokio::signal::ctrl_c().await;
            2
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> i32 {
    let _ = tokio::signal::ctrl_c().await;
    2
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug, cli.color);

    if let Some(root) = cli.user_storage_path {
        if let Err(err) = USER_PATHS.set(root) {
            tracing::error!(error = %err, "cannot apply --user-storage-path");
            std::process::exit(1);
        }
    }

    let options = DaemonOptions {
        instances: cli.instances,
        job_root: cli.job_path,
        plugin_path: cli.plugin_path,
    };
    let loader = StaticLoader::new();
    let watcher = NotifyWatcher;
    let probe = Arc::new(FfprobeAdapter::new());

    let daemon = match startup(&USER_PATHS, options, &loader, &watcher, probe).await {
        Ok(daemon) => daemon,
        Err(err) => {
            tracing::error!(error = %err, "startup failed");
            std::process::exit(1);
        }
    };

    let bus = daemon.bus.clone();
    let mut loop_task = tokio::spawn(daemon.run());

    tokio::select! {
        result = &mut loop_task => {
            if let Err(err) = result {
                tracing::error!(error = %err, "event loop aborted");
                std::process::exit(1);
            }
            std::process::exit(0);
        }
        signum = wait_for_signal() => {
            tracing::info!(signum, "signal received; shutting down");
            bus.publish(Event::Shutdown);
            if tokio::time::timeout(GRACE, loop_task).await.is_err() {
                tracing::warn!("grace window elapsed; forcing exit");
            }
            std::process::exit(128 + signum);
        }
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
