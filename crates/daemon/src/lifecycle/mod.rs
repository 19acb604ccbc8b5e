// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, serving, shutdown.

mod startup;
pub use startup::startup;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use ctl_core::SystemClock;
use ctl_mux::{ControlMultiplexer, MuxError};
use thiserror::Error;
use tokio::net::UnixListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::env;
use crate::ledger::{JobLedger, RequestStats};
use crate::listener::Listener;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/ctl)
    pub state_dir: PathBuf,
    /// Unix socket of the control multiplexer
    pub control_socket: PathBuf,
    /// Unix socket of the introspection service
    pub stats_socket: PathBuf,
    /// TCP address of the introspection service, if enabled
    pub stats_addr: Option<(String, u16)>,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Directory of the daily daemon logs
    pub log_dir: PathBuf,
    /// Load one worker carries at 100%
    pub worker_capacity: u64,
}

impl Config {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self, LifecycleError> {
        let mut config = Self::for_state_dir(env::state_dir()?);
        if let Some(socket) = env::control_socket() {
            config.control_socket = socket;
        }
        config.stats_addr = env::stats_port().map(|port| (env::stats_host(), port));
        config.worker_capacity = env::worker_capacity();
        Ok(config)
    }

    /// Default layout under `state_dir`, without TCP.
    pub fn for_state_dir(state_dir: PathBuf) -> Self {
        Self {
            control_socket: state_dir.join("control.sock"),
            stats_socket: state_dir.join("stats.sock"),
            stats_addr: None,
            lock_path: state_dir.join("ctld.pid"),
            log_dir: state_dir.join("logs"),
            worker_capacity: 5,
            state_dir,
        }
    }
}

/// Daemon state during operation.
pub struct DaemonState {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub jobs: Arc<JobLedger>,
    pub requests: Arc<RequestStats<SystemClock>>,
    pub mux: ControlMultiplexer,
    pub start_time: Instant,
}

/// Result of daemon startup: the state plus the bound sockets to serve.
pub struct StartupResult {
    pub daemon: DaemonState,
    /// Control socket, served by the multiplexer
    pub control: UnixListener,
    /// Introspection listener
    pub listener: Listener,
}

impl StartupResult {
    /// Serve both sockets until `cancel` fires, then shut down.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), LifecycleError> {
        let StartupResult { mut daemon, control, listener } = self;

        daemon.mux.start().await;
        let mux = daemon.mux.clone();
        let control_task = tokio::spawn({
            let cancel = cancel.child_token();
            async move { mux.serve_unix(control, cancel).await }
        });
        let listener_task = tokio::spawn(listener.run(cancel.child_token()));
        info!(
            control = %daemon.config.control_socket.display(),
            stats = %daemon.config.stats_socket.display(),
            "daemon ready"
        );

        cancel.cancelled().await;
        for (name, task) in [("control", control_task), ("introspection", listener_task)] {
            if let Err(e) = task.await {
                warn!("{} listener task failed: {}", name, e);
            }
        }
        daemon.mux.stop().await;
        daemon.shutdown()
    }
}

impl DaemonState {
    /// Shutdown the daemon gracefully.
    pub fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!(uptime_secs = self.start_time.elapsed().as_secs(), "Shutting down daemon...");

        // 1. Remove socket files
        for socket in [&self.config.control_socket, &self.config.stats_socket] {
            if socket.exists() {
                if let Err(e) = std::fs::remove_file(socket) {
                    warn!("Failed to remove socket file {}: {}", socket.display(), e);
                }
            }
        }

        // 2. Remove PID file
        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        // 3. Lock file is released automatically when self.lock_file is dropped

        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("Failed to bind TCP listener on {0}: {1}")]
    TcpBindFailed(String, std::io::Error),

    #[error("Route configuration error: {0}")]
    Routes(#[from] MuxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
