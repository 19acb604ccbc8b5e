// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and initialization logic.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use ctl_core::SystemClock;
use ctl_mux::{ControlMultiplexer, RouteRegistryBuilder};
use fs2::FileExt;
use tokio::net::{TcpListener, UnixListener};
use tracing::info;

use crate::adapters::Collaborators;
use crate::ledger::{JobLedger, RequestStats};
use crate::listener::{ListenCtx, Listener, QueryTable};
use crate::routes;

use super::{Config, DaemonState, LifecycleError, StartupResult};

/// Start the daemon
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // Don't clean up if we failed to acquire the lock;
            // those files belong to the already-running daemon.
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner(config: &Config) -> Result<StartupResult, LifecycleError> {
    // 1. Create state directory (needed for sockets, lock, etc.)
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Acquire lock file FIRST - prevents races
    // Open without truncating so a running daemon's PID survives.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    // Write PID to lock file (truncate now that we hold the lock)
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file; // Drop mutability

    // 3. Create directories
    for socket in [&config.control_socket, &config.stats_socket] {
        if let Some(parent) = socket.parent() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // 4. Ledgers and routes
    let jobs = Arc::new(JobLedger::new(config.worker_capacity));
    let requests = Arc::new(RequestStats::new(SystemClock));
    let mut builder = RouteRegistryBuilder::new();
    routes::register(&mut builder, Arc::clone(&jobs), Arc::clone(&requests))?;
    let registry = builder.build()?;
    info!(routes = ?registry.keys().collect::<Vec<_>>(), "control routes registered");
    let mux = ControlMultiplexer::new(registry);

    let collaborators = Collaborators::new()
        .with_stats(requests.clone())
        .with_queue(jobs.clone())
        .with_pool(jobs.clone());
    let ctx = Arc::new(ListenCtx::from_env(QueryTable::builtin(collaborators)));

    // 5. Remove stale sockets and bind (LAST - only after all validation passes)
    let control = bind_unix(&config.control_socket)?;
    let stats = bind_unix(&config.stats_socket)?;
    let listener = match &config.stats_addr {
        Some((host, port)) => {
            let addr = format!("{host}:{port}");
            let tcp = TcpListener::bind(&addr)
                .await
                .map_err(|e| LifecycleError::TcpBindFailed(addr.clone(), e))?;
            info!(%addr, "introspection listening on tcp");
            Listener::with_tcp(stats, tcp, ctx)
        }
        None => Listener::new(stats, ctx),
    };

    info!(pid = std::process::id(), state_dir = %config.state_dir.display(), "daemon started");

    Ok(StartupResult {
        daemon: DaemonState {
            config: config.clone(),
            lock_file,
            jobs,
            requests,
            mux,
            start_time: Instant::now(),
        },
        control,
        listener,
    })
}

fn bind_unix(path: &Path) -> Result<UnixListener, LifecycleError> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    UnixListener::bind(path).map_err(|e| LifecycleError::BindFailed(path.to_path_buf(), e))
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    // Remove sockets if we created them
    for socket in [&config.control_socket, &config.stats_socket] {
        if socket.exists() {
            let _ = std::fs::remove_file(socket);
        }
    }

    // Remove PID/lock file
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
