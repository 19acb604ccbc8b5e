// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Default TCP port of the introspection service
pub const DEFAULT_STATS_PORT: u16 = 8100;

/// Resolve state directory: CTL_STATE_DIR > XDG_STATE_HOME/ctl > ~/.local/state/ctl
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("CTL_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("ctl"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/ctl"))
}

/// Control socket override; defaults to `<state_dir>/control.sock`.
pub fn control_socket() -> Option<PathBuf> {
    std::env::var("CTL_CONTROL_SOCKET").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// TCP port of the introspection service. `0` disables the TCP listener.
pub fn stats_port() -> Option<u16> {
    match std::env::var("CTL_STATS_PORT").ok().and_then(|s| s.parse::<u16>().ok()) {
        Some(0) => None,
        Some(port) => Some(port),
        None => Some(DEFAULT_STATS_PORT),
    }
}

/// Address the introspection TCP listener binds to (default loopback).
pub fn stats_host() -> String {
    std::env::var("CTL_STATS_HOST").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| "127.0.0.1".into())
}

/// Default IPC timeout
pub fn ipc_timeout() -> Duration {
    std::env::var("CTL_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Longest introspection request line accepted, in bytes (default 64 KiB).
pub fn max_request_bytes() -> usize {
    std::env::var("CTL_MAX_REQUEST_BYTES")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(64 * 1024)
}

/// Most distinct query names accepted in one request (default 256).
pub fn max_queries() -> usize {
    std::env::var("CTL_MAX_QUERIES")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(256)
}

/// In-flight jobs one worker is expected to carry at full load (default 5).
pub fn worker_capacity() -> u64 {
    std::env::var("CTL_WORKER_CAPACITY")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(5)
}

/// Mirror daemon logs to stderr
pub fn log_stderr() -> bool {
    std::env::var("CTL_LOG_STDERR").is_ok_and(|v| !v.is_empty() && v != "0")
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
