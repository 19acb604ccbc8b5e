// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use ctl_wire::FieldBox;
use tempfile::tempdir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio_util::sync::CancellationToken;

use super::{startup, Config};

#[test]
fn for_state_dir_lays_out_files() {
    let config = Config::for_state_dir(PathBuf::from("/tmp/ctl-test"));

    assert_eq!(config.control_socket, PathBuf::from("/tmp/ctl-test/control.sock"));
    assert_eq!(config.stats_socket, PathBuf::from("/tmp/ctl-test/stats.sock"));
    assert_eq!(config.lock_path, PathBuf::from("/tmp/ctl-test/ctld.pid"));
    assert_eq!(config.log_dir, PathBuf::from("/tmp/ctl-test/logs"));
    assert_eq!(config.stats_addr, None);
    assert_eq!(config.worker_capacity, 5);
}

#[tokio::test]
async fn shutdown_removes_sockets_and_pid() {
    let dir = tempdir().unwrap();
    let config = Config::for_state_dir(dir.path().join("state"));
    let mut result = startup(&config).await.unwrap();

    result.daemon.shutdown().unwrap();

    assert!(!config.control_socket.exists());
    assert!(!config.stats_socket.exists());
    assert!(!config.lock_path.exists());
}

#[tokio::test]
async fn run_serves_control_and_introspection_until_cancelled() {
    let dir = tempdir().unwrap();
    let config = Config::for_state_dir(dir.path().join("state"));
    let result = startup(&config).await.unwrap();
    let jobs = result.daemon.jobs.clone();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(result.run(cancel.clone()));

    // Control: enqueue one job through the jobs route.
    let mut control = UnixStream::connect(&config.control_socket).await.unwrap();
    let b = FieldBox::new().with("_route", "jobs").with("command", "enqueued").with("work_type", "email");
    ctl_wire::write_box(&mut control, &b).await.unwrap();
    let reply = ctl_wire::read_box(&mut control).await.unwrap();
    assert_eq!(reply.get_str("ok"), Some("1"));
    assert_eq!(jobs.histogram_snapshot()["email"].queued, 1);

    // Introspection: the job shows up in the jobcount.
    let stats = UnixStream::connect(&config.stats_socket).await.unwrap();
    let (read, mut write) = stats.into_split();
    write.write_all(b"[\"jobcount\"]\n").await.unwrap();
    let mut lines = BufReader::new(read).lines();
    let line = lines.next_line().await.unwrap().unwrap();
    assert_eq!(line, r#"{"jobcount":1}"#);

    drop(control);
    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap().unwrap();
    assert!(!config.control_socket.exists());
    assert!(!config.lock_path.exists());
}

#[tokio::test]
async fn run_stops_open_control_sessions_before_returning() {
    let dir = tempdir().unwrap();
    let config = Config::for_state_dir(dir.path().join("state"));
    let result = startup(&config).await.unwrap();
    let jobs = result.daemon.jobs.clone();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(result.run(cancel.clone()));

    let mut control = UnixStream::connect(&config.control_socket).await.unwrap();
    let b = FieldBox::new().with("_route", "jobs").with("command", "assigned").with("work_type", "email");
    ctl_wire::write_box(&mut control, &b).await.unwrap();
    ctl_wire::read_box(&mut control).await.unwrap();
    assert_eq!(jobs.worker_loads().len(), 1);

    // The connection stays open across shutdown.
    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap().unwrap();
    assert!(jobs.worker_loads().is_empty());
    assert_eq!(jobs.histogram_snapshot()["email"].queued, 1);
    drop(control);
}
