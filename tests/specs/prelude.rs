// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for specs.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

pub use std::time::Duration;

pub use ctl_daemon::ledger::JobLedger;
pub use ctl_wire::FieldBox;
pub use serde_json::{json, Value};
use ctl_daemon::{startup, Config, LifecycleError};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Upper bound on waiting for asynchronous effects
pub const SPEC_WAIT_MAX: Duration = Duration::from_secs(5);

/// Poll `check` every 10ms until it holds or `max` elapses.
pub async fn wait_for(max: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + max;
    loop {
        if check() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// A daemon running in a temporary state directory, with TCP introspection
/// on an ephemeral loopback port.
pub struct TestDaemon {
    pub dir: TempDir,
    pub config: Config,
    pub tcp: SocketAddr,
    pub jobs: Arc<JobLedger>,
    cancel: CancellationToken,
    task: JoinHandle<Result<(), LifecycleError>>,
}

impl TestDaemon {
    pub async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::for_state_dir(dir.path().join("state"));
        config.stats_addr = Some(("127.0.0.1".to_string(), 0));

        let result = startup(&config).await.unwrap();
        let tcp = result.listener.tcp_addr().unwrap();
        let jobs = Arc::clone(&result.daemon.jobs);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(result.run(cancel.clone()));

        Self { dir, config, tcp, jobs, cancel, task }
    }

    pub fn stats_socket(&self) -> PathBuf {
        self.config.stats_socket.clone()
    }

    pub async fn control(&self) -> UnixStream {
        UnixStream::connect(&self.config.control_socket).await.unwrap()
    }

    pub async fn introspect(&self) -> LineClient {
        LineClient::new(UnixStream::connect(&self.config.stats_socket).await.unwrap())
    }

    /// Cancel and wait for a clean shutdown.
    pub async fn stop(self) -> Config {
        self.cancel.cancel();
        tokio::time::timeout(SPEC_WAIT_MAX, self.task).await.unwrap().unwrap().unwrap();
        self.config
    }
}

/// Raw line-protocol client.
pub struct LineClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    write: OwnedWriteHalf,
}

impl LineClient {
    pub fn new(stream: UnixStream) -> Self {
        let (read, write) = stream.into_split();
        Self { lines: BufReader::new(read).lines(), write }
    }

    pub async fn send(&mut self, line: &str) {
        self.write.write_all(format!("{line}\r\n").as_bytes()).await.unwrap();
    }

    /// Next response line, `None` once the server has closed.
    pub async fn recv(&mut self) -> Option<String> {
        tokio::time::timeout(SPEC_WAIT_MAX, self.lines.next_line()).await.unwrap().unwrap()
    }

    pub async fn request(&mut self, line: &str) -> String {
        self.send(line).await;
        self.recv().await.unwrap()
    }

    pub async fn query(&mut self, line: &str) -> Value {
        serde_json::from_str(&self.request(line).await).unwrap()
    }
}

/// Send a job control box and wait for its acknowledgement.
pub async fn job_command(control: &mut UnixStream, fields: &[(&str, &str)]) -> FieldBox {
    let mut b = FieldBox::new().with("_route", "jobs");
    for (key, value) in fields {
        b.insert(*key, *value);
    }
    ctl_wire::write_box(control, &b).await.unwrap();
    ctl_wire::read_box_timeout(control, SPEC_WAIT_MAX).await.unwrap()
}
