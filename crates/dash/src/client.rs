// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Introspection client.
//!
//! One request line per poll; every failure degrades to an empty result and
//! drops the connection so the next poll reconnects.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use ctl_wire::line;
use indexmap::IndexSet;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpStream, UnixStream};
use tracing::debug;

use crate::DashError;

/// Default TCP port of the introspection service
pub const DEFAULT_PORT: u16 = 8100;

/// Default bound on one poll round trip
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the introspection service listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Tcp { host: String, port: u16 },
    Unix(PathBuf),
}

impl Target {
    /// Parse `host:port`, bare `host` (port 8100) or `unix:<path>`. IPv6
    /// literals must be bracketed.
    pub fn parse(s: &str) -> Result<Self, DashError> {
        let invalid = || DashError::InvalidTarget(s.to_string());
        if let Some(path) = s.strip_prefix("unix:") {
            if path.is_empty() {
                return Err(invalid());
            }
            return Ok(Target::Unix(PathBuf::from(path)));
        }
        let (host, port) = match s.rsplit_once(':') {
            // Bracketed IPv6 without a port
            Some((_, rest)) if rest.ends_with(']') => (s, DEFAULT_PORT),
            Some((host, port)) => (host, port.parse::<u16>().map_err(|_| invalid())?),
            None => (s, DEFAULT_PORT),
        };
        let bracketed = host.starts_with('[') && host.ends_with(']');
        if host.is_empty() || host.contains(char::is_whitespace) || (host.contains(':') && !bracketed) {
            return Err(invalid());
        }
        Ok(Target::Tcp { host: host.to_string(), port })
    }
}

impl FromStr for Target {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Tcp { host, port } => write!(f, "{host}:{port}"),
            Target::Unix(path) => write!(f, "unix:{}", path.display()),
        }
    }
}

/// Why a poll came back empty. Logged, never surfaced.
#[derive(Debug, Error)]
enum PollError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("timed out")]
    Timeout,

    #[error("connection closed by server")]
    Closed,

    #[error("malformed reply {0:?}")]
    Malformed(String),
}

trait Stream: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> Stream for T {}

type Connection = BufReader<Box<dyn Stream>>;

async fn connect(target: &Target) -> Result<Connection, PollError> {
    let stream: Box<dyn Stream> = match target {
        Target::Tcp { host, port } => Box::new(TcpStream::connect(format!("{host}:{port}")).await?),
        Target::Unix(path) => Box::new(UnixStream::connect(path).await?),
    };
    Ok(BufReader::new(stream))
}

/// Polls the introspection service for a subscribed set of items.
pub struct MonitorClient {
    target: Target,
    timeout: Duration,
    conn: Option<Connection>,
    items: IndexSet<String>,
    data: Map<String, Value>,
}

impl MonitorClient {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            timeout: DEFAULT_TIMEOUT,
            conn: None,
            items: IndexSet::new(),
            data: Map::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Subscribe to `name`. Returns false if already subscribed.
    pub fn add_item(&mut self, name: impl Into<String>) -> bool {
        self.items.insert(name.into())
    }

    /// Unsubscribe from `name`, dropping its last value.
    pub fn remove_item(&mut self, name: &str) -> bool {
        self.data.remove(name);
        self.items.shift_remove(name)
    }

    pub fn items(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    /// Data from the last [`update`](Self::update).
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Poll every subscribed item and keep the result as current data.
    pub async fn update(&mut self) -> &Map<String, Value> {
        let names: Vec<String> = self.items.iter().cloned().collect();
        self.data = self.poll(&names).await;
        &self.data
    }

    /// Poll a single item outside the subscription.
    pub async fn get_one_item(&mut self, name: &str) -> Option<Value> {
        self.poll(&[name.to_string()]).await.remove(name)
    }

    /// Send one request for `names` and return the decoded reply; empty on
    /// any failure.
    pub async fn poll(&mut self, names: &[String]) -> Map<String, Value> {
        let unique: IndexSet<&str> = names.iter().map(String::as_str).collect();
        if unique.is_empty() {
            return Map::new();
        }
        let names: Vec<String> = unique.into_iter().map(str::to_owned).collect();
        let request = line::encode_request(&names);

        let result = match tokio::time::timeout(self.timeout, self.exchange(&request)).await {
            Ok(result) => result,
            Err(_) => Err(PollError::Timeout),
        };
        match result {
            Ok(reply) => reply,
            Err(e) => {
                debug!(server = %self.target, error = %e, "poll failed, dropping connection");
                self.conn = None;
                Map::new()
            }
        }
    }

    async fn exchange(&mut self, request: &str) -> Result<Map<String, Value>, PollError> {
        if self.conn.is_none() {
            self.conn = Some(connect(&self.target).await?);
            debug!(server = %self.target, "connected");
        }
        let Some(conn) = self.conn.as_mut() else {
            return Err(PollError::Closed);
        };

        let stream = conn.get_mut();
        stream.write_all(format!("{request}\r\n").as_bytes()).await?;
        stream.flush().await?;

        let mut reply = String::new();
        if conn.read_line(&mut reply).await? == 0 {
            return Err(PollError::Closed);
        }
        line::decode_reply(&reply).ok_or_else(|| PollError::Malformed(reply.trim().to_string()))
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
