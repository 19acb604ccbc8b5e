// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Introspection service.
//!
//! Operators connect over the Unix socket or TCP and send one request per
//! line: a JSON array of query names, answered with one JSON object per line.
//! Each connection runs in its own task and serves requests until the peer
//! sends `exit`/`quit` or hangs up.

mod handlers;
mod query;

pub use query::{Extract, Handler, QueryHandler, QueryTable};

use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use ctl_wire::line::{self, Command, BAD_COMMAND, EXIT_ACK};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, UnixListener};
use tokio_util::codec::{Decoder, LinesCodec, LinesCodecError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::env::{ipc_timeout, max_queries, max_request_bytes};

/// Shared context for all introspection connections.
pub struct ListenCtx {
    pub table: QueryTable,
    /// Longest request line accepted
    pub max_request_bytes: usize,
    /// Most distinct names accepted in one request
    pub max_queries: usize,
    /// Bound on writing one response
    pub write_timeout: Duration,
}

impl ListenCtx {
    /// Context with limits taken from the environment.
    pub fn from_env(table: QueryTable) -> Self {
        Self {
            table,
            max_request_bytes: max_request_bytes(),
            max_queries: max_queries(),
            write_timeout: ipc_timeout(),
        }
    }
}

/// Listener task for accepting introspection connections.
pub struct Listener {
    unix: UnixListener,
    tcp: Option<TcpListener>,
    ctx: Arc<ListenCtx>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("timed out writing response")]
    Timeout,
}

impl Listener {
    /// Create a new listener with Unix socket only.
    pub fn new(unix: UnixListener, ctx: Arc<ListenCtx>) -> Self {
        Self { unix, tcp: None, ctx }
    }

    /// Create a new listener with both Unix socket and TCP.
    pub fn with_tcp(unix: UnixListener, tcp: TcpListener, ctx: Arc<ListenCtx>) -> Self {
        Self { unix, tcp: Some(tcp), ctx }
    }

    /// Bound TCP address, if listening on TCP.
    pub fn tcp_addr(&self) -> Option<std::net::SocketAddr> {
        self.tcp.as_ref().and_then(|tcp| tcp.local_addr().ok())
    }

    /// Accept connections until `cancel` fires, spawning a task for each.
    pub async fn run(self, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.unix.accept() => match result {
                    Ok((stream, _)) => {
                        let (reader, writer) = stream.into_split();
                        spawn_connection(reader, writer, &self.ctx, &cancel);
                    }
                    Err(e) => error!("Unix accept error: {}", e),
                },
                result = accept_tcp(self.tcp.as_ref()) => match result {
                    Ok((stream, addr)) => {
                        debug!("TCP connection from {}", addr);
                        let (reader, writer) = stream.into_split();
                        spawn_connection(reader, writer, &self.ctx, &cancel);
                    }
                    Err(e) => error!("TCP accept error: {}", e),
                },
            }
        }
    }
}

async fn accept_tcp(
    tcp: Option<&TcpListener>,
) -> std::io::Result<(tokio::net::TcpStream, std::net::SocketAddr)> {
    match tcp {
        Some(tcp) => tcp.accept().await,
        None => std::future::pending().await,
    }
}

/// Connections are dropped, closing their sockets, once `cancel` fires.
fn spawn_connection<R, W>(reader: R, writer: W, ctx: &Arc<ListenCtx>, cancel: &CancellationToken)
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let ctx = Arc::clone(ctx);
    let cancel = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => debug!("closing introspection connection on shutdown"),
            result = handle_connection(reader, writer, &ctx) => {
                if let Err(e) = result {
                    log_connection_error(e);
                }
            }
        }
    });
}

fn log_connection_error(e: ConnectionError) {
    match e {
        ConnectionError::Io(ref io) if io.kind() == std::io::ErrorKind::BrokenPipe => {
            debug!("Client disconnected")
        }
        ConnectionError::Timeout => warn!("Connection timeout"),
        _ => error!("Connection error: {}", e),
    }
}

/// Serve one client until it sends a termination token or hangs up.
///
/// Malformed requests are answered with the bad-command sentinel and the
/// connection stays open. Generic over reader/writer types so it works with
/// both Unix and TCP streams.
pub async fn handle_connection<R, W>(
    mut reader: R,
    mut writer: W,
    ctx: &ListenCtx,
) -> Result<(), ConnectionError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut codec = LinesCodec::new_with_max_length(ctx.max_request_bytes);
    let mut buf = BytesMut::with_capacity(1024);

    loop {
        let request = match codec.decode(&mut buf) {
            Ok(Some(request)) => request,
            Ok(None) => {
                if reader.read_buf(&mut buf).await? == 0 {
                    debug!("Client disconnected");
                    return Ok(());
                }
                continue;
            }
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                debug!(max = ctx.max_request_bytes, "request line too long");
                write_line(&mut writer, BAD_COMMAND, ctx.write_timeout).await?;
                continue;
            }
            Err(LinesCodecError::Io(e)) => {
                debug!(error = %e, "undecodable request line");
                write_line(&mut writer, BAD_COMMAND, ctx.write_timeout).await?;
                continue;
            }
        };

        let reply = match line::parse_command(&request, ctx.max_queries) {
            Ok(Command::Exit) => {
                write_line(&mut writer, EXIT_ACK, ctx.write_timeout).await?;
                writer.shutdown().await?;
                return Ok(());
            }
            Ok(Command::Query(names)) => {
                debug!(queries = ?names, "introspection request");
                line::encode_reply(&ctx.table.resolve(&names).await)
            }
            Err(e) => {
                debug!(error = %e, "bad command");
                BAD_COMMAND.to_string()
            }
        };
        write_line(&mut writer, &reply, ctx.write_timeout).await?;
    }
}

async fn write_line<W: AsyncWrite + Unpin>(
    writer: &mut W,
    line: &str,
    timeout: Duration,
) -> Result<(), ConnectionError> {
    let mut out = Vec::with_capacity(line.len() + 2);
    out.extend_from_slice(line.as_bytes());
    out.extend_from_slice(b"\r\n");
    tokio::time::timeout(timeout, async {
        writer.write_all(&out).await?;
        writer.flush().await
    })
    .await
    .map_err(|_| ConnectionError::Timeout)??;
    Ok(())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
