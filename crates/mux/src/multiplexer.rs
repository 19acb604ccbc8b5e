// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The listening or connecting endpoint of multiplexed control connections.

use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs, UnixListener, UnixStream};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::connection;
use crate::{ConnectionInfo, Disconnect, DispatchingReceiver, MuxError, Peer, RouteRegistry};

/// Builds one session per registered route for every physical connection and
/// drives those connections.
#[derive(Clone)]
pub struct ControlMultiplexer {
    registry: RouteRegistry,
    next_id: Arc<AtomicU64>,
}

impl ControlMultiplexer {
    pub fn new(registry: RouteRegistry) -> Self {
        Self { registry, next_id: Arc::new(AtomicU64::new(1)) }
    }

    pub fn registry(&self) -> &RouteRegistry {
        &self.registry
    }

    /// Instantiate a session for every route, in registration order.
    pub fn build_connection(&self, peer: Peer) -> DispatchingReceiver {
        let conn = ConnectionInfo { id: self.next_id.fetch_add(1, Ordering::Relaxed), peer };
        DispatchingReceiver::new(
            self.registry.iter().map(|(route, factory)| (route.clone(), factory.build(&conn))).collect(),
        )
    }

    /// Run every factory's start hook, in registration order.
    pub async fn start(&self) {
        for (route, factory) in self.registry.iter() {
            info!(route = %route, "starting route");
            factory.start().await;
        }
    }

    /// Run every factory's stop hook, in registration order.
    pub async fn stop(&self) {
        for (route, factory) in self.registry.iter() {
            info!(route = %route, "stopping route");
            factory.stop().await;
        }
    }

    /// Run one connection over an already split stream until it ends.
    pub async fn drive<R, W>(
        &self,
        reader: R,
        writer: W,
        peer: Peer,
        cancel: CancellationToken,
    ) -> Disconnect
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let receiver = self.build_connection(peer);
        connection::run(reader, writer, receiver, cancel).await
    }

    /// Accept connections on a Unix socket until `cancel` fires, one task per
    /// connection. Returns once every connection's sessions have stopped.
    pub async fn serve_unix(&self, listener: UnixListener, cancel: CancellationToken) {
        let mut connections = JoinSet::new();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
                result = listener.accept() => match result {
                    Ok((stream, _)) => {
                        let (reader, writer) = stream.into_split();
                        connections.spawn(self.connection(reader, writer, Peer::Unix, cancel.child_token()));
                    }
                    Err(e) => error!("Unix accept error: {}", e),
                },
            }
        }
        wait_for_connections(connections).await;
    }

    /// Accept connections on a TCP listener until `cancel` fires. Returns once
    /// every connection's sessions have stopped.
    pub async fn serve_tcp(&self, listener: TcpListener, cancel: CancellationToken) {
        let mut connections = JoinSet::new();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
                result = listener.accept() => match result {
                    Ok((stream, addr)) => {
                        debug!("TCP connection from {}", addr);
                        let (reader, writer) = stream.into_split();
                        connections.spawn(self.connection(reader, writer, Peer::Tcp(addr), cancel.child_token()));
                    }
                    Err(e) => error!("TCP accept error: {}", e),
                },
            }
        }
        wait_for_connections(connections).await;
    }

    /// Connect to a multiplexer listening on a Unix socket.
    pub async fn connect_unix(&self, path: impl AsRef<Path>) -> Result<MuxHandle, MuxError> {
        let stream = UnixStream::connect(path).await?;
        let (reader, writer) = stream.into_split();
        let cancel = CancellationToken::new();
        let task = self.spawn_connection(reader, writer, Peer::Unix, cancel.clone());
        Ok(MuxHandle { cancel, task })
    }

    /// Connect to a multiplexer listening on TCP.
    pub async fn connect_tcp(&self, addr: impl ToSocketAddrs) -> Result<MuxHandle, MuxError> {
        let stream = TcpStream::connect(addr).await?;
        let peer = Peer::Tcp(stream.peer_addr()?);
        let (reader, writer) = stream.into_split();
        let cancel = CancellationToken::new();
        let task = self.spawn_connection(reader, writer, peer, cancel.clone());
        Ok(MuxHandle { cancel, task })
    }

    fn spawn_connection<R, W>(
        &self,
        reader: R,
        writer: W,
        peer: Peer,
        cancel: CancellationToken,
    ) -> JoinHandle<Disconnect>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        tokio::spawn(self.connection(reader, writer, peer, cancel))
    }

    fn connection<R, W>(
        &self,
        reader: R,
        writer: W,
        peer: Peer,
        cancel: CancellationToken,
    ) -> impl Future<Output = Disconnect> + Send + 'static
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let mux = self.clone();
        async move {
            let peer_name = peer.to_string();
            let reason = mux.drive(reader, writer, peer, cancel).await;
            log_disconnect(&peer_name, &reason);
            reason
        }
    }
}

async fn wait_for_connections(mut connections: JoinSet<Disconnect>) {
    while let Some(result) = connections.join_next().await {
        if let Err(e) = result {
            error!("control connection task failed: {}", e);
        }
    }
}

fn log_disconnect(peer: &str, reason: &Disconnect) {
    match reason {
        Disconnect::Error(_) => error!(peer, %reason, "control connection failed"),
        _ => debug!(peer, %reason, "control connection closed"),
    }
}

/// A running outbound connection.
pub struct MuxHandle {
    cancel: CancellationToken,
    task: JoinHandle<Disconnect>,
}

impl MuxHandle {
    /// Wait for the connection to end on its own.
    pub async fn join(self) -> Disconnect {
        match self.task.await {
            Ok(reason) => reason,
            Err(e) => Disconnect::Error(format!("connection task failed: {e}")),
        }
    }

    /// Stop the connection and wait for its sessions to be stopped.
    pub async fn close(self) -> Disconnect {
        self.cancel.cancel();
        self.join().await
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(test)]
#[path = "multiplexer_tests.rs"]
mod tests;
