// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driving one physical connection: a read loop feeding the receiver and a
//! writer task draining the shared transport.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ctl_wire::{read_box, write_box, ProtocolError};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::sender::Outbound;
use crate::{BoxTransport, ConnectionTransport, DispatchingReceiver, MuxError};

/// How long queued boxes may take to flush once the connection winds down.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Why a connection ended. Every session of the connection receives the same
/// reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disconnect {
    /// The peer closed the stream between boxes
    Closed,
    /// The local side cancelled the connection
    Shutdown,
    /// A transport, protocol or routing error
    Error(String),
}

impl Disconnect {
    pub fn is_error(&self) -> bool {
        matches!(self, Disconnect::Error(_))
    }
}

impl fmt::Display for Disconnect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disconnect::Closed => f.write_str("closed by peer"),
            Disconnect::Shutdown => f.write_str("shutdown"),
            Disconnect::Error(message) => write!(f, "error: {message}"),
        }
    }
}

impl From<MuxError> for Disconnect {
    fn from(e: MuxError) -> Self {
        match e {
            MuxError::Protocol(ProtocolError::ConnectionClosed) => Disconnect::Closed,
            e => Disconnect::Error(e.to_string()),
        }
    }
}

/// Run one connection until the peer goes away, an error occurs or `cancel`
/// fires. Sessions are started first and stopped last.
pub(crate) async fn run<R, W>(
    mut reader: R,
    writer: W,
    mut receiver: DispatchingReceiver,
    cancel: CancellationToken,
) -> Disconnect
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let transport: Arc<dyn BoxTransport> = Arc::new(ConnectionTransport::new(tx));
    let mut writer_task = tokio::spawn(write_loop(writer, rx));
    let mut writer_finished = false;

    receiver.connection_established(Arc::clone(&transport)).await;

    let reason = loop {
        tokio::select! {
            _ = cancel.cancelled() => break Disconnect::Shutdown,
            result = &mut writer_task => {
                writer_finished = true;
                break match result {
                    Ok(Ok(())) => Disconnect::Closed,
                    Ok(Err(e)) => e.into(),
                    Err(e) => Disconnect::Error(format!("writer task failed: {e}")),
                };
            }
            result = read_box(&mut reader) => match result {
                Ok(b) => {
                    if let Err(e) = receiver.box_received(b).await {
                        warn!(error = %e, "misrouted box, closing connection");
                        break e.into();
                    }
                }
                Err(e) => break MuxError::from(e).into(),
            },
        }
    };

    debug!(%reason, "connection finished");
    receiver.connection_lost(&reason).await;
    drop(receiver);
    drop(transport);

    if !writer_finished {
        drain(&mut writer_task, &reason).await;
    }
    reason
}

async fn drain(writer_task: &mut JoinHandle<Result<(), MuxError>>, reason: &Disconnect) {
    if reason.is_error() {
        writer_task.abort();
        return;
    }
    match tokio::time::timeout(DRAIN_TIMEOUT, &mut *writer_task).await {
        Ok(Ok(Err(e))) => debug!(error = %e, "writer failed while draining"),
        Ok(_) => {}
        Err(_) => {
            debug!("writer still busy after drain timeout, aborting");
            writer_task.abort();
        }
    }
}

async fn write_loop<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<Outbound>) -> Result<(), MuxError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(out) = rx.recv().await {
        match out {
            Outbound::Box(b) => write_box(&mut writer, &b).await?,
            Outbound::Fail(e) => return Err(e),
        }
    }
    writer.shutdown().await?;
    Ok(())
}
