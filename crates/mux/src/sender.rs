// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound side: route-stamping senders over a shared transport.

use std::sync::Arc;

use ctl_core::RouteKey;
use ctl_wire::FieldBox;
use tokio::sync::mpsc;

use crate::{MuxError, ROUTE_FIELD};

/// The physical connection's outbound path, shared by all routes.
pub trait BoxTransport: Send + Sync + 'static {
    /// Queue an already-tagged box for writing.
    fn send_box(&self, b: FieldBox) -> Result<(), MuxError>;

    /// Tear the connection down because of `err`.
    fn report_error(&self, err: MuxError);
}

pub(crate) enum Outbound {
    Box(FieldBox),
    Fail(MuxError),
}

/// Transport feeding the writer task of one physical connection.
#[derive(Clone)]
pub struct ConnectionTransport {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl ConnectionTransport {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Outbound>) -> Self {
        Self { tx }
    }
}

impl BoxTransport for ConnectionTransport {
    fn send_box(&self, b: FieldBox) -> Result<(), MuxError> {
        self.tx.send(Outbound::Box(b)).map_err(|_| MuxError::TransportClosed)
    }

    fn report_error(&self, err: MuxError) {
        if let Err(mpsc::error::SendError(Outbound::Fail(err))) = self.tx.send(Outbound::Fail(err)) {
            tracing::debug!(error = %err, "error reported after connection closed");
        }
    }
}

/// A route's handle on the shared transport.
///
/// Every box sent through it carries the bound route key on the wire.
#[derive(Clone)]
pub struct DispatchingSender {
    route: RouteKey,
    transport: Arc<dyn BoxTransport>,
}

impl DispatchingSender {
    pub fn new(route: RouteKey, transport: Arc<dyn BoxTransport>) -> Self {
        Self { route, transport }
    }

    pub fn route(&self) -> &RouteKey {
        &self.route
    }

    /// Send a copy of `b` tagged with this sender's route. `b` itself is left
    /// untouched.
    pub fn send(&self, b: &FieldBox) -> Result<(), MuxError> {
        if b.contains_key(ROUTE_FIELD) {
            return Err(MuxError::ReservedField);
        }
        let mut tagged = b.clone();
        tagged.insert(ROUTE_FIELD, self.route.as_bytes());
        self.transport.send_box(tagged)
    }

    /// Fail the whole connection on behalf of this route.
    pub fn report_error(&self, message: impl Into<String>) {
        self.transport
            .report_error(MuxError::Session { route: self.route.clone(), message: message.into() });
    }
}

impl std::fmt::Debug for DispatchingSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchingSender").field("route", &self.route).finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "sender_tests.rs"]
mod tests;
