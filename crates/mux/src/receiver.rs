// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound side: route demultiplexing and lifecycle fan-out.

use std::sync::Arc;

use ctl_core::RouteKey;
use ctl_wire::FieldBox;
use indexmap::IndexMap;
use tracing::debug;

use crate::{BoxTransport, Disconnect, DispatchingSender, MuxError, Session, ROUTE_FIELD};

/// The sessions of one physical connection, keyed by route.
///
/// The route set is fixed when the connection is built.
pub struct DispatchingReceiver {
    sessions: IndexMap<RouteKey, Box<dyn Session>>,
}

impl DispatchingReceiver {
    pub fn new(sessions: IndexMap<RouteKey, Box<dyn Session>>) -> Self {
        Self { sessions }
    }

    pub fn routes(&self) -> impl Iterator<Item = &RouteKey> {
        self.sessions.keys()
    }

    /// Start every session, in registration order, each with a sender bound
    /// to its own route.
    ///
    /// Not atomic: a session started early may already be sending when a
    /// later one is still starting.
    pub async fn connection_established(&mut self, transport: Arc<dyn BoxTransport>) {
        for (route, session) in self.sessions.iter_mut() {
            debug!(route = %route, "starting session");
            session.started(DispatchingSender::new(route.clone(), Arc::clone(&transport))).await;
        }
    }

    /// Deliver `b` to the session its route field names, with the field
    /// removed.
    ///
    /// A missing or unknown route is an error; the box is never dropped
    /// silently.
    pub async fn box_received(&mut self, mut b: FieldBox) -> Result<(), MuxError> {
        let raw = b.remove(ROUTE_FIELD).ok_or(MuxError::MissingRoute)?;
        let route = String::from_utf8_lossy(&raw);
        let Some(session) = self.sessions.get_mut(&*route) else {
            return Err(MuxError::UnknownRoute(route.into_owned()));
        };
        debug!(route = %route, fields = b.len(), "box received");
        session.box_received(b).await;
        Ok(())
    }

    /// Tell every session, in registration order, that the connection is
    /// gone.
    pub async fn connection_lost(&mut self, reason: &Disconnect) {
        for (route, session) in self.sessions.iter_mut() {
            debug!(route = %route, %reason, "stopping session");
            session.stopped(reason).await;
        }
    }
}

#[cfg(test)]
#[path = "receiver_tests.rs"]
mod tests;
