// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-route sessions and the factories that build them.

use std::fmt;
use std::net::SocketAddr;

use async_trait::async_trait;
use ctl_wire::FieldBox;

use crate::{Disconnect, DispatchingSender};

/// Remote end of a physical connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Peer {
    Unix,
    Tcp(SocketAddr),
    /// In-process stream, named by the caller
    Local(String),
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Peer::Unix => f.write_str("unix"),
            Peer::Tcp(addr) => write!(f, "tcp:{addr}"),
            Peer::Local(name) => write!(f, "local:{name}"),
        }
    }
}

/// Identity of one physical connection, handed to every factory that builds a
/// session for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Unique per multiplexer for the life of the process
    pub id: u64,
    pub peer: Peer,
}

/// One route's end of one physical connection.
///
/// A session only ever sees boxes addressed to its own route, with the route
/// field already stripped. Calls are serialized per connection, so boxes are
/// delivered in the order the peer sent them.
#[async_trait]
pub trait Session: Send + 'static {
    /// The connection is up. `sender` is bound to this session's route.
    async fn started(&mut self, sender: DispatchingSender);

    /// A box addressed to this route arrived.
    async fn box_received(&mut self, b: FieldBox);

    /// The connection is gone; no further calls follow.
    async fn stopped(&mut self, reason: &Disconnect);
}

/// Builds a fresh [`Session`] for every physical connection.
///
/// `start` and `stop` mirror the multiplexer's own lifecycle and default to
/// doing nothing.
#[async_trait]
pub trait SessionFactory: Send + Sync + 'static {
    fn build(&self, conn: &ConnectionInfo) -> Box<dyn Session>;

    async fn start(&self) {}

    async fn stop(&self) {}
}
