// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use ctl_core::RouteKey;
use ctl_wire::ProtocolError;
use thiserror::Error;

use crate::ROUTE_FIELD;

/// Errors from route registration and multiplexed connections.
///
/// Registration errors are configuration mistakes and fatal at startup.
/// Routing errors mean the two ends disagree about the protocol and are
/// fatal for the connection that produced them.
#[derive(Debug, Error)]
pub enum MuxError {
    #[error("route {0} is already registered")]
    DuplicateRoute(RouteKey),

    #[error("route key must not be empty")]
    EmptyRouteKey,

    #[error("no routes registered")]
    NoRoutes,

    #[error("box addressed to unknown route {0:?}")]
    UnknownRoute(String),

    #[error("box carries no {ROUTE_FIELD} field")]
    MissingRoute,

    #[error("application box already carries the reserved {ROUTE_FIELD} field")]
    ReservedField,

    #[error("connection transport is closed")]
    TransportClosed,

    #[error("session on route {route} failed: {message}")]
    Session { route: RouteKey, message: String },

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
