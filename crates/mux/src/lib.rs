// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ctl-mux: several logical control sessions ("routes") sharing one physical
//! stream connection.
//!
//! Every outbound [`FieldBox`](ctl_wire::FieldBox) is stamped with its route
//! key under the reserved [`ROUTE_FIELD`]; every inbound box is dispatched to
//! the session registered for the key it carries, with the field stripped.
//! Sessions see a private connection and never the tag.

mod connection;
mod error;
mod multiplexer;
mod receiver;
mod registry;
mod sender;
mod session;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use connection::Disconnect;
pub use error::MuxError;
pub use multiplexer::{ControlMultiplexer, MuxHandle};
pub use receiver::DispatchingReceiver;
pub use registry::{RouteRegistry, RouteRegistryBuilder};
pub use sender::{BoxTransport, ConnectionTransport, DispatchingSender};
pub use session::{ConnectionInfo, Peer, Session, SessionFactory};

/// Box field carrying the route key. Reserved for the multiplexer.
pub const ROUTE_FIELD: &str = "_route";
