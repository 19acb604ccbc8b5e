// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ctl daemon library
//!
//! Hosts the control multiplexer routes, the in-memory job and request
//! ledgers, and the line-oriented introspection service.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod env;
pub mod ledger;
pub mod lifecycle;
pub mod listener;
pub mod routes;

pub use lifecycle::{startup, Config, DaemonState, LifecycleError, StartupResult};
