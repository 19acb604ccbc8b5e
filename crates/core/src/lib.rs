// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ctl-core: shared primitives for the control multiplexer, the daemon and
//! the dashboard.

pub mod macros;

pub mod clock;
pub mod metrics;
pub mod route;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "test-support"))]
pub use clock::FakeClock;
pub use metrics::{
    DirectoryCall, DirectoryReport, JobAssignments, JobHistogram, RequestWindow, SlotStatus,
    SlotsReport, StatsReport, SystemStats, WorkTypeCounts, WorkerLoad,
};
pub use route::RouteKey;
