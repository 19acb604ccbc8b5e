// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ctldash: polling monitor for the ctl introspection service.
//!
//! [`client::MonitorClient`] polls named items over TCP or a Unix socket,
//! [`rates::RateTracker`] derives queue and completion rates between polls,
//! and [`dashboard::Dashboard`] drives both on a fixed cadence.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod client;
pub mod color;
pub mod dashboard;
pub mod error;
pub mod exit_error;
pub mod rates;
pub mod render;

pub use client::{MonitorClient, Target, DEFAULT_PORT};
pub use dashboard::{Dashboard, DashOptions, Snapshot};
pub use error::DashError;
pub use exit_error::ExitError;
pub use rates::{Counters, MetricSample, RateTracker, Rates};
