// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control routes served on the daemon's multiplexed control socket.

mod jobs;
mod logging;

use std::str::FromStr;
use std::sync::Arc;

use ctl_core::Clock;
use ctl_mux::{MuxError, RouteRegistryBuilder};
use ctl_wire::FieldBox;
use thiserror::Error;

use crate::ledger::{JobLedger, RequestStats};

pub use jobs::{JobCommand, JobsRoute};
pub use logging::LoggingRoute;

/// Route of job scheduling control
pub const JOBS_ROUTE: &str = "jobs";

/// Route of logging control
pub const LOGGING_ROUTE: &str = "logging";

/// Register the daemon's routes, jobs first.
pub fn register<C: Clock + 'static>(
    builder: &mut RouteRegistryBuilder,
    jobs: Arc<JobLedger>,
    requests: Arc<RequestStats<C>>,
) -> Result<(), MuxError> {
    builder.register(JOBS_ROUTE, JobsRoute::new(jobs))?;
    builder.register(LOGGING_ROUTE, LoggingRoute::new(requests))?;
    Ok(())
}

/// A control box a route could not act on.
#[derive(Debug, Error, PartialEq)]
pub enum RouteError {
    #[error("missing field {0:?}")]
    MissingField(&'static str),

    #[error("invalid value {value:?} for field {field:?}")]
    InvalidField { field: &'static str, value: String },

    #[error("unknown command {0:?}")]
    UnknownCommand(String),
}

fn required<'a>(b: &'a FieldBox, field: &'static str) -> Result<&'a str, RouteError> {
    let raw = b.get(field).ok_or(RouteError::MissingField(field))?;
    std::str::from_utf8(raw).map_err(|_| RouteError::InvalidField {
        field,
        value: String::from_utf8_lossy(raw).into_owned(),
    })
}

fn parsed<T: FromStr>(b: &FieldBox, field: &'static str) -> Result<T, RouteError> {
    let raw = required(b, field)?;
    raw.trim().parse().map_err(|_| RouteError::InvalidField { field, value: raw.to_string() })
}

fn parsed_or<T: FromStr>(b: &FieldBox, field: &'static str, default: T) -> Result<T, RouteError> {
    if b.contains_key(field) {
        parsed(b, field)
    } else {
        Ok(default)
    }
}
