// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logging control.
//!
//! Children report each completed request (`command=request` with `method`,
//! `status`, `seconds` and optionally `write_seconds`, `slots`, `cpu`) and
//! periodic host figures (`command=system`). Nothing is sent back.

use std::sync::Arc;

use async_trait::async_trait;
use ctl_core::Clock;
use ctl_mux::{ConnectionInfo, Disconnect, DispatchingSender, Session, SessionFactory};
use ctl_wire::FieldBox;
use tracing::warn;

use super::{parsed, parsed_or, required, RouteError};
use crate::ledger::{RequestRecord, RequestStats};

/// What a logging box asks for.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum LogEntry {
    Request(RequestRecord),
    System { cpu_use: f64, memory_percent: f64, memory_used: u64 },
}

pub(super) fn parse(b: &FieldBox) -> Result<LogEntry, RouteError> {
    match required(b, "command")? {
        "request" => Ok(LogEntry::Request(RequestRecord {
            method: required(b, "method")?.to_string(),
            status: parsed(b, "status")?,
            seconds: parsed(b, "seconds")?,
            write_seconds: parsed_or(b, "write_seconds", 0.0)?,
            slots: parsed_or(b, "slots", 0)?,
            cpu: parsed_or(b, "cpu", 0.0)?,
        })),
        "system" => Ok(LogEntry::System {
            cpu_use: parsed(b, "cpu_use")?,
            memory_percent: parsed(b, "memory_percent")?,
            memory_used: parsed(b, "memory_used")?,
        }),
        other => Err(RouteError::UnknownCommand(other.to_string())),
    }
}

pub struct LoggingRoute<C: Clock> {
    stats: Arc<RequestStats<C>>,
}

impl<C: Clock> LoggingRoute<C> {
    pub fn new(stats: Arc<RequestStats<C>>) -> Self {
        Self { stats }
    }
}

#[async_trait]
impl<C: Clock + 'static> SessionFactory for LoggingRoute<C> {
    fn build(&self, conn: &ConnectionInfo) -> Box<dyn Session> {
        Box::new(LoggingSession { stats: Arc::clone(&self.stats), conn: conn.id })
    }
}

struct LoggingSession<C: Clock> {
    stats: Arc<RequestStats<C>>,
    conn: u64,
}

#[async_trait]
impl<C: Clock + 'static> Session for LoggingSession<C> {
    async fn started(&mut self, _sender: DispatchingSender) {}

    async fn box_received(&mut self, b: FieldBox) {
        match parse(&b) {
            Ok(LogEntry::Request(request)) => self.stats.record(&request),
            Ok(LogEntry::System { cpu_use, memory_percent, memory_used }) => {
                self.stats.update_system(cpu_use, memory_percent, memory_used)
            }
            Err(e) => warn!(conn = self.conn, error = %e, "ignored logging command"),
        }
    }

    async fn stopped(&mut self, _reason: &Disconnect) {}
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
