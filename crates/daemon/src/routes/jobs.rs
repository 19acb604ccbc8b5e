// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job scheduling control.
//!
//! Children report job transitions as boxes carrying `command` (one of
//! [`JobCommand`]), `work_type` and, where relevant, `weight` and `seconds`.
//! Every box is answered with `ok` or `error`.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use ctl_mux::{ConnectionInfo, Disconnect, DispatchingSender, Session, SessionFactory};
use ctl_wire::FieldBox;
use tracing::{debug, warn};

use super::{parsed, parsed_or, required, RouteError};
use crate::ledger::{JobEvent, JobLedger};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobCommand {
    Enqueued,
    Assigned,
    Completed,
    Failed,
    Late,
}

ctl_core::simple_display! {
    JobCommand {
        Enqueued => "enqueued",
        Assigned => "assigned",
        Completed => "completed",
        Failed => "failed",
        Late => "late",
    }
}

impl FromStr for JobCommand {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enqueued" => Ok(JobCommand::Enqueued),
            "assigned" => Ok(JobCommand::Assigned),
            "completed" => Ok(JobCommand::Completed),
            "failed" => Ok(JobCommand::Failed),
            "late" => Ok(JobCommand::Late),
            other => Err(RouteError::UnknownCommand(other.to_string())),
        }
    }
}

/// Largest load one job may add to a worker
pub const MAX_WEIGHT: u64 = 1_000_000;

fn weight(b: &FieldBox) -> Result<u64, RouteError> {
    let weight = parsed_or(b, "weight", 1)?;
    if weight > MAX_WEIGHT {
        return Err(RouteError::InvalidField { field: "weight", value: weight.to_string() });
    }
    Ok(weight)
}

/// Parse a job box into its work type and event.
pub(super) fn parse(b: &FieldBox) -> Result<(String, JobEvent), RouteError> {
    let command: JobCommand = required(b, "command")?.parse()?;
    let work_type = required(b, "work_type")?;
    if work_type.is_empty() {
        return Err(RouteError::InvalidField { field: "work_type", value: String::new() });
    }
    let event = match command {
        JobCommand::Enqueued => JobEvent::Enqueued,
        JobCommand::Assigned => JobEvent::Assigned { weight: weight(b)? },
        JobCommand::Completed => JobEvent::Completed {
            weight: weight(b)?,
            seconds: parsed(b, "seconds")?,
        },
        JobCommand::Failed => JobEvent::Failed { weight: weight(b)? },
        JobCommand::Late => JobEvent::Late,
    };
    Ok((work_type.to_string(), event))
}

/// Builds one [`JobsSession`] per control connection; each connection is one
/// worker in the ledger.
pub struct JobsRoute {
    ledger: Arc<JobLedger>,
}

impl JobsRoute {
    pub fn new(ledger: Arc<JobLedger>) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl SessionFactory for JobsRoute {
    fn build(&self, conn: &ConnectionInfo) -> Box<dyn Session> {
        Box::new(JobsSession { ledger: Arc::clone(&self.ledger), worker: conn.id, sender: None })
    }
}

struct JobsSession {
    ledger: Arc<JobLedger>,
    worker: u64,
    sender: Option<DispatchingSender>,
}

impl JobsSession {
    fn reply(&self, b: FieldBox) {
        if let Some(sender) = &self.sender {
            if let Err(e) = sender.send(&b) {
                debug!(worker = self.worker, error = %e, "dropping job reply");
            }
        }
    }
}

#[async_trait]
impl Session for JobsSession {
    async fn started(&mut self, sender: DispatchingSender) {
        self.ledger.register_worker(self.worker);
        self.sender = Some(sender);
    }

    async fn box_received(&mut self, b: FieldBox) {
        match parse(&b) {
            Ok((work_type, event)) => {
                debug!(worker = self.worker, %work_type, ?event, "job event");
                self.ledger.record(self.worker, &work_type, event);
                self.reply(FieldBox::new().with("ok", "1"));
            }
            Err(e) => {
                warn!(worker = self.worker, error = %e, "rejected job command");
                self.reply(FieldBox::new().with("error", e.to_string()));
            }
        }
    }

    async fn stopped(&mut self, reason: &Disconnect) {
        debug!(worker = self.worker, %reason, "worker gone");
        self.ledger.release_worker(self.worker);
        self.sender = None;
    }
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
