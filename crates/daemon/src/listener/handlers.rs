// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in query handlers.
//!
//! A collaborator failure is logged and answered with the empty string for
//! that query alone.

use futures_util::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use ctl_core::{DirectoryReport, JobAssignments, SlotsReport};

use crate::adapters::{AdapterError, Collaborators};

/// Answer for unknown queries and failed collaborators.
pub(crate) fn empty() -> Value {
    Value::String(String::new())
}

fn to_json<T: Serialize>(query: &'static str, value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        warn!(query, error = %e, "failed to serialize query result");
        empty()
    })
}

fn degraded(query: &'static str, e: AdapterError) -> Value {
    warn!(query, error = %e, "query failed");
    empty()
}

/// `stats_<key>` projection: the key's value, or the empty string.
pub(crate) fn project(aggregate: &Value, key: &str) -> Value {
    aggregate.get(key).cloned().unwrap_or_else(empty)
}

pub(crate) fn stats(c: &Collaborators) -> BoxFuture<'_, Value> {
    Box::pin(async move {
        let Some(source) = &c.stats else {
            return degraded("stats", AdapterError::Unavailable("statistics"));
        };
        match source.stats().await {
            Ok(map) => Value::Object(map),
            Err(e) => degraded("stats", e),
        }
    })
}

pub(crate) fn slots(c: &Collaborators) -> BoxFuture<'_, Value> {
    Box::pin(async move {
        let report = match &c.limiter {
            Some(limiter) => {
                SlotsReport { slots: limiter.slots().await, overloaded: limiter.overloaded().await }
            }
            None => SlotsReport::default(),
        };
        to_json("slots", &report)
    })
}

pub(crate) fn jobcount(c: &Collaborators) -> BoxFuture<'_, Value> {
    Box::pin(async move {
        let Some(queue) = &c.queue else {
            return degraded("jobcount", AdapterError::Unavailable("job queue"));
        };
        match queue.number_of_work_types().await {
            Ok(n) => Value::from(n),
            Err(e) => degraded("jobcount", e),
        }
    })
}

pub(crate) fn jobs(c: &Collaborators) -> BoxFuture<'_, Value> {
    Box::pin(async move {
        let Some(queue) = &c.queue else {
            return degraded("jobs", AdapterError::Unavailable("job queue"));
        };
        let histogram = async {
            let mut tx = queue.new_transaction().await?;
            let histogram = queue.histogram(tx.as_mut()).await?;
            tx.commit().await?;
            Ok::<_, AdapterError>(histogram)
        };
        match histogram.await {
            Ok(histogram) => to_json("jobs", &histogram),
            Err(e) => degraded("jobs", e),
        }
    })
}

pub(crate) fn job_assignments(c: &Collaborators) -> BoxFuture<'_, Value> {
    Box::pin(async move {
        let Some(pool) = &c.pool else {
            return degraded("job_assignments", AdapterError::Unavailable("worker pool"));
        };
        let assignments = async {
            Ok::<_, AdapterError>(JobAssignments {
                workers: pool.each_worker_load().await?,
                level: pool.load_level().await?,
            })
        };
        match assignments.await {
            Ok(assignments) => to_json("job_assignments", &assignments),
            Err(e) => degraded("job_assignments", e),
        }
    })
}

pub(crate) fn directory(c: &Collaborators) -> BoxFuture<'_, Value> {
    Box::pin(async move {
        let report = match &c.directory {
            Some(directory) => directory.directory_stats().await.unwrap_or_else(|e| {
                warn!(query = "directory", error = %e, "query failed");
                DirectoryReport::new()
            }),
            None => DirectoryReport::new(),
        };
        to_json("directory", &report)
    })
}
