// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Metric types reported by the introspection service and read by the
//! dashboard.
//!
//! Several of these serialize as JSON arrays rather than objects
//! (`WorkerLoad`, `DirectoryCall`) to keep the polled payload compact.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Histogram row for one work type in the job queue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkTypeCounts {
    pub queued: u64,
    pub assigned: u64,
    /// Items whose scheduled time has passed but are not yet assigned
    pub late: u64,
    pub failed: u64,
    pub completed: u64,
    /// Total processing time of completed items, in seconds
    pub time: f64,
}

impl WorkTypeCounts {
    /// Average processing time per completed item, in milliseconds.
    pub fn average_ms(&self) -> f64 {
        if self.completed == 0 {
            0.0
        } else {
            self.time * 1000.0 / self.completed as f64
        }
    }
}

/// Queue histogram keyed by work type.
pub type JobHistogram = BTreeMap<String, WorkTypeCounts>;

/// Load of one worker slot: `[assigned, load, completed]` on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerLoad(pub u64, pub u64, pub u64);

impl WorkerLoad {
    pub fn assigned(&self) -> u64 {
        self.0
    }

    pub fn load(&self) -> u64 {
        self.1
    }

    pub fn completed(&self) -> u64 {
        self.2
    }
}

/// Worker pool snapshot answered for `job_assignments`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobAssignments {
    pub workers: Vec<WorkerLoad>,
    /// Aggregate load level, in percent
    pub level: u64,
}

impl JobAssignments {
    pub fn total_assigned(&self) -> u64 {
        self.workers.iter().map(WorkerLoad::assigned).sum()
    }

    pub fn total_completed(&self) -> u64 {
        self.workers.iter().map(WorkerLoad::completed).sum()
    }
}

/// Connection counters of one HTTP worker slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotStatus {
    pub slot: u32,
    pub unacknowledged: u64,
    pub acknowledged: u64,
    pub unclosed: u64,
    pub total: u64,
    pub started: u64,
    pub starting: u64,
    pub stopped: u64,
    pub abandoned: u64,
}

/// Slot table plus the load limiter's overload flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotsReport {
    pub slots: Vec<SlotStatus>,
    pub overloaded: bool,
}

/// Request statistics for one time window of the access log.
///
/// Field names match the keys of the `stats` payload; times are in
/// milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestWindow {
    pub requests: u64,
    /// Total response time
    #[serde(rename = "t")]
    pub total_ms: f64,
    /// Portion of the response time spent writing the response
    #[serde(rename = "t-resp-wr")]
    pub write_ms: f64,
    #[serde(rename = "T-MAX")]
    pub max_ms: f64,
    /// Sum over requests of the slots in use when each arrived
    pub slots: u64,
    #[serde(rename = "max-slots")]
    pub max_slots: u64,
    /// Sum over requests of the CPU percentage reported with each
    pub cpu: f64,
    #[serde(rename = "401")]
    pub unauthorized: u64,
    #[serde(rename = "500")]
    pub server_errors: u64,
    /// Request count per method
    pub method: BTreeMap<String, u64>,
    /// Total response time per method
    #[serde(rename = "method-t")]
    pub method_ms: BTreeMap<String, f64>,
}

impl RequestWindow {
    /// Fold `other` into this window.
    pub fn merge(&mut self, other: &RequestWindow) {
        self.requests += other.requests;
        self.total_ms += other.total_ms;
        self.write_ms += other.write_ms;
        self.max_ms = self.max_ms.max(other.max_ms);
        self.slots += other.slots;
        self.max_slots = self.max_slots.max(other.max_slots);
        self.cpu += other.cpu;
        self.unauthorized += other.unauthorized;
        self.server_errors += other.server_errors;
        for (method, count) in &other.method {
            *self.method.entry(method.clone()).or_default() += count;
        }
        for (method, ms) in &other.method_ms {
            *self.method_ms.entry(method.clone()).or_default() += ms;
        }
    }
}

/// Host figures reported alongside request statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemStats {
    #[serde(rename = "cpu use")]
    pub cpu_use: f64,
    #[serde(rename = "memory percent")]
    pub memory_percent: f64,
    /// Bytes
    #[serde(rename = "memory used")]
    pub memory_used: u64,
    /// Seconds since the Unix epoch
    #[serde(rename = "start time")]
    pub start_time: f64,
}

/// Payload of the `stats` query: rolling request windows plus system
/// figures, each projectable as `stats_<key>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsReport {
    /// The minute in progress
    pub current: RequestWindow,
    /// The last complete minute
    #[serde(rename = "1m")]
    pub one_minute: RequestWindow,
    #[serde(rename = "5m")]
    pub five_minutes: RequestWindow,
    #[serde(rename = "1h")]
    pub one_hour: RequestWindow,
    pub system: SystemStats,
}

impl StatsReport {
    /// Windows paired with their label and length in seconds, shortest first.
    pub fn windows(&self) -> [(&'static str, u64, &RequestWindow); 4] {
        [
            ("current", 60, &self.current),
            ("1m", 60, &self.one_minute),
            ("5m", 5 * 60, &self.five_minutes),
            ("1h", 60 * 60, &self.one_hour),
        ]
    }
}

/// Directory-service call statistics: `[count, seconds]` on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectoryCall(pub u64, pub f64);

impl DirectoryCall {
    pub fn count(&self) -> u64 {
        self.0
    }

    pub fn seconds(&self) -> f64 {
        self.1
    }
}

/// Directory-service report keyed by method name.
pub type DirectoryReport = BTreeMap<String, DirectoryCall>;

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
