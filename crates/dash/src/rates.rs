// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue drain and completion rates derived from consecutive polls.

use std::time::Instant;

use serde::Serialize;
use serde_json::{Map, Value};

/// Cumulative counters read out of one poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    /// Items waiting across all work types
    pub queued: u64,
    /// Items currently assigned to workers
    pub assigned: u64,
    /// Items completed by workers
    pub completed: u64,
}

impl Counters {
    /// Sum `jobs[*].queued` and the `job_assignments` worker columns. Absent
    /// or degraded items count as zero.
    pub fn from_data(data: &Map<String, Value>) -> Self {
        let queued = data
            .get("jobs")
            .and_then(Value::as_object)
            .map(|jobs| {
                jobs.values().filter_map(|row| row.get("queued").and_then(Value::as_u64)).sum()
            })
            .unwrap_or(0);

        let workers = data
            .get("job_assignments")
            .and_then(|a| a.get("workers"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let column = |i: usize| -> u64 {
            workers.iter().filter_map(|w| w.get(i).and_then(Value::as_u64)).sum()
        };

        Self { queued, assigned: column(0), completed: column(2) }
    }
}

/// The one sample retained between polls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSample {
    pub at: Instant,
    pub counters: Counters,
}

/// Per-second rates. `queued` is positive while the queue drains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rates {
    pub queued: f64,
    pub completed: f64,
}

#[derive(Debug, Default)]
pub struct RateTracker {
    previous: Option<MetricSample>,
}

impl RateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous(&self) -> Option<&MetricSample> {
        self.previous.as_ref()
    }

    /// Record `counters` taken at `at` and return rates against the previous
    /// sample. Zero on the first sample or when no time has passed.
    pub fn observe(&mut self, counters: Counters, at: Instant) -> Rates {
        let rates = match self.previous {
            Some(prev) => {
                let elapsed = at.saturating_duration_since(prev.at).as_secs_f64();
                if elapsed > 0.0 {
                    Rates {
                        queued: (prev.counters.queued as f64 - counters.queued as f64) / elapsed,
                        completed: (counters.completed as f64 - prev.counters.completed as f64)
                            / elapsed,
                    }
                } else {
                    Rates::default()
                }
            }
            None => Rates::default(),
        };
        self.previous = Some(MetricSample { at, counters });
        rates
    }
}

#[cfg(test)]
#[path = "rates_tests.rs"]
mod tests;
