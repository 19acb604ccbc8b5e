// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job counters reported by children over the `jobs` route.

use std::collections::BTreeMap;

use async_trait::async_trait;
use ctl_core::{JobHistogram, WorkTypeCounts, WorkerLoad};
use parking_lot::Mutex;

use crate::adapters::{AdapterError, JobQueue, Transaction, WorkerPool};

/// A change to one job, as reported by the worker handling it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JobEvent {
    Enqueued,
    Assigned { weight: u64 },
    Completed { weight: u64, seconds: f64 },
    Failed { weight: u64 },
    /// One queued item passed its scheduled time
    Late,
}

#[derive(Debug, Default)]
struct WorkerState {
    /// In-flight items per work type
    in_flight: BTreeMap<String, u64>,
    load: u64,
    completed: u64,
}

impl WorkerState {
    fn assigned(&self) -> u64 {
        self.in_flight.values().sum()
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    histogram: JobHistogram,
    workers: BTreeMap<u64, WorkerState>,
}

/// Queue histogram plus per-worker load, keyed by control connection.
///
/// Invariant: a work type's `late` count never exceeds its `queued` count.
#[derive(Debug)]
pub struct JobLedger {
    state: Mutex<LedgerState>,
    capacity: u64,
}

impl JobLedger {
    /// `capacity` is the load one worker carries at 100%.
    pub fn new(capacity: u64) -> Self {
        Self { state: Mutex::default(), capacity: capacity.max(1) }
    }

    pub fn register_worker(&self, worker: u64) {
        self.state.lock().workers.entry(worker).or_default();
    }

    /// Forget a worker. Items it still held go back to the queue.
    pub fn release_worker(&self, worker: u64) {
        let mut state = self.state.lock();
        let Some(gone) = state.workers.remove(&worker) else {
            return;
        };
        for (work_type, n) in gone.in_flight {
            let counts = state.histogram.entry(work_type).or_default();
            counts.assigned = counts.assigned.saturating_sub(n);
            counts.queued += n;
        }
    }

    pub fn record(&self, worker: u64, work_type: &str, event: JobEvent) {
        let mut state = self.state.lock();
        let LedgerState { histogram, workers } = &mut *state;
        let counts = histogram.entry(work_type.to_string()).or_default();
        let worker = workers.entry(worker).or_default();

        match event {
            JobEvent::Enqueued => counts.queued += 1,
            JobEvent::Assigned { weight } => {
                counts.queued = counts.queued.saturating_sub(1);
                counts.assigned += 1;
                *worker.in_flight.entry(work_type.to_string()).or_default() += 1;
                worker.load = worker.load.saturating_add(weight);
            }
            JobEvent::Completed { weight, seconds } => {
                finish(counts, worker, work_type, weight);
                counts.completed += 1;
                counts.time += seconds;
                worker.completed += 1;
            }
            JobEvent::Failed { weight } => {
                finish(counts, worker, work_type, weight);
                counts.failed += 1;
            }
            JobEvent::Late => counts.late += 1,
        }
        counts.late = counts.late.min(counts.queued);
    }

    pub fn histogram_snapshot(&self) -> JobHistogram {
        self.state.lock().histogram.clone()
    }

    pub fn worker_loads(&self) -> Vec<WorkerLoad> {
        self.state
            .lock()
            .workers
            .values()
            .map(|w| WorkerLoad(w.assigned(), w.load, w.completed))
            .collect()
    }

    /// Total load as a percentage of the pool's capacity.
    pub fn level(&self) -> u64 {
        let state = self.state.lock();
        if state.workers.is_empty() {
            return 0;
        }
        let load: u128 = state.workers.values().map(|w| u128::from(w.load)).sum();
        let capacity = state.workers.len() as u128 * u128::from(self.capacity);
        u64::try_from(load * 100 / capacity).unwrap_or(u64::MAX)
    }
}

fn finish(counts: &mut WorkTypeCounts, worker: &mut WorkerState, work_type: &str, weight: u64) {
    counts.assigned = counts.assigned.saturating_sub(1);
    if let Some(n) = worker.in_flight.get_mut(work_type) {
        *n = n.saturating_sub(1);
        if *n == 0 {
            worker.in_flight.remove(work_type);
        }
    }
    worker.load = worker.load.saturating_sub(weight);
}

/// The ledger is in memory, so its transactions only mark the read.
struct LedgerTransaction;

#[async_trait]
impl Transaction for LedgerTransaction {
    async fn commit(self: Box<Self>) -> Result<(), AdapterError> {
        Ok(())
    }
}

#[async_trait]
impl JobQueue for JobLedger {
    async fn number_of_work_types(&self) -> Result<u64, AdapterError> {
        Ok(self.state.lock().histogram.len() as u64)
    }

    async fn new_transaction(&self) -> Result<Box<dyn Transaction>, AdapterError> {
        Ok(Box::new(LedgerTransaction))
    }

    async fn histogram(&self, _tx: &mut dyn Transaction) -> Result<JobHistogram, AdapterError> {
        Ok(self.histogram_snapshot())
    }
}

#[async_trait]
impl WorkerPool for JobLedger {
    async fn each_worker_load(&self) -> Result<Vec<WorkerLoad>, AdapterError> {
        Ok(self.worker_loads())
    }

    async fn load_level(&self) -> Result<u64, AdapterError> {
        Ok(self.level())
    }
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
