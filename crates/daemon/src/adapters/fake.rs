// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scriptable collaborators for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use ctl_core::{DirectoryReport, JobHistogram, SlotStatus, WorkerLoad};
use parking_lot::Mutex;
use serde_json::{Map, Value};

use super::{
    AdapterError, DirectoryService, JobQueue, LoadLimiter, StatsSource, Transaction, WorkerPool,
};

fn scripted<T: Clone>(slot: &Mutex<Result<T, AdapterError>>) -> Result<T, AdapterError> {
    slot.lock().clone()
}

/// Stats source returning a fixed object, or a scripted failure.
#[derive(Clone)]
pub struct FakeStats {
    result: Arc<Mutex<Result<Map<String, Value>, AdapterError>>>,
    calls: Arc<AtomicUsize>,
}

impl FakeStats {
    pub fn new(stats: Map<String, Value>) -> Self {
        Self { result: Arc::new(Mutex::new(Ok(stats))), calls: Arc::default() }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Arc::new(Mutex::new(Err(AdapterError::Failed(message.to_string())))),
            calls: Arc::default(),
        }
    }

    /// Number of `stats()` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatsSource for FakeStats {
    async fn stats(&self) -> Result<Map<String, Value>, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        scripted(&self.result)
    }
}

/// Load limiter with a fixed slot table.
#[derive(Clone, Default)]
pub struct FakeLoadLimiter {
    pub slots: Vec<SlotStatus>,
    pub overloaded: bool,
}

#[async_trait]
impl LoadLimiter for FakeLoadLimiter {
    async fn slots(&self) -> Vec<SlotStatus> {
        self.slots.clone()
    }

    async fn overloaded(&self) -> bool {
        self.overloaded
    }
}

/// Job queue with a fixed histogram. Counts commits so tests can check the
/// transaction is closed.
#[derive(Clone)]
pub struct FakeJobQueue {
    work_types: Arc<Mutex<Result<u64, AdapterError>>>,
    histogram: Arc<Mutex<Result<JobHistogram, AdapterError>>>,
    commits: Arc<AtomicUsize>,
}

impl FakeJobQueue {
    pub fn new(histogram: JobHistogram) -> Self {
        Self {
            work_types: Arc::new(Mutex::new(Ok(histogram.len() as u64))),
            histogram: Arc::new(Mutex::new(Ok(histogram))),
            commits: Arc::default(),
        }
    }

    /// Queue reporting `n` work types and an empty histogram.
    pub fn with_work_types(n: u64) -> Self {
        let queue = Self::new(JobHistogram::new());
        *queue.work_types.lock() = Ok(n);
        queue
    }

    /// Make every call fail with `message`.
    pub fn fail(&self, message: &str) {
        *self.work_types.lock() = Err(AdapterError::Failed(message.to_string()));
        *self.histogram.lock() = Err(AdapterError::Failed(message.to_string()));
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

struct FakeTransaction {
    commits: Arc<AtomicUsize>,
}

#[async_trait]
impl Transaction for FakeTransaction {
    async fn commit(self: Box<Self>) -> Result<(), AdapterError> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl JobQueue for FakeJobQueue {
    async fn number_of_work_types(&self) -> Result<u64, AdapterError> {
        scripted(&self.work_types)
    }

    async fn new_transaction(&self) -> Result<Box<dyn Transaction>, AdapterError> {
        Ok(Box::new(FakeTransaction { commits: Arc::clone(&self.commits) }))
    }

    async fn histogram(&self, _tx: &mut dyn Transaction) -> Result<JobHistogram, AdapterError> {
        scripted(&self.histogram)
    }
}

/// Worker pool with fixed loads.
#[derive(Clone)]
pub struct FakeWorkerPool {
    result: Arc<Mutex<Result<(Vec<WorkerLoad>, u64), AdapterError>>>,
}

impl FakeWorkerPool {
    pub fn new(workers: Vec<WorkerLoad>, level: u64) -> Self {
        Self { result: Arc::new(Mutex::new(Ok((workers, level)))) }
    }

    pub fn failing(message: &str) -> Self {
        Self { result: Arc::new(Mutex::new(Err(AdapterError::Failed(message.to_string())))) }
    }
}

#[async_trait]
impl WorkerPool for FakeWorkerPool {
    async fn each_worker_load(&self) -> Result<Vec<WorkerLoad>, AdapterError> {
        scripted(&self.result).map(|(workers, _)| workers)
    }

    async fn load_level(&self) -> Result<u64, AdapterError> {
        scripted(&self.result).map(|(_, level)| level)
    }
}

/// Directory service with a fixed report, or a scripted failure.
#[derive(Clone)]
pub struct FakeDirectory {
    result: Arc<Mutex<Result<DirectoryReport, AdapterError>>>,
}

impl FakeDirectory {
    pub fn new(report: DirectoryReport) -> Self {
        Self { result: Arc::new(Mutex::new(Ok(report))) }
    }

    pub fn failing(message: &str) -> Self {
        Self { result: Arc::new(Mutex::new(Err(AdapterError::Failed(message.to_string())))) }
    }
}

#[async_trait]
impl DirectoryService for FakeDirectory {
    async fn directory_stats(&self) -> Result<DirectoryReport, AdapterError> {
        scripted(&self.result)
    }
}
