// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Narrow interfaces to the subsystems the introspection service reports on.
//!
//! Each call may suspend and may fail on its own; a failure only affects the
//! query that made it.

use std::sync::Arc;

use async_trait::async_trait;
use ctl_core::{DirectoryReport, JobHistogram, SlotStatus, WorkerLoad};
use serde_json::{Map, Value};
use thiserror::Error;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeDirectory, FakeJobQueue, FakeLoadLimiter, FakeStats, FakeWorkerPool};

/// Errors from collaborator calls
#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    #[error("{0} is unavailable")]
    Unavailable(&'static str),

    #[error("{0}")]
    Failed(String),
}

/// Request/logging statistics (the access log).
#[async_trait]
pub trait StatsSource: Send + Sync + 'static {
    /// Statistics object; each top-level key is queryable as `stats_<key>`.
    async fn stats(&self) -> Result<Map<String, Value>, AdapterError>;
}

/// The master process's connection limiter.
#[async_trait]
pub trait LoadLimiter: Send + Sync + 'static {
    async fn slots(&self) -> Vec<SlotStatus>;

    async fn overloaded(&self) -> bool;
}

/// An open job-store transaction. Dropping it without committing abandons it.
#[async_trait]
pub trait Transaction: Send {
    async fn commit(self: Box<Self>) -> Result<(), AdapterError>;
}

/// The persistent job queue.
#[async_trait]
pub trait JobQueue: Send + Sync + 'static {
    async fn number_of_work_types(&self) -> Result<u64, AdapterError>;

    async fn new_transaction(&self) -> Result<Box<dyn Transaction>, AdapterError>;

    /// Per-work-type counters, read inside `tx`.
    async fn histogram(&self, tx: &mut dyn Transaction) -> Result<JobHistogram, AdapterError>;
}

/// The pool of workers jobs are assigned to.
#[async_trait]
pub trait WorkerPool: Send + Sync + 'static {
    async fn each_worker_load(&self) -> Result<Vec<WorkerLoad>, AdapterError>;

    /// Aggregate load, in percent of pool capacity
    async fn load_level(&self) -> Result<u64, AdapterError>;
}

/// The directory (identity) service.
#[async_trait]
pub trait DirectoryService: Send + Sync + 'static {
    async fn directory_stats(&self) -> Result<DirectoryReport, AdapterError>;
}

/// Every collaborator the introspection service may consult. Absent ones
/// answer with their documented defaults.
#[derive(Clone, Default)]
pub struct Collaborators {
    pub stats: Option<Arc<dyn StatsSource>>,
    pub limiter: Option<Arc<dyn LoadLimiter>>,
    pub queue: Option<Arc<dyn JobQueue>>,
    pub pool: Option<Arc<dyn WorkerPool>>,
    pub directory: Option<Arc<dyn DirectoryService>>,
}

impl Collaborators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stats(mut self, stats: Arc<dyn StatsSource>) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn with_limiter(mut self, limiter: Arc<dyn LoadLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    pub fn with_queue(mut self, queue: Arc<dyn JobQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn with_pool(mut self, pool: Arc<dyn WorkerPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn with_directory(mut self, directory: Arc<dyn DirectoryService>) -> Self {
        self.directory = Some(directory);
        self
    }
}
