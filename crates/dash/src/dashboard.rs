// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Poll loop: update, derive rates, emit, then wait out the rest of the
//! interval.

use std::io;
use std::time::{Duration, Instant};

use ctl_core::{Clock, SystemClock};
use serde_json::{Map, Value};
use tracing::debug;

use crate::client::MonitorClient;
use crate::rates::{Counters, RateTracker, Rates};
use crate::DashError;

/// Delay before the next poll: what is left of `interval` after `elapsed`.
pub fn next_delay(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashOptions {
    /// Poll cadence
    pub interval: Duration,
    /// Keep polling when a poll with subscribed items comes back empty
    pub allow_empty: bool,
}

impl Default for DashOptions {
    fn default() -> Self {
        Self { interval: Duration::from_secs(1), allow_empty: false }
    }
}

/// One poll's worth of data with the rates derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub data: Map<String, Value>,
    pub counters: Counters,
    pub rates: Rates,
    /// Wall-clock time of the poll
    pub epoch_secs: f64,
}

pub struct Dashboard<C: Clock = SystemClock> {
    client: MonitorClient,
    tracker: RateTracker,
    clock: C,
    options: DashOptions,
}

impl<C: Clock> Dashboard<C> {
    pub fn new(client: MonitorClient, clock: C, options: DashOptions) -> Self {
        Self { client, tracker: RateTracker::new(), clock, options }
    }

    pub fn client(&self) -> &MonitorClient {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut MonitorClient {
        &mut self.client
    }

    /// Poll once. An empty result while subscribed is fatal unless
    /// `allow_empty` is set, in which case it leaves the rate sample alone.
    pub async fn tick(&mut self) -> Result<Snapshot, DashError> {
        let data = self.client.update().await.clone();
        let subscribed = self.client.items().next().is_some();

        let (counters, rates) = if data.is_empty() && subscribed {
            if !self.options.allow_empty {
                return Err(DashError::NoValidData);
            }
            debug!(server = %self.client.target(), "empty poll, keeping previous sample");
            (Counters::default(), Rates::default())
        } else {
            let counters = Counters::from_data(&data);
            (counters, self.tracker.observe(counters, self.clock.now()))
        };

        Ok(Snapshot { data, counters, rates, epoch_secs: self.clock.epoch_secs() })
    }

    /// Delay before the next poll for a tick that began at `started`.
    pub fn delay_since(&self, started: Instant) -> Duration {
        next_delay(self.options.interval, self.clock.now().saturating_duration_since(started))
    }

    /// Tick on the configured cadence, handing each snapshot to `emit`.
    /// Returns after the first snapshot when `once` is set.
    pub async fn run<F>(&mut self, once: bool, mut emit: F) -> Result<(), DashError>
    where
        F: FnMut(&Snapshot) -> io::Result<()>,
    {
        loop {
            let started = self.clock.now();
            let snapshot = self.tick().await?;
            emit(&snapshot)?;
            if once {
                return Ok(());
            }
            tokio::time::sleep(self.delay_since(started)).await;
        }
    }
}

#[cfg(test)]
#[path = "dashboard_tests.rs"]
mod tests;
