// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rolling request statistics reported by children over the `logging` route.

use std::collections::VecDeque;

use async_trait::async_trait;
use ctl_core::{Clock, RequestWindow, StatsReport, SystemStats};
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::adapters::{AdapterError, StatsSource};

/// Minute buckets kept for the longest window
const HISTORY_MINUTES: u64 = 60;

/// One completed request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestRecord {
    pub method: String,
    pub status: u16,
    pub seconds: f64,
    /// Portion of `seconds` spent writing the response
    pub write_seconds: f64,
    /// Slots in use when the request arrived
    pub slots: u64,
    pub cpu: f64,
}

#[derive(Debug, Default)]
struct StatsState {
    /// `(minute since epoch, window)`, oldest first
    minutes: VecDeque<(u64, RequestWindow)>,
    system: SystemStats,
}

/// Access-log statistics in one-minute buckets, reported as the current
/// minute, the last minute, the last five minutes and the last hour.
pub struct RequestStats<C: Clock> {
    clock: C,
    state: Mutex<StatsState>,
}

impl<C: Clock> RequestStats<C> {
    pub fn new(clock: C) -> Self {
        let system = SystemStats { start_time: clock.epoch_secs(), ..SystemStats::default() };
        Self { clock, state: Mutex::new(StatsState { minutes: VecDeque::new(), system }) }
    }

    fn minute(&self) -> u64 {
        (self.clock.epoch_secs() / 60.0).floor() as u64
    }

    pub fn record(&self, request: &RequestRecord) {
        let mut state = self.state.lock();
        // Never open a bucket older than the newest one
        let now = match state.minutes.back() {
            Some((newest, _)) => self.minute().max(*newest),
            None => self.minute(),
        };
        prune(&mut state.minutes, now);
        if state.minutes.back().map(|(m, _)| *m) != Some(now) {
            state.minutes.push_back((now, RequestWindow::default()));
        }
        let Some((_, window)) = state.minutes.back_mut() else {
            return;
        };

        let ms = request.seconds * 1000.0;
        window.requests += 1;
        window.total_ms += ms;
        window.write_ms += request.write_seconds * 1000.0;
        window.max_ms = window.max_ms.max(ms);
        window.slots += request.slots;
        window.max_slots = window.max_slots.max(request.slots);
        window.cpu += request.cpu;
        match request.status {
            401 => window.unauthorized += 1,
            500..=599 => window.server_errors += 1,
            _ => {}
        }
        *window.method.entry(request.method.clone()).or_default() += 1;
        *window.method_ms.entry(request.method.clone()).or_default() += ms;
    }

    /// Replace the host figures; the start time is kept.
    pub fn update_system(&self, cpu_use: f64, memory_percent: f64, memory_used: u64) {
        let mut state = self.state.lock();
        state.system.cpu_use = cpu_use;
        state.system.memory_percent = memory_percent;
        state.system.memory_used = memory_used;
    }

    pub fn report(&self) -> StatsReport {
        let now = self.minute();
        let mut state = self.state.lock();
        prune(&mut state.minutes, now);

        let mut report = StatsReport { system: state.system.clone(), ..StatsReport::default() };
        for (minute, window) in &state.minutes {
            // Buckets ahead of a clock that stepped back count as current
            let age = now.saturating_sub(*minute);
            if age == 0 {
                report.current.merge(window);
                continue;
            }
            if age == 1 {
                report.one_minute.merge(window);
            }
            if age <= 5 {
                report.five_minutes.merge(window);
            }
            report.one_hour.merge(window);
        }
        report
    }
}

fn prune(minutes: &mut VecDeque<(u64, RequestWindow)>, now: u64) {
    while minutes.front().is_some_and(|(m, _)| now.saturating_sub(*m) > HISTORY_MINUTES) {
        minutes.pop_front();
    }
}

#[async_trait]
impl<C: Clock + 'static> StatsSource for RequestStats<C> {
    async fn stats(&self) -> Result<Map<String, Value>, AdapterError> {
        match serde_json::to_value(self.report()) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(AdapterError::Failed("stats did not serialize to an object".into())),
            Err(e) => Err(AdapterError::Failed(e.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "requests_tests.rs"]
mod tests;
