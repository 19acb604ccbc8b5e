// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction so pollers and rate calculations can be driven by tests.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Source of monotonic and wall-clock time.
pub trait Clock: Clone + Send + Sync {
    /// Monotonic instant, used for elapsed-time and rate computations.
    fn now(&self) -> Instant;

    /// Wall-clock seconds since the Unix epoch, used only for display.
    fn epoch_secs(&self) -> f64;
}

/// Real system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_secs(&self) -> f64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs_f64()
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeClock;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use parking_lot::Mutex;

    use super::Clock;

    /// Manually advanced clock. Clones share the same time.
    #[derive(Debug, Clone)]
    pub struct FakeClock {
        inner: Arc<Mutex<(Instant, f64)>>,
    }

    impl FakeClock {
        pub fn new() -> Self {
            Self { inner: Arc::new(Mutex::new((Instant::now(), 1_000_000.0))) }
        }

        /// Move both the monotonic and the wall clock forward.
        pub fn advance(&self, by: Duration) {
            let mut guard = self.inner.lock();
            guard.0 += by;
            guard.1 += by.as_secs_f64();
        }
    }

    impl FakeClock {
        /// Move only the wall clock back, as an NTP step would.
        pub fn step_wall_clock_back(&self, by: Duration) {
            self.inner.lock().1 -= by.as_secs_f64();
        }
    }

    impl Default for FakeClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            self.inner.lock().0
        }

        fn epoch_secs(&self) -> f64 {
            self.inner.lock().1
        }
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
