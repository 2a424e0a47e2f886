//! Injectable time source.
//!
//! `Bucket` and `BucketStore` read `now` through a `Clock` rather than calling
//! `Instant::now()` directly, so property tests (§8 invariants 1, 7, 9; S5)
//! can advance time deterministically instead of sleeping.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Production clock: a thin wrapper around `Instant::now()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Test clock: starts at `Instant::now()` and only moves when told to.
#[derive(Clone)]
pub struct TestClock {
    inner: Arc<Mutex<Instant>>,
}

impl TestClock {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Advance the clock by `d`. Locking cannot fail: the mutex is never
    /// held across a panic site in this crate.
    pub fn advance(&self, d: Duration) {
        let mut t = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *t += d;
    }
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TestClock {
    fn now(&self) -> Instant {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
