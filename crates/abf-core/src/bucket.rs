//! The leaky bucket: a single rate-limited counter.
//!
//! Ported from the reference implementation's `internal/ratelimit` package.
//! The algorithm is deliberately exact about rounding: the drained level is
//! ceiled *before* the +1 for the current attempt, never floored or rounded,
//! because that changes which attempt tips the bucket over near saturation.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::clock::Clock;

/// A single leaky-bucket rate limiter.
///
/// Each `Bucket` serialises its own operations behind one mutex; two
/// concurrent `increment()` calls on the same bucket are linearised and the
/// bucket's invariants hold across that linearisation, never across
/// different buckets.
pub struct Bucket {
    inner: Mutex<BucketState>,
}

struct BucketState {
    capacity: u32,
    rate: f64, // units per second
    level: u32,
    last_touch: Instant,
}

impl Bucket {
    /// Create a bucket with the given capacity and leak rate (units/sec),
    /// empty (level 0) as of `now`.
    pub fn new(capacity: u32, rate: f64, now: Instant) -> Self {
        Self {
            inner: Mutex::new(BucketState {
                capacity,
                rate,
                level: 0,
                last_touch: now,
            }),
        }
    }

    /// Capacity per minute, the policy the Guard uses: rate = capacity / 60.
    pub fn with_capacity_per_minute(capacity: u32, now: Instant) -> Self {
        Self::new(capacity, capacity as f64 / 60.0, now)
    }

    pub fn capacity(&self) -> u32 {
        self.lock().capacity
    }

    pub fn level(&self) -> u32 {
        self.lock().level
    }

    pub fn last_touch(&self) -> Instant {
        self.lock().last_touch
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BucketState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Attempt to register one unit at `now`. Returns `true` (permit) or
    /// `false` (refuse). Total: never fails.
    ///
    /// Step by step, matching the reference implementation:
    /// 1. elapsed = max(0, now - last_touch)
    /// 2. n' = ceil(level - elapsed * rate) + 1
    /// 3. clamp n' to at least 1
    /// 4. last_touch = now
    /// 5. if n' > capacity: level = capacity, refuse
    ///    else: level = n', permit
    pub fn increment_at(&self, now: Instant) -> bool {
        let mut state = self.lock();

        let elapsed = now.saturating_duration_since(state.last_touch).as_secs_f64();
        let drained = state.level as f64 - elapsed * state.rate;
        let mut tentative = drained.ceil() as i64 + 1;
        if tentative < 1 {
            tentative = 1;
        }

        state.last_touch = now;

        if tentative > state.capacity as i64 {
            state.level = state.capacity;
            false
        } else {
            state.level = tentative as u32;
            true
        }
    }

    /// Convenience wrapper using the given clock for `now`.
    pub fn increment(&self, clock: &dyn Clock) -> bool {
        self.increment_at(clock.now())
    }

    /// Reset the bucket's level to 0, as of `now` (used by `Guard::reset`).
    pub fn reset_at(&self, now: Instant) {
        let mut state = self.lock();
        state.level = 0;
        state.last_touch = now;
    }
}

pub type SharedBucket = Arc<Bucket>;
