//! Concurrent mapping from identifier string to `Bucket`, with TTL sweeping.
//!
//! Three independent instances exist in the Guard (login, password, ip); they
//! share no state. Backed by `DashMap`, which is internally striped — finer
//! grained than the reference implementation's single mutex, but the
//! observable contract (linearised get/set/remove per key) is unchanged.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::bucket::{Bucket, SharedBucket};
use crate::clock::Clock;

pub struct BucketStore {
    data: DashMap<String, SharedBucket>,
    ttl: Duration,
}

impl BucketStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            data: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Constant-time lookup. The returned handle shares the bucket's own
    /// internal lock, so callers may `increment()` it after this call
    /// returns without holding any store-level lock.
    pub fn get(&self, key: &str) -> Option<SharedBucket> {
        self.data.get(key).map(|e| e.value().clone())
    }

    pub fn set(&self, key: &str, bucket: SharedBucket) {
        self.data.insert(key.to_string(), bucket);
    }

    pub fn remove(&self, key: &str) {
        self.data.remove(key);
    }

    /// Get-or-create: look up `key`, creating a fresh bucket (capacity units
    /// per minute) if absent, then write it back. Returns the bucket handle.
    pub fn get_or_insert_with(
        &self,
        key: &str,
        capacity: u32,
        clock: &dyn Clock,
    ) -> SharedBucket {
        if let Some(b) = self.get(key) {
            return b;
        }
        let fresh: SharedBucket = SharedBucket::new(Bucket::with_capacity_per_minute(
            capacity,
            clock.now(),
        ));
        self.set(key, fresh.clone());
        fresh
    }

    /// Remove every entry whose bucket's last-touch is strictly older than
    /// `now - ttl`. O(|store|), acceptable since distinct keys are bounded by
    /// what was observed within the TTL window.
    pub fn sweep_at(&self, now: Instant) {
        let cutoff = now.checked_sub(self.ttl).unwrap_or(now);
        self.data.retain(|_, bucket| bucket.last_touch() >= cutoff);
    }

    pub fn sweep(&self, clock: &dyn Clock) {
        self.sweep_at(clock.now());
    }

    pub fn clear_all(&self) {
        self.data.clear();
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
