//! Background TTL sweepers, one cooperative task per `BucketStore` (§4.6).

use std::sync::Arc;
use std::time::Duration;

use abf_core::bucket_store::BucketStore;
use abf_core::clock::Clock;
use tokio::sync::watch;
use tracing::debug;

/// Run `store.sweep(clock)` on every tick of `store.ttl()`, until
/// `shutdown` fires. Exits promptly between ticks, never mid-sweep.
pub async fn run(
    name: &'static str,
    store: Arc<BucketStore>,
    clock: Arc<dyn Clock>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(effective_ttl(store.ttl()));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                store.sweep(&*clock);
                debug!(store = name, remaining = store.len(), "bucket store swept");
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    debug!(store = name, "sweeper shutting down");
                    return;
                }
            }
        }
    }
}

/// Guess at a sane minimum tick so a misconfigured `bucket_ttl` of zero
/// doesn't spin the sweeper hot.
pub fn effective_ttl(ttl: Duration) -> Duration {
    ttl.max(Duration::from_millis(100))
}
