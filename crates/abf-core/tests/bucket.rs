use std::time::{Duration, Instant};

use abf_core::bucket::Bucket;

fn t0() -> Instant {
    Instant::now()
}

#[test]
fn first_increment_always_permits() {
    let now = t0();
    let b = Bucket::new(1, 10.0, now);
    assert!(b.increment_at(now));
    assert_eq!(b.level(), 1);
}

#[test]
fn capacity_one_refuses_second_immediate_attempt() {
    let now = t0();
    let b = Bucket::new(1, 10.0, now);
    assert!(b.increment_at(now));
    assert!(!b.increment_at(now));
    assert_eq!(b.level(), 1);
}

#[test]
fn capacity_one_rate_ten_permits_again_after_100ms() {
    // Invariant 9: cap=1, rate=10 -> next permit no sooner than ~100ms.
    let now = t0();
    let b = Bucket::new(1, 10.0, now);
    assert!(b.increment_at(now));
    assert!(!b.increment_at(now + Duration::from_millis(50)));
    assert!(b.increment_at(now + Duration::from_millis(100)));
}

#[test]
fn idle_for_cap_over_rate_seconds_always_permits() {
    // Invariant 7.
    let now = t0();
    let cap = 5u32;
    let rate = 2.0;
    let b = Bucket::new(cap, rate, now);
    for _ in 0..cap {
        assert!(b.increment_at(now));
    }
    assert!(!b.increment_at(now));
    let idle = Duration::from_secs_f64(cap as f64 / rate);
    assert!(b.increment_at(now + idle));
}

#[test]
fn refuse_still_writes_back_level_and_timestamp() {
    let now = t0();
    let b = Bucket::new(1, 10.0, now);
    assert!(b.increment_at(now));
    let before = b.last_touch();
    let later = now + Duration::from_millis(1);
    assert!(!b.increment_at(later));
    assert_eq!(b.level(), b.capacity());
    assert!(b.last_touch() >= before);
}

#[test]
fn capacity_bound_over_window() {
    // Invariant 1: at most C + floor(r * elapsed) permits in any window.
    let now = t0();
    let cap = 3u32;
    let rate = 5.0;
    let b = Bucket::new(cap, rate, now);
    let window = Duration::from_secs(2);
    let step = Duration::from_millis(10);
    let mut t = now;
    let mut permits = 0u32;
    while t <= now + window {
        if b.increment_at(t) {
            permits += 1;
        }
        t += step;
    }
    let bound = cap as f64 + (rate * window.as_secs_f64()).floor();
    assert!((permits as f64) <= bound);
}

#[test]
fn reset_clears_level_to_zero() {
    // Invariant 5.
    let now = t0();
    let b = Bucket::new(2, 10.0, now);
    assert!(b.increment_at(now));
    assert!(b.increment_at(now));
    b.reset_at(now);
    assert_eq!(b.level(), 0);
}
