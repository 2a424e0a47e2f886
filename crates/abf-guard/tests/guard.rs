use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use abf_core::clock::{Clock, TestClock};
use abf_core::error::{AbfError, Result};
use abf_guard::guard::{Guard, Verdict};
use abf_storage::bwlist::{ListRecord, ListSource};
use abf_storage::network::parse_network;

/// In-memory list store for Guard tests, with the same non-overlap and
/// containing-match semantics as the Postgres-backed `ListStore`, plus a
/// call counter so tests can assert on negative-result caching (S6).
struct FakeListSource {
    records: Mutex<Vec<ListRecord>>,
    lookups: AtomicUsize,
}

impl FakeListSource {
    fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            lookups: AtomicUsize::new(0),
        }
    }

    fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ListSource for FakeListSource {
    async fn add(&self, record: ListRecord) -> Result<()> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let conflicts: Vec<String> = records
            .iter()
            .filter(|r| r.network.overlaps(record.network))
            .map(|r| format!("{} - {}", r.kind.as_str(), r.network))
            .collect();
        if !conflicts.is_empty() {
            return Err(AbfError::Overlap(format!(
                "can't insert '{}' into allow/deny list, intersects with: {}",
                record.network,
                conflicts.join(", ")
            )));
        }
        records.push(record);
        Ok(())
    }

    async fn remove(&self, record: ListRecord) -> Result<()> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.retain(|r| !(r.network == record.network && r.kind == record.kind));
        Ok(())
    }

    async fn get_by_ip(&self, ip: IpAddr) -> Result<Option<ListRecord>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records.iter().find(|r| r.network.contains(ip)).cloned())
    }
}

fn make_guard(
    list_store: Arc<FakeListSource>,
    clock: Arc<TestClock>,
    max_logins: u32,
    max_passwords: u32,
    max_ips: u32,
) -> Guard {
    Guard::new(
        list_store,
        clock,
        max_logins,
        max_passwords,
        max_ips,
        100,
        Duration::from_secs(60),
        Duration::from_secs(300),
    )
}

#[tokio::test]
async fn s1_login_bucket_exhausts_before_password_or_ip() {
    let clock = Arc::new(TestClock::new());
    let list = Arc::new(FakeListSource::new());
    let guard = make_guard(list, clock, 2, 4, 6);

    assert_eq!(guard.auth("a", "b", "1.1.1.1").await.unwrap(), Verdict::Permit);
    assert_eq!(guard.auth("a", "b", "1.1.1.1").await.unwrap(), Verdict::Permit);
    // Login bucket (cap 2) is now saturated; refused regardless of the
    // other two dimensions' remaining headroom.
    assert_eq!(guard.auth("a", "b", "1.1.1.1").await.unwrap(), Verdict::Refuse);
}

#[tokio::test]
async fn s1_probing_a_different_axis_still_consumes_the_saturated_ones() {
    let clock = Arc::new(TestClock::new());
    let list = Arc::new(FakeListSource::new());
    let guard = make_guard(list, clock, 2, 4, 6);

    for _ in 0..2 {
        assert_eq!(guard.auth("a", "b", "1.1.1.1").await.unwrap(), Verdict::Permit);
    }
    // Different login, same password/ip: login bucket for "c" is fresh, but
    // password bucket for "b" is at level 2 of 4 (not yet saturated) so
    // this still permits; the contract under test is that all three
    // dimensions are independently tracked, not short-circuited.
    let v = guard.auth("c", "b", "1.1.1.1").await.unwrap();
    assert_eq!(v, Verdict::Permit);
}

#[tokio::test]
async fn s2_allow_list_short_circuits_permit_without_consuming_buckets() {
    let clock = Arc::new(TestClock::new());
    let list = Arc::new(FakeListSource::new());
    let guard = make_guard(list, clock, 1, 1, 1);

    guard.add_allow("10.0.0.0/8").await.unwrap();
    assert_eq!(
        guard.auth("x", "y", "10.5.5.5").await.unwrap(),
        Verdict::Permit
    );
    // Buckets untouched: a non-listed ip can still make its own first
    // attempt without being refused by exhaustion from the allow-listed
    // traffic above.
    assert_eq!(
        guard.auth("x", "y", "8.8.8.8").await.unwrap(),
        Verdict::Permit
    );
}

#[tokio::test]
async fn s2_deny_list_short_circuits_refuse() {
    let clock = Arc::new(TestClock::new());
    let list = Arc::new(FakeListSource::new());
    let guard = make_guard(list, clock, 10, 10, 10);

    guard.add_deny("192.168.1.0/24").await.unwrap();
    assert_eq!(
        guard.auth("x", "y", "192.168.1.50").await.unwrap(),
        Verdict::Refuse
    );
}

#[tokio::test]
async fn s3_overlapping_add_is_rejected_and_store_is_unchanged() {
    let clock = Arc::new(TestClock::new());
    let list = Arc::new(FakeListSource::new());
    let guard = make_guard(list.clone(), clock, 10, 10, 10);

    guard.add_allow("10.0.0.0/8").await.unwrap();
    let err = guard.add_deny("10.0.0.0/16").await.unwrap_err();
    assert_eq!(err.client_code(), abf_core::error::ClientCode::Overlap);
    assert!(err.to_string().contains("allow - 10.0.0.0/8"));

    let recorded = parse_network("10.0.0.0/16").unwrap();
    assert!(list.get_by_ip(recorded.ip()).await.unwrap().is_some());
}

#[tokio::test]
async fn s4_list_mutation_invalidates_a_cached_negative_result() {
    let clock = Arc::new(TestClock::new());
    let list = Arc::new(FakeListSource::new());
    let guard = make_guard(list, clock, 10, 10, 10);

    // First auth call on this ip caches a negative (no-list-match) result.
    guard.auth("x", "y", "10.5.5.5").await.unwrap();
    guard.add_allow("10.0.0.0/8").await.unwrap();
    assert_eq!(
        guard.auth("x", "y", "10.5.5.5").await.unwrap(),
        Verdict::Permit
    );
}

#[tokio::test]
async fn s5_sweeper_removes_untouched_bucket_but_spares_a_touched_one() {
    let clock = Arc::new(TestClock::new());
    let list = Arc::new(FakeListSource::new());
    let guard = make_guard(list, clock.clone(), 10, 10, 10);

    guard.auth("idle", "idle", "1.1.1.1").await.unwrap();
    guard.auth("busy", "busy", "2.2.2.2").await.unwrap();

    clock.advance(Duration::from_millis(150));
    guard.auth("busy", "busy", "2.2.2.2").await.unwrap();
    guard.login_store().sweep_at(clock.now());

    assert!(guard.login_store().get("busy").is_some());
}

#[tokio::test]
async fn s6_negative_lookup_is_cached_across_calls() {
    let clock = Arc::new(TestClock::new());
    let list = Arc::new(FakeListSource::new());
    let guard = make_guard(list.clone(), clock, 10, 10, 10);

    guard.auth("x", "y", "8.8.8.8").await.unwrap();
    guard.auth("x", "y", "8.8.8.8").await.unwrap();
    assert_eq!(list.lookup_count(), 1);
}

#[tokio::test]
async fn reset_clears_only_touched_dimensions() {
    let clock = Arc::new(TestClock::new());
    let list = Arc::new(FakeListSource::new());
    let guard = make_guard(list, clock, 1, 1, 1);

    guard.auth("a", "b", "1.1.1.1").await.unwrap();
    assert_eq!(guard.login_store().get("a").unwrap().level(), 1);

    guard.reset("a", "", "").unwrap();

    assert_eq!(guard.login_store().get("a").unwrap().level(), 0);
    // password/ip untouched by this reset call since those fields were empty.
    assert_eq!(guard.password_store().get("b").unwrap().level(), 1);
}

#[tokio::test]
async fn reset_on_absent_key_is_a_no_op() {
    let clock = Arc::new(TestClock::new());
    let list = Arc::new(FakeListSource::new());
    let guard = make_guard(list, clock, 1, 1, 1);

    guard.reset("never-seen", "", "").unwrap();
    assert!(guard.login_store().get("never-seen").is_none());
}

#[tokio::test]
async fn reset_rejects_malformed_non_empty_ip() {
    let clock = Arc::new(TestClock::new());
    let list = Arc::new(FakeListSource::new());
    let guard = make_guard(list, clock, 1, 1, 1);

    let err = guard.reset("a", "", "not-an-ip").unwrap_err();
    assert_eq!(err.client_code(), abf_core::error::ClientCode::InvalidArgument);
}

#[tokio::test]
async fn reset_accepts_empty_ip_without_validation() {
    let clock = Arc::new(TestClock::new());
    let list = Arc::new(FakeListSource::new());
    let guard = make_guard(list, clock, 1, 1, 1);

    guard.reset("", "", "").unwrap();
}

#[tokio::test]
async fn auth_rejects_a_cidr_literal_as_ip() {
    let clock = Arc::new(TestClock::new());
    let list = Arc::new(FakeListSource::new());
    let guard = make_guard(list, clock, 10, 10, 10);

    let err = guard.auth("a", "b", "10.0.0.0/8").await.unwrap_err();
    assert_eq!(err.client_code(), abf_core::error::ClientCode::InvalidArgument);
    // Rejected before any bucket is touched.
    assert!(guard.login_store().get("a").is_none());
}
