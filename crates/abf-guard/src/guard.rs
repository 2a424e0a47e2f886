//! The decision engine: combines the allow/deny list lookup with the three
//! per-identifier buckets into a single `auth` verdict, the same shape as
//! the teacher's `TenantPolicyRuntime` combining `check_len`/allowlist/
//! rate-limit checks into a `PolicyDecision`.

use std::sync::Arc;

use abf_core::bucket::Bucket;
use abf_core::bucket_store::BucketStore;
use abf_core::cache::LookupCache;
use abf_core::clock::Clock;
use abf_core::error::Result;
use abf_storage::bwlist::{ListKind, ListRecord, ListSource};
use abf_storage::network::parse_ip;
use tracing::{info, warn};

/// A `ListRecord` or the absence of one, the value cached by
/// [`LookupCache`]. `None` is the negative-result marker from §4.5.1.
pub type LookupEntry = Option<ListRecord>;

/// Outcome of [`Guard::auth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Permit,
    Refuse,
}

impl Verdict {
    pub fn ok(self) -> bool {
        matches!(self, Verdict::Permit)
    }
}

/// The three rate-limit dimensions plus the list store and lookup cache.
/// Construct once at startup and share via `Arc`.
pub struct Guard {
    login_store: Arc<BucketStore>,
    password_store: Arc<BucketStore>,
    ip_store: Arc<BucketStore>,
    list_store: Arc<dyn ListSource>,
    cache: LookupCache<String, LookupEntry>,
    max_logins: u32,
    max_passwords: u32,
    max_ips: u32,
    clock: Arc<dyn Clock>,
}

impl Guard {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        list_store: Arc<dyn ListSource>,
        clock: Arc<dyn Clock>,
        max_logins: u32,
        max_passwords: u32,
        max_ips: u32,
        cache_size: usize,
        cache_ttl: std::time::Duration,
        bucket_ttl: std::time::Duration,
    ) -> Self {
        Self {
            login_store: Arc::new(BucketStore::new(bucket_ttl)),
            password_store: Arc::new(BucketStore::new(bucket_ttl)),
            ip_store: Arc::new(BucketStore::new(bucket_ttl)),
            list_store,
            cache: LookupCache::new(cache_size, cache_ttl),
            max_logins,
            max_passwords,
            max_ips,
            clock,
        }
    }

    pub fn login_store(&self) -> &BucketStore {
        &self.login_store
    }
    pub fn password_store(&self) -> &BucketStore {
        &self.password_store
    }
    pub fn ip_store(&self) -> &BucketStore {
        &self.ip_store
    }

    /// Shared handles for the sweeper tasks spawned at startup.
    pub fn store_handles(&self) -> [(&'static str, Arc<BucketStore>); 3] {
        [
            ("login", self.login_store.clone()),
            ("password", self.password_store.clone()),
            ("ip", self.ip_store.clone()),
        ]
    }

    /// §4.5: list lookup short-circuits; otherwise all three bucket
    /// increments run unconditionally, never short-circuited.
    pub async fn auth(&self, login: &str, password: &str, ip: &str) -> Result<Verdict> {
        if let Some(record) = self.lookup_with_cache(ip).await? {
            return Ok(match record.kind {
                ListKind::Allow => Verdict::Permit,
                ListKind::Deny => Verdict::Refuse,
            });
        }

        let p1 = Self::bucket_increment(&self.login_store, login, self.max_logins, &*self.clock);
        let p2 = Self::bucket_increment(
            &self.password_store,
            password,
            self.max_passwords,
            &*self.clock,
        );
        let p3 = Self::bucket_increment(&self.ip_store, ip, self.max_ips, &*self.clock);

        Ok(if p1 && p2 && p3 {
            Verdict::Permit
        } else {
            Verdict::Refuse
        })
    }

    /// §4.5 bucket-increment helper: get-or-create, increment, write back
    /// regardless of verdict so a refused attempt still records its level
    /// and timestamp.
    fn bucket_increment(store: &BucketStore, key: &str, capacity: u32, clock: &dyn Clock) -> bool {
        let bucket = store.get_or_insert_with(key, capacity, clock);
        let permitted = bucket.increment(clock);
        store.set(key, bucket);
        permitted
    }

    /// §4.5.1: cached containing-network lookup, with negative-result
    /// caching so a non-listed IP costs one store round-trip per
    /// `cache_ttl`, not one per request. `ip` must be a bare IP literal, not
    /// a CIDR network: `auth`/`reset` never accept one (§6).
    async fn lookup_with_cache(&self, ip: &str) -> Result<LookupEntry> {
        if let Some(hit) = self.cache.get(&ip.to_string(), &*self.clock) {
            return Ok(hit);
        }

        let parsed = parse_ip(ip)?;
        let record = self.list_store.get_by_ip(parsed).await?;
        self.cache.set(ip.to_string(), record.clone(), &*self.clock);
        Ok(record)
    }

    /// §4.5 reset: for each non-empty field, replace its bucket with a
    /// fresh one at the configured capacity. Absent keys are no-ops. A
    /// malformed non-empty `ip` is rejected before anything is touched.
    pub fn reset(&self, login: &str, password: &str, ip: &str) -> Result<()> {
        if !ip.is_empty() {
            parse_ip(ip)?;
        }

        let now = self.clock.now();
        if !login.is_empty() && self.login_store.get(login).is_some() {
            self.login_store.set(
                login,
                Arc::new(Bucket::with_capacity_per_minute(self.max_logins, now)),
            );
        }
        if !password.is_empty() && self.password_store.get(password).is_some() {
            self.password_store.set(
                password,
                Arc::new(Bucket::with_capacity_per_minute(self.max_passwords, now)),
            );
        }
        if !ip.is_empty() && self.ip_store.get(ip).is_some() {
            self.ip_store.set(
                ip,
                Arc::new(Bucket::with_capacity_per_minute(self.max_ips, now)),
            );
        }
        Ok(())
    }

    pub async fn add_allow(&self, network: &str) -> Result<()> {
        self.mutate_list(abf_storage::bwlist::allow_record(network)?)
            .await
    }

    pub async fn add_deny(&self, network: &str) -> Result<()> {
        self.mutate_list(abf_storage::bwlist::deny_record(network)?)
            .await
    }

    pub async fn remove_allow(&self, network: &str) -> Result<()> {
        self.unmutate_list(abf_storage::bwlist::allow_record(network)?)
            .await
    }

    pub async fn remove_deny(&self, network: &str) -> Result<()> {
        self.unmutate_list(abf_storage::bwlist::deny_record(network)?)
            .await
    }

    async fn mutate_list(&self, record: ListRecord) -> Result<()> {
        match self.list_store.add(record).await {
            Ok(()) => {
                self.cache.clear();
                info!("list store updated, lookup cache cleared");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "list mutation rejected, cache left untouched");
                Err(e)
            }
        }
    }

    async fn unmutate_list(&self, record: ListRecord) -> Result<()> {
        match self.list_store.remove(record).await {
            Ok(()) => {
                self.cache.clear();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "list removal failed, cache left untouched");
                Err(e)
            }
        }
    }
}
