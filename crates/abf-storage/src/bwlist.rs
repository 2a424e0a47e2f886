//! `ListStore`: the durable, network-keyed allow/deny list.
//!
//! Ported from the reference implementation's `internal/storage/bwlist`
//! package. The non-overlap check at `add` time is a single
//! `INSERT ... WHERE NOT EXISTS (...)` statement using Postgres's native
//! network-overlap operator (`&&`), which makes the check atomic with the
//! insert without an explicit transaction — concurrent overlapping inserts
//! cannot both succeed because the second `INSERT` re-evaluates the
//! `NOT EXISTS` predicate against the first's already-committed row.

use std::net::IpAddr;
use std::time::Duration;

use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Row};
use tokio::sync::Mutex as AsyncMutex;

use abf_core::AbfError;

use crate::network::parse_network;

/// Which list a network belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "list_kind", rename_all = "lowercase")]
pub enum ListKind {
    Allow,
    Deny,
}

impl ListKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ListKind::Allow => "allow",
            ListKind::Deny => "deny",
        }
    }
}

/// A single stored (network, kind) entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRecord {
    pub network: IpNetwork,
    pub kind: ListKind,
}

impl FromRow<'_, PgRow> for ListRecord {
    fn from_row(row: &PgRow) -> sqlx::Result<Self> {
        Ok(ListRecord {
            network: row.try_get("network")?,
            kind: row.try_get("kind")?,
        })
    }
}

/// Connection configuration for `ListStore::connect`.
pub struct ConnectOptions {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    pub sslmode: String,
    pub timeout: Duration,
}

impl ConnectOptions {
    fn to_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.user, self.password, self.host, self.port, self.dbname, self.sslmode
        )
    }
}

/// Durable store of allow/deny networks, backed by Postgres.
///
/// Shared via `Arc` across concurrent Guard callers: the pool handle itself
/// is cheap to clone and safe for concurrent use, so the connection lock is
/// held only long enough to read or install it, never across a query.
pub struct ListStore {
    pool: AsyncMutex<Option<PgPool>>,
    opts: ConnectOptions,
}

impl ListStore {
    pub fn new(opts: ConnectOptions) -> Self {
        Self {
            pool: AsyncMutex::new(None),
            opts,
        }
    }

    pub async fn connect(&self) -> Result<(), AbfError> {
        let pool = PgPoolOptions::new()
            .acquire_timeout(self.opts.timeout)
            .connect(&self.opts.to_url())
            .await
            .map_err(|e| AbfError::Internal(format!("failed to connect to db: {e}")))?;
        *self.pool.lock().await = Some(pool);
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), AbfError> {
        let pool = self.pool_handle().await?;
        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(|e| AbfError::Internal(format!("db ping failed: {e}")))?;
        Ok(())
    }

    pub async fn close(&self) {
        if let Some(pool) = self.pool.lock().await.take() {
            pool.close().await;
        }
    }

    /// Run the embedded migrations against the connected database. Safe to
    /// call on every startup: already-applied migrations are skipped.
    pub async fn migrate(&self) -> Result<(), AbfError> {
        let pool = self.pool_handle().await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AbfError::Internal(format!("running migrations failed: {e}")))?;
        Ok(())
    }

    /// Return a cloned pool handle, connecting on demand if none is
    /// established yet.
    async fn pool_handle(&self) -> Result<PgPool, AbfError> {
        if let Some(pool) = self.pool.lock().await.as_ref() {
            return Ok(pool.clone());
        }
        self.connect().await?;
        self.pool
            .lock()
            .await
            .clone()
            .ok_or_else(|| AbfError::Internal("db connection not established".into()))
    }

    /// Insert a record. Fails with `AbfError::Overlap` naming every
    /// intersecting stored record (kind and CIDR) if the new network
    /// overlaps anything already stored, regardless of kind.
    pub async fn add(&self, record: ListRecord) -> Result<(), AbfError> {
        let pool = self.pool_handle().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO bw_lists (network, kind)
            SELECT $1::inet, $2::list_kind
            WHERE NOT EXISTS (
                SELECT 1 FROM bw_lists WHERE network && $1::inet
            )
            "#,
        )
        .bind(record.network)
        .bind(record.kind)
        .execute(&pool)
        .await
        .map_err(|e| AbfError::Internal(format!("insert into bw_lists failed: {e}")))?;

        if inserted.rows_affected() != 0 {
            return Ok(());
        }

        let conflicts: Vec<ListRecord> = sqlx::query_as(
            "SELECT network, kind FROM bw_lists WHERE network && $1::inet",
        )
        .bind(record.network)
        .fetch_all(&pool)
        .await
        .map_err(|e| AbfError::Internal(format!("conflict lookup failed: {e}")))?;

        let nets: Vec<String> = conflicts
            .iter()
            .map(|r| format!("{} - {}", r.kind.as_str(), r.network))
            .collect();

        Err(AbfError::Overlap(format!(
            "can't insert '{}' into allow/deny list, intersects with: {}",
            record.network,
            nets.join(", ")
        )))
    }

    /// Remove the exact (network, kind) tuple. Absence is not an error.
    pub async fn remove(&self, record: ListRecord) -> Result<(), AbfError> {
        let pool = self.pool_handle().await?;
        sqlx::query("DELETE FROM bw_lists WHERE network = $1 AND kind = $2")
            .bind(record.network)
            .bind(record.kind)
            .execute(&pool)
            .await
            .map_err(|e| AbfError::Internal(format!("delete from bw_lists failed: {e}")))?;
        Ok(())
    }

    /// Return the unique record whose network contains `ip`, or `None`.
    /// Uniqueness follows from the non-overlap invariant enforced by `add`.
    pub async fn get_by_ip(&self, ip: IpAddr) -> Result<Option<ListRecord>, AbfError> {
        let pool = self.pool_handle().await?;
        let rec: Option<ListRecord> = sqlx::query_as(
            "SELECT network, kind FROM bw_lists WHERE $1::inet <<= network",
        )
        .bind(IpNetwork::from(ip))
        .fetch_optional(&pool)
        .await
        .map_err(|e| AbfError::Internal(format!("lookup by ip failed: {e}")))?;
        Ok(rec)
    }

    pub async fn remove_all(&self) -> Result<(), AbfError> {
        let pool = self.pool_handle().await?;
        sqlx::query("TRUNCATE TABLE bw_lists")
            .execute(&pool)
            .await
            .map_err(|e| AbfError::Internal(format!("truncate bw_lists failed: {e}")))?;
        Ok(())
    }
}

/// Object-safe view of `ListStore`'s mutation/lookup contract, so callers
/// (the Guard) can be tested against an in-memory double instead of a live
/// Postgres instance.
#[async_trait::async_trait]
pub trait ListSource: Send + Sync {
    async fn add(&self, record: ListRecord) -> Result<(), AbfError>;
    async fn remove(&self, record: ListRecord) -> Result<(), AbfError>;
    async fn get_by_ip(&self, ip: IpAddr) -> Result<Option<ListRecord>, AbfError>;
}

#[async_trait::async_trait]
impl ListSource for ListStore {
    async fn add(&self, record: ListRecord) -> Result<(), AbfError> {
        ListStore::add(self, record).await
    }

    async fn remove(&self, record: ListRecord) -> Result<(), AbfError> {
        ListStore::remove(self, record).await
    }

    async fn get_by_ip(&self, ip: IpAddr) -> Result<Option<ListRecord>, AbfError> {
        ListStore::get_by_ip(self, ip).await
    }
}

/// Build a `ListRecord` for the allow list from a CIDR or bare-IP string.
pub fn allow_record(network: &str) -> Result<ListRecord, AbfError> {
    Ok(ListRecord {
        network: parse_network(network)?,
        kind: ListKind::Allow,
    })
}

/// Build a `ListRecord` for the deny list from a CIDR or bare-IP string.
pub fn deny_record(network: &str) -> Result<ListRecord, AbfError> {
    Ok(ListRecord {
        network: parse_network(network)?,
        kind: ListKind::Deny,
    })
}
