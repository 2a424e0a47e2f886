//! abf-storage: the durable allow/deny list (`ListStore`).
//!
//! Everything here talks to Postgres through `sqlx`; it is the one component
//! in the guard whose operations may suspend on I/O (§5).

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod bwlist;
pub mod network;

pub use bwlist::{ListKind, ListRecord, ListSource, ListStore};
