//! abf-core: leaky-bucket rate limiting and the lookup cache (transport-agnostic).
//!
//! This crate is the hard part of the guard: it has no knowledge of gRPC,
//! Postgres or config files, only of buckets, stores and a time source.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod bucket;
pub mod bucket_store;
pub mod cache;
pub mod clock;
pub mod error;

pub use error::{AbfError, ClientCode, Result};
