//! abf-guard: the decision engine, its configuration, and the background
//! bucket sweeper. Depends on `abf-core` (buckets/cache) and `abf-storage`
//! (the durable list), but knows nothing about transport (gRPC, CLI).

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod config;
pub mod guard;
pub mod logger;
pub mod sweeper;

pub use guard::Guard;
