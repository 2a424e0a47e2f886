//! abf-rpc: gRPC transport for the guard, plus its logging interceptor.

pub mod interceptor;
pub mod service;

/// Generated `tonic`/`prost` types and service trait, from `proto/abf.proto`.
pub mod pb {
    tonic::include_proto!("abf");
}

pub use service::AbfService;
