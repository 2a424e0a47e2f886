//! Shared error type across abf crates.

use thiserror::Error;

/// Client-facing error codes (stable across the RPC boundary).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Malformed input (bad IP/CIDR literal, bad argument count, ...).
    InvalidArgument,
    /// Attempted to add a network overlapping an existing list entry.
    Overlap,
    /// Anything else: transport failure, store failure, ...
    Internal,
}

impl ClientCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::InvalidArgument => "INVALID_ARGUMENT",
            ClientCode::Overlap => "OVERLAP",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, AbfError>;

/// Unified error type used by every abf crate.
#[derive(Debug, Error)]
pub enum AbfError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("network overlaps existing list entries: {0}")]
    Overlap(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AbfError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            AbfError::InvalidArgument(_) => ClientCode::InvalidArgument,
            AbfError::Overlap(_) => ClientCode::Overlap,
            AbfError::Internal(_) => ClientCode::Internal,
        }
    }
}
