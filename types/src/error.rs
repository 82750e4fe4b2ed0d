//! Top-level validation error shared across crates.

use thiserror::Error;

/// Errors raised while building shared types and parameters.
#[derive(Debug, Error)]
pub enum CustodyError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid key hash: {0}")]
    InvalidKeyHash(String),

    #[error("unknown network: {0:?} (expected live, test or dev)")]
    UnknownNetwork(String),

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("{0}")]
    Other(String),
}
