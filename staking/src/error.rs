//! Staking-specific errors.

use custody_asset::TransferError;
use custody_registry::RegistryError;
use custody_types::Address;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StakingError {
    #[error("{0} is not the admin")]
    Unauthorized(Address),

    #[error("{0} is blacklisted")]
    Blacklisted(Address),

    #[error("no active record for {0}")]
    NotFound(Address),

    #[error("amount must be non-zero")]
    InvalidAmount,

    #[error("transfer failed: {0}")]
    Transfer(#[from] TransferError),

    #[error("registry: {0}")]
    Registry(#[from] RegistryError),

    #[error("arithmetic overflow in staking computation")]
    Overflow,

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("corrupt state: {0}")]
    CorruptState(String),
}
