use custody_asset::TransferError;
use custody_types::Address;
use custody_vrf::VrfError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GrowthError {
    #[error("{0} may not deliver randomness")]
    Unauthorized(Address),

    #[error("{owner} has no card in slot {slot}")]
    NotFound { owner: Address, slot: usize },

    #[error("amount must be non-zero")]
    InvalidAmount,

    #[error("transfer failed: {0}")]
    Transfer(#[from] TransferError),

    #[error("oracle: {0}")]
    Oracle(#[from] VrfError),

    #[error("arithmetic overflow in power computation")]
    Overflow,

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("corrupt state: {0}")]
    CorruptState(String),
}
