//! Transfer errors.

use custody_types::Address;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransferError {
    #[error("insufficient balance: need {needed}, available {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("insufficient allowance: need {needed}, approved {available}")]
    InsufficientAllowance { needed: u128, available: u128 },

    #[error("{0} is not allowed to mint")]
    MintUnauthorized(Address),

    #[error("asset does not support minting")]
    MintUnsupported,

    #[error("arithmetic overflow in balance update")]
    Overflow,
}
