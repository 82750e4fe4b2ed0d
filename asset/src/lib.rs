//! Asset transfer service.
//!
//! The engines never touch balances directly. They move value through an
//! [`AssetTransfer`] bound to their custody account:
//! - `pull` takes a pre-approved amount from a depositor into custody
//! - `check_pull` answers whether that pull would succeed, without moving anything
//! - `push` pays an amount out of custody
//! - `mint` creates new units in custody (only when custody holds mint authority)
//!
//! Every call either moves the full amount or fails without side effects.
//! [`TokenLedger`] is the in-memory fungible token used by the node and tests.

pub mod custody;
pub mod error;
pub mod ledger;

pub use custody::Custody;
pub use error::TransferError;
pub use ledger::TokenLedger;

use custody_types::Address;

/// Pull/push contract between an engine and the asset it holds in custody.
pub trait AssetTransfer {
    /// Move `amount` from `from` into custody using `from`'s allowance.
    fn pull(&mut self, from: &Address, amount: u128) -> Result<(), TransferError>;

    /// Fail exactly when [`Self::pull`] with the same arguments would fail.
    fn check_pull(&self, from: &Address, amount: u128) -> Result<(), TransferError>;

    /// Move `amount` out of custody to `to`.
    fn push(&mut self, to: &Address, amount: u128) -> Result<(), TransferError>;

    /// Create `amount` new units credited to custody itself.
    fn mint(&mut self, amount: u128) -> Result<(), TransferError> {
        let _ = amount;
        Err(TransferError::MintUnsupported)
    }

    /// Units currently held by custody.
    fn custody_balance(&self) -> u128;
}
