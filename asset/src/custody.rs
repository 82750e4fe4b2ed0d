//! Custody account view over a [`TokenLedger`].

use crate::error::TransferError;
use crate::ledger::TokenLedger;
use crate::AssetTransfer;
use custody_types::Address;

/// Binds a ledger to the account an engine holds deposits in.
///
/// Deposits are pulled with the depositor's allowance granted to `account`.
pub struct Custody<'a> {
    ledger: &'a mut TokenLedger,
    account: Address,
}

impl<'a> Custody<'a> {
    pub fn new(ledger: &'a mut TokenLedger, account: Address) -> Self {
        Self { ledger, account }
    }

    pub fn account(&self) -> &Address {
        &self.account
    }
}

impl AssetTransfer for Custody<'_> {
    fn pull(&mut self, from: &Address, amount: u128) -> Result<(), TransferError> {
        let account = self.account;
        self.ledger.transfer_from(&account, from, &account, amount)
    }

    fn check_pull(&self, from: &Address, amount: u128) -> Result<(), TransferError> {
        self.ledger
            .check_transfer_from(&self.account, from, &self.account, amount)
    }

    fn push(&mut self, to: &Address, amount: u128) -> Result<(), TransferError> {
        let account = self.account;
        self.ledger.transfer(&account, to, amount)
    }

    fn mint(&mut self, amount: u128) -> Result<(), TransferError> {
        let account = self.account;
        self.ledger.mint(&account, &account, amount)
    }

    fn custody_balance(&self) -> u128 {
        self.ledger.balance_of(&self.account)
    }
}
