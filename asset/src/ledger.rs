//! In-memory fungible token.

use crate::error::TransferError;
use custody_types::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A fungible token with balances, allowances and a single mint authority.
///
/// Every mutating method validates all preconditions before touching any
/// balance, so a failed call leaves the ledger unchanged.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenLedger {
    /// The token's own address.
    address: Address,
    /// The only account allowed to mint. Can be handed over with [`Self::set_minter`].
    minter: Address,
    balances: HashMap<Address, u128>,
    /// owner → spender → remaining allowance.
    allowances: HashMap<Address, HashMap<Address, u128>>,
    total_supply: u128,
}

impl TokenLedger {
    pub fn new(address: Address, minter: Address) -> Self {
        Self {
            address,
            minter,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            total_supply: 0,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn minter(&self) -> &Address {
        &self.minter
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn balance_of(&self, owner: &Address) -> u128 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(owner)
            .and_then(|m| m.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Accounts with a non-zero balance.
    pub fn holders(&self) -> impl Iterator<Item = (&Address, u128)> + '_ {
        self.balances
            .iter()
            .filter(|(_, b)| **b > 0)
            .map(|(a, b)| (a, *b))
    }

    /// Hand mint authority to another account (e.g. an engine's custody).
    pub fn set_minter(&mut self, caller: &Address, new_minter: Address) -> Result<(), TransferError> {
        if *caller != self.minter {
            return Err(TransferError::MintUnauthorized(*caller));
        }
        tracing::debug!(token = %self.address, from = %self.minter, to = %new_minter, "mint authority moved");
        self.minter = new_minter;
        Ok(())
    }

    pub fn mint(&mut self, caller: &Address, to: &Address, amount: u128) -> Result<(), TransferError> {
        if *caller != self.minter {
            return Err(TransferError::MintUnauthorized(*caller));
        }
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TransferError::Overflow)?;
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TransferError::Overflow)?;
        self.total_supply = supply;
        self.balances.insert(*to, balance);
        tracing::debug!(token = %self.address, %to, amount, "minted");
        Ok(())
    }

    /// Set `spender`'s allowance over `owner`'s balance, replacing any previous value.
    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: u128) {
        self.allowances
            .entry(*owner)
            .or_default()
            .insert(*spender, amount);
    }

    pub fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), TransferError> {
        self.check_move(from, to, amount)?;
        self.apply_move(from, to, amount);
        Ok(())
    }

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming allowance.
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TransferError> {
        self.check_transfer_from(spender, from, to, amount)?;
        let approved = self.allowance(from, spender);
        self.apply_move(from, to, amount);
        self.allowances
            .entry(*from)
            .or_default()
            .insert(*spender, approved - amount);
        Ok(())
    }

    /// Whether [`Self::transfer_from`] with the same arguments would succeed.
    pub fn check_transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TransferError> {
        let approved = self.allowance(from, spender);
        if approved < amount {
            return Err(TransferError::InsufficientAllowance {
                needed: amount,
                available: approved,
            });
        }
        self.check_move(from, to, amount)
    }

    fn check_move(&self, from: &Address, to: &Address, amount: u128) -> Result<(), TransferError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(TransferError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        if from != to {
            self.balance_of(to)
                .checked_add(amount)
                .ok_or(TransferError::Overflow)?;
        }
        Ok(())
    }

    fn apply_move(&mut self, from: &Address, to: &Address, amount: u128) {
        if from == to || amount == 0 {
            return;
        }
        let from_balance = self.balance_of(from) - amount;
        let to_balance = self.balance_of(to) + amount;
        self.balances.insert(*from, from_balance);
        self.balances.insert(*to, to_balance);
    }
}
