//! Stake positions.

use custody_registry::Indexed;
use custody_types::Address;
use serde::{Deserialize, Serialize};

/// Principal an owner has staked. Returned in full on unstake.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeRecord {
    pub owner: Address,
    pub amount: u128,
    /// 1-based slot in the stake registry, 0 once removed.
    pub index: u64,
}

impl StakeRecord {
    pub fn new(owner: Address, amount: u128) -> Self {
        Self {
            owner,
            amount,
            index: 0,
        }
    }
}

impl Indexed for StakeRecord {
    fn index(&self) -> u64 {
        self.index
    }

    fn set_index(&mut self, index: u64) {
        self.index = index;
    }
}
