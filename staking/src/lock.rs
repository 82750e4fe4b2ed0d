//! Vesting lock positions.

use custody_registry::Indexed;
use custody_types::{Address, Timestamp};
use serde::{Deserialize, Serialize};

/// Tokens locked by an owner and released on the vesting schedule.
///
/// `principal` is everything ever locked; `amount` is what custody still
/// holds. Their difference is what has already been released.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    pub owner: Address,
    pub principal: u128,
    /// Remaining locked amount.
    pub amount: u128,
    /// Vesting starts here. Set by the first lock and never moved.
    pub start_time: Timestamp,
    pub last_claimed_time: Timestamp,
    /// 1-based slot in the lock registry, 0 once removed.
    pub index: u64,
}

impl LockRecord {
    pub fn new(owner: Address, amount: u128, now: Timestamp) -> Self {
        Self {
            owner,
            principal: amount,
            amount,
            start_time: now,
            last_claimed_time: now,
            index: 0,
        }
    }

    pub fn released(&self) -> u128 {
        self.principal.saturating_sub(self.amount)
    }
}

impl Indexed for LockRecord {
    fn index(&self) -> u64 {
        self.index
    }

    fn set_index(&mut self, index: u64) {
        self.index = index;
    }
}
