//! Card records.

use custody_types::{Address, Timestamp};
use custody_vrf::RequestId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    pub owner: Address,
    /// Deposit the card was bought with.
    pub initial_power: u128,
    /// Power gained per whole day. `None` until randomness arrives.
    pub power_increment: Option<u128>,
    /// Caller-chosen seed mixed into the increment roll.
    pub tier_seed: u64,
    pub creation_time: Timestamp,
    /// Outstanding oracle request. Cleared once resolved.
    pub pending_request: Option<RequestId>,
}

impl CardRecord {
    pub fn new(
        owner: Address,
        initial_power: u128,
        tier_seed: u64,
        creation_time: Timestamp,
        request: RequestId,
    ) -> Self {
        Self {
            owner,
            initial_power,
            power_increment: None,
            tier_seed,
            creation_time,
            pending_request: Some(request),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.power_increment.is_some()
    }
}
