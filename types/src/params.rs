//! Construction-time parameters for the two engines.
//!
//! Parameters are fixed when an engine is built. Both sets carry the admin
//! identity explicitly; privileged operations compare the caller against it.

use crate::address::Address;
use crate::error::CustodyError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One day in seconds.
pub const DAY_SECS: u64 = 86_400;

/// Parameters of the staking / vesting engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingParams {
    /// The only identity allowed to edit the blacklist and sweep custody.
    pub admin: Address,

    /// The asset held in custody.
    pub asset: Address,

    /// Total vesting duration `W` in seconds.
    pub vesting_window_secs: u64,

    /// Vesting granularity `P` in seconds. Only whole periods vest.
    pub vesting_period_secs: u64,
}

impl StakingParams {
    /// Default vesting window: 360 days.
    pub const DEFAULT_WINDOW_SECS: u64 = 360 * DAY_SECS;
    /// Default vesting period: 30 days.
    pub const DEFAULT_PERIOD_SECS: u64 = 30 * DAY_SECS;

    pub fn new(admin: Address, asset: Address) -> Self {
        Self {
            admin,
            asset,
            vesting_window_secs: Self::DEFAULT_WINDOW_SECS,
            vesting_period_secs: Self::DEFAULT_PERIOD_SECS,
        }
    }

    pub fn with_schedule(mut self, window_secs: u64, period_secs: u64) -> Self {
        self.vesting_window_secs = window_secs;
        self.vesting_period_secs = period_secs;
        self
    }

    /// Reject schedules where `P = 0` or `P > W`.
    pub fn validate(&self) -> Result<(), CustodyError> {
        if self.vesting_period_secs == 0 {
            return Err(CustodyError::InvalidParams(
                "vesting period must be non-zero".into(),
            ));
        }
        if self.vesting_period_secs > self.vesting_window_secs {
            return Err(CustodyError::InvalidParams(format!(
                "vesting period {}s exceeds window {}s",
                self.vesting_period_secs, self.vesting_window_secs
            )));
        }
        Ok(())
    }
}

/// Key material identifying the oracle's proving key.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyHash([u8; 32]);

impl KeyHash {
    pub const ZERO: Self = Self([0u8; 32]);

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_hex(s: &str) -> Result<Self, CustodyError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(digits).map_err(|e| CustodyError::InvalidKeyHash(e.to_string()))?;
        let bytes: [u8; 32] = raw
            .try_into()
            .map_err(|v: Vec<u8>| CustodyError::InvalidKeyHash(format!("expected 32 bytes, got {}", v.len())))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for KeyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for KeyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyHash(0x{})", hex::encode(&self.0[..4]))
    }
}

impl TryFrom<String> for KeyHash {
    type Error = CustodyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<KeyHash> for String {
    fn from(k: KeyHash) -> Self {
        k.to_string()
    }
}

/// Parameters of the randomized growth engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthParams {
    /// Administrative identity of the growth engine.
    pub admin: Address,

    /// The asset cards are bought with and paid out in.
    pub asset: Address,

    /// The randomness coordinator. Only this address may deliver fulfillments.
    pub coordinator: Address,

    /// Token used to pay the oracle fee.
    pub fee_token: Address,

    /// Oracle proving key.
    pub key_hash: KeyHash,

    /// Oracle billing subscription.
    pub subscription_id: u64,

    /// Gas budget the oracle grants the fulfillment callback.
    pub callback_gas_limit: u32,

    /// Confirmations the oracle waits for before fulfilling.
    pub request_confirmations: u16,

    /// Random words requested per card.
    pub num_words: u32,

    /// Length of one growth step in seconds.
    pub day_length_secs: u64,

    /// Smallest per-day power increment a card can roll.
    pub min_increment: u128,

    /// Largest per-day power increment a card can roll.
    pub max_increment: u128,
}

impl GrowthParams {
    pub const DEFAULT_CALLBACK_GAS_LIMIT: u32 = 2_000_000;
    pub const DEFAULT_REQUEST_CONFIRMATIONS: u16 = 3;

    pub fn new(admin: Address, asset: Address, coordinator: Address) -> Self {
        Self {
            admin,
            asset,
            coordinator,
            fee_token: Address::ZERO,
            key_hash: KeyHash::ZERO,
            subscription_id: 1,
            callback_gas_limit: Self::DEFAULT_CALLBACK_GAS_LIMIT,
            request_confirmations: Self::DEFAULT_REQUEST_CONFIRMATIONS,
            num_words: 1,
            day_length_secs: DAY_SECS,
            min_increment: 1,
            max_increment: 100,
        }
    }

    pub fn validate(&self) -> Result<(), CustodyError> {
        if self.day_length_secs == 0 {
            return Err(CustodyError::InvalidParams("day length must be non-zero".into()));
        }
        if self.num_words == 0 {
            return Err(CustodyError::InvalidParams(
                "at least one random word is required".into(),
            ));
        }
        if self.min_increment > self.max_increment {
            return Err(CustodyError::InvalidParams(format!(
                "increment range {}..={} is empty",
                self.min_increment, self.max_increment
            )));
        }
        Ok(())
    }
}
