//! Randomness oracle for card growth.
//!
//! Randomness is asynchronous: a request returns a [`RequestId`] straight
//! away and the words arrive later as a [`Fulfillment`], delivered to the
//! consumer through a separate entry point. Nothing blocks on the oracle.

pub mod coordinator;
pub mod error;

pub use coordinator::{derive_words, CoordinatorSnapshot, LocalCoordinator};
pub use error::VrfError;

use custody_types::KeyHash;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One 256-bit random word.
pub type RandomWord = [u8; 32];

/// Correlation id linking a request to its fulfillment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(u64);

impl RequestId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Parameters of one randomness request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomnessRequest {
    pub key_hash: KeyHash,
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_gas_limit: u32,
    pub num_words: u32,
}

/// Words delivered for a previously issued request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fulfillment {
    pub request_id: RequestId,
    pub words: Vec<RandomWord>,
}

/// Trait for issuing randomness requests.
pub trait RandomnessOracle: Send + Sync {
    /// Register a request and return its correlation id. Never blocks on fulfillment.
    fn request_randomness(&self, request: &RandomnessRequest) -> Result<RequestId, VrfError>;

    /// Human-readable name of this oracle.
    fn name(&self) -> &str;
}
