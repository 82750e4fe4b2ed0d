//! Fundamental types for the custody ledger.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! owner addresses, timestamps and the clock abstraction, engine parameters,
//! network identifiers and the shared validation error.

pub mod address;
pub mod error;
pub mod network;
pub mod params;
pub mod time;

pub use address::Address;
pub use error::CustodyError;
pub use network::NetworkId;
pub use params::{GrowthParams, KeyHash, StakingParams, DAY_SECS};
pub use time::{Clock, SystemClock, Timestamp};
