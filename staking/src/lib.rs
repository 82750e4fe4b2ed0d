//! Stake and vesting engine.
//!
//! Two positional registries share one custody account:
//! - stakes: principal returned in full on `unstake`, which anyone may trigger
//!   but which always pays the owner
//! - locks: principal released on a periodic vesting schedule through `claim`
//!
//! Locking is gated by an admin-maintained blacklist, and the admin can sweep
//! every position back to its owner with `emergency_withdraw`.

pub mod blacklist;
pub mod engine;
pub mod error;
pub mod lock;
pub mod stake;
pub mod vesting;

pub use blacklist::Blacklist;
pub use engine::{ClaimOutcome, StakingEngine, StakingState, WithdrawReport};
pub use error::StakingError;
pub use lock::LockRecord;
pub use stake::StakeRecord;
pub use vesting::VestingSchedule;
