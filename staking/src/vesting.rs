//! Periodic linear vesting.
//!
//! Only whole periods count. With window `W` and period `P`, the vested share
//! at time `t` of a lock started at `s` is
//!
//! `min(floor((t − s) / P) × P, W) / W`
//!
//! Periods are always measured from the lock's start, never from the last
//! claim, so claiming early or often does not change the total released.

use crate::lock::LockRecord;
use custody_types::Timestamp;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingSchedule {
    window_secs: u64,
    period_secs: u64,
}

impl VestingSchedule {
    /// Callers validate `0 < period ≤ window` beforehand (see `StakingParams::validate`).
    pub fn new(window_secs: u64, period_secs: u64) -> Self {
        debug_assert!(period_secs > 0 && period_secs <= window_secs);
        Self {
            window_secs,
            period_secs,
        }
    }

    pub fn window_secs(&self) -> u64 {
        self.window_secs
    }

    pub fn period_secs(&self) -> u64 {
        self.period_secs
    }

    /// Seconds of the window that count as vested at `now`.
    pub fn vested_duration(&self, start: Timestamp, now: Timestamp) -> u64 {
        let elapsed = start.elapsed_since(now);
        let whole_periods = elapsed / self.period_secs.max(1);
        whole_periods
            .saturating_mul(self.period_secs)
            .min(self.window_secs)
    }

    /// Whether the whole window has passed.
    pub fn is_complete(&self, start: Timestamp, now: Timestamp) -> bool {
        start.has_expired(self.window_secs, now)
    }

    /// Cumulative amount of `principal` that should have been released by `now`.
    pub fn vested_amount(&self, principal: u128, start: Timestamp, now: Timestamp) -> Option<u128> {
        if self.window_secs == 0 || self.is_complete(start, now) {
            return Some(principal);
        }
        let vested = u128::from(self.vested_duration(start, now));
        Some(principal.checked_mul(vested)? / u128::from(self.window_secs))
    }

    /// What a claim at `now` releases from `lock`.
    ///
    /// Once the window has passed this is everything still locked; before
    /// that it is the vested amount minus what was already released, never
    /// more than what remains.
    pub fn releasable(&self, lock: &LockRecord, now: Timestamp) -> Option<u128> {
        if self.is_complete(lock.start_time, now) {
            return Some(lock.amount);
        }
        let due = self.vested_amount(lock.principal, lock.start_time, now)?;
        Some(due.saturating_sub(lock.released()).min(lock.amount))
    }
}
