//! Core staking and vesting engine.

use crate::blacklist::Blacklist;
use crate::error::StakingError;
use crate::lock::LockRecord;
use crate::stake::StakeRecord;
use crate::vesting::VestingSchedule;
use custody_asset::{AssetTransfer, TransferError};
use custody_registry::IndexedRegistry;
use custody_types::{Address, Clock, StakingParams, Timestamp};
use custody_utils::format_duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Everything the engine persists: both registries and the blacklist.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StakingState {
    pub stakes: IndexedRegistry<Address, StakeRecord>,
    pub locks: IndexedRegistry<Address, LockRecord>,
    pub blacklist: Blacklist,
}

/// Result of a successful claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimOutcome {
    /// Amount paid to the owner by this claim (may be 0).
    pub released: u128,
    /// Amount still locked afterwards.
    pub remaining: u128,
    /// Whether the lock was fully vested and removed.
    pub completed: bool,
}

/// Result of an emergency sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WithdrawReport {
    pub stakes_paid: Vec<(Address, u128)>,
    pub locks_paid: Vec<(Address, u128)>,
    /// Records whose payout failed. They remain in their registry untouched.
    pub failed: Vec<(Address, TransferError)>,
}

impl WithdrawReport {
    pub fn total_paid(&self) -> u128 {
        self.stakes_paid
            .iter()
            .chain(self.locks_paid.iter())
            .fold(0u128, |acc, (_, a)| acc.saturating_add(*a))
    }

    /// Everything paid to one owner across both registries.
    pub fn paid_to(&self, owner: &Address) -> u128 {
        self.stakes_paid
            .iter()
            .chain(self.locks_paid.iter())
            .filter(|(o, _)| o == owner)
            .fold(0u128, |acc, (_, a)| acc.saturating_add(*a))
    }
}

/// The stake / lock engine.
///
/// Every custody-moving operation validates first, then calls the asset
/// service, and only mutates its registries once the transfer succeeded.
pub struct StakingEngine {
    params: StakingParams,
    schedule: VestingSchedule,
    clock: Arc<dyn Clock>,
    state: StakingState,
}

impl StakingEngine {
    pub fn new(params: StakingParams, clock: Arc<dyn Clock>) -> Result<Self, StakingError> {
        Self::from_state(params, clock, StakingState::default())
    }

    /// Rebuild an engine around previously persisted state.
    pub fn from_state(
        params: StakingParams,
        clock: Arc<dyn Clock>,
        state: StakingState,
    ) -> Result<Self, StakingError> {
        params
            .validate()
            .map_err(|e| StakingError::InvalidParams(e.to_string()))?;
        if !state.stakes.is_dense() || !state.locks.is_dense() {
            return Err(StakingError::CorruptState(
                "registry indices are not dense".into(),
            ));
        }
        let schedule = VestingSchedule::new(params.vesting_window_secs, params.vesting_period_secs);
        Ok(Self {
            params,
            schedule,
            clock,
            state,
        })
    }

    pub fn params(&self) -> &StakingParams {
        &self.params
    }

    pub fn schedule(&self) -> &VestingSchedule {
        &self.schedule
    }

    pub fn state(&self) -> &StakingState {
        &self.state
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    // ── Stake ───────────────────────────────────────────────────────────

    /// Pull `amount` from `caller` into custody and add it to their stake.
    ///
    /// Returns the caller's stake index.
    pub fn stake(
        &mut self,
        caller: &Address,
        amount: u128,
        asset: &mut dyn AssetTransfer,
    ) -> Result<u64, StakingError> {
        if amount == 0 {
            return Err(StakingError::InvalidAmount);
        }
        let total = match self.state.stakes.get(caller) {
            Some(existing) => existing
                .amount
                .checked_add(amount)
                .ok_or(StakingError::Overflow)?,
            None => amount,
        };

        asset.pull(caller, amount)?;

        let index = match self.state.stakes.get_mut(caller) {
            Some(existing) => {
                existing.amount = total;
                existing.index
            }
            None => self
                .state
                .stakes
                .insert(*caller, StakeRecord::new(*caller, amount))?,
        };
        tracing::info!(owner = %caller, amount, total, index, "staked");
        Ok(index)
    }

    /// Pay `owner` their whole stake and remove the record.
    ///
    /// Anyone may trigger this; the beneficiary is always `owner`.
    pub fn unstake(
        &mut self,
        caller: &Address,
        owner: &Address,
        asset: &mut dyn AssetTransfer,
    ) -> Result<u128, StakingError> {
        let amount = self
            .state
            .stakes
            .get(owner)
            .map(|r| r.amount)
            .ok_or(StakingError::NotFound(*owner))?;

        asset.push(owner, amount)?;

        self.state.stakes.remove(owner);
        tracing::info!(%caller, %owner, amount, "unstaked");
        Ok(amount)
    }

    pub fn stake_info(&self, owner: &Address) -> Option<&StakeRecord> {
        self.state.stakes.get(owner)
    }

    pub fn stake_count(&self) -> usize {
        self.state.stakes.len()
    }

    pub fn stakes(&self) -> impl Iterator<Item = &StakeRecord> {
        self.state.stakes.iter().map(|(_, r)| r)
    }

    pub fn total_staked(&self) -> u128 {
        self.stakes()
            .fold(0u128, |acc, r| acc.saturating_add(r.amount))
    }

    // ── Lock / claim ────────────────────────────────────────────────────

    /// Pull `amount` from `caller` into a vesting lock.
    ///
    /// The first lock starts the vesting clock; later locks only add to it.
    pub fn lock(
        &mut self,
        caller: &Address,
        amount: u128,
        asset: &mut dyn AssetTransfer,
    ) -> Result<u64, StakingError> {
        if self.state.blacklist.contains(caller) {
            tracing::warn!(owner = %caller, "lock rejected: blacklisted");
            return Err(StakingError::Blacklisted(*caller));
        }
        if amount == 0 {
            return Err(StakingError::InvalidAmount);
        }
        let now = self.clock.now();
        let totals = match self.state.locks.get(caller) {
            Some(existing) => Some((
                existing
                    .principal
                    .checked_add(amount)
                    .ok_or(StakingError::Overflow)?,
                existing
                    .amount
                    .checked_add(amount)
                    .ok_or(StakingError::Overflow)?,
            )),
            None => None,
        };

        asset.pull(caller, amount)?;

        let index = match (self.state.locks.get_mut(caller), totals) {
            (Some(existing), Some((principal, remaining))) => {
                existing.principal = principal;
                existing.amount = remaining;
                existing.index
            }
            _ => self
                .state
                .locks
                .insert(*caller, LockRecord::new(*caller, amount, now))?,
        };
        tracing::info!(owner = %caller, amount, index, %now, "locked");
        Ok(index)
    }

    /// Release whatever has vested for `caller` since their last claim.
    pub fn claim(
        &mut self,
        caller: &Address,
        asset: &mut dyn AssetTransfer,
    ) -> Result<ClaimOutcome, StakingError> {
        let now = self.clock.now();
        let lock = self
            .state
            .locks
            .get(caller)
            .ok_or(StakingError::NotFound(*caller))?;
        let completed = self.schedule.is_complete(lock.start_time, now);
        let released = self
            .schedule
            .releasable(lock, now)
            .ok_or(StakingError::Overflow)?;
        tracing::debug!(
            owner = %caller,
            vested = %format_duration(self.schedule.vested_duration(lock.start_time, now)),
            released,
            "claim computed"
        );

        if released > 0 {
            asset.push(caller, released)?;
        }

        let remaining = if completed {
            self.state.locks.remove(caller);
            0
        } else {
            let lock = self
                .state
                .locks
                .get_mut(caller)
                .ok_or(StakingError::NotFound(*caller))?;
            lock.amount -= released;
            lock.last_claimed_time = now;
            lock.amount
        };
        tracing::info!(owner = %caller, released, remaining, completed, "claimed");
        Ok(ClaimOutcome {
            released,
            remaining,
            completed,
        })
    }

    /// What a claim by `owner` would release right now.
    pub fn claimable(&self, owner: &Address) -> Option<u128> {
        let lock = self.state.locks.get(owner)?;
        self.schedule.releasable(lock, self.clock.now())
    }

    pub fn lock_info(&self, owner: &Address) -> Option<&LockRecord> {
        self.state.locks.get(owner)
    }

    pub fn lock_count(&self) -> usize {
        self.state.locks.len()
    }

    pub fn locks(&self) -> impl Iterator<Item = &LockRecord> {
        self.state.locks.iter().map(|(_, r)| r)
    }

    pub fn total_locked(&self) -> u128 {
        self.locks().fold(0u128, |acc, r| acc.saturating_add(r.amount))
    }

    // ── Admin ───────────────────────────────────────────────────────────

    fn ensure_admin(&self, caller: &Address, action: &str) -> Result<(), StakingError> {
        if *caller != self.params.admin {
            tracing::warn!(%caller, action, "rejected: not admin");
            return Err(StakingError::Unauthorized(*caller));
        }
        Ok(())
    }

    /// Bar `owner` from locking. Returns `false` if already listed.
    pub fn add_to_blacklist(&mut self, caller: &Address, owner: &Address) -> Result<bool, StakingError> {
        self.ensure_admin(caller, "add_to_blacklist")?;
        let added = self.state.blacklist.add(*owner);
        tracing::info!(%owner, added, "blacklisted");
        Ok(added)
    }

    /// Lift a ban. Returns `false` if `owner` was not listed.
    pub fn remove_from_blacklist(
        &mut self,
        caller: &Address,
        owner: &Address,
    ) -> Result<bool, StakingError> {
        self.ensure_admin(caller, "remove_from_blacklist")?;
        let removed = self.state.blacklist.remove(owner);
        tracing::info!(%owner, removed, "removed from blacklist");
        Ok(removed)
    }

    pub fn is_blacklisted(&self, owner: &Address) -> bool {
        self.state.blacklist.contains(owner)
    }

    /// Return every stake and every remaining lock to its owner.
    ///
    /// Records are settled one at a time: a record is removed only after its
    /// payout succeeded. A failed payout leaves that record in place and the
    /// sweep moves on.
    pub fn emergency_withdraw(
        &mut self,
        caller: &Address,
        asset: &mut dyn AssetTransfer,
    ) -> Result<WithdrawReport, StakingError> {
        self.ensure_admin(caller, "emergency_withdraw")?;
        let mut report = WithdrawReport::default();

        let stake_owners: Vec<Address> = self.state.stakes.keys().to_vec();
        for owner in stake_owners {
            let Some(amount) = self.state.stakes.get(&owner).map(|r| r.amount) else {
                continue;
            };
            match asset.push(&owner, amount) {
                Ok(()) => {
                    self.state.stakes.remove(&owner);
                    report.stakes_paid.push((owner, amount));
                }
                Err(e) => {
                    tracing::warn!(%owner, amount, error = %e, "stake sweep failed");
                    report.failed.push((owner, e));
                }
            }
        }

        let lock_owners: Vec<Address> = self.state.locks.keys().to_vec();
        for owner in lock_owners {
            let Some(amount) = self.state.locks.get(&owner).map(|r| r.amount) else {
                continue;
            };
            match asset.push(&owner, amount) {
                Ok(()) => {
                    self.state.locks.remove(&owner);
                    report.locks_paid.push((owner, amount));
                }
                Err(e) => {
                    tracing::warn!(%owner, amount, error = %e, "lock sweep failed");
                    report.failed.push((owner, e));
                }
            }
        }

        tracing::info!(
            total = report.total_paid(),
            stakes = report.stakes_paid.len(),
            locks = report.locks_paid.len(),
            failed = report.failed.len(),
            "emergency withdraw complete"
        );
        Ok(report)
    }
}
