//! Card registry and oracle-driven growth.

use crate::card::CardRecord;
use crate::error::GrowthError;
use crate::pending::PendingTable;
use crate::power::{current_power, derive_increment};
use custody_asset::{AssetTransfer, TransferError};
use custody_types::{Address, Clock, GrowthParams, Timestamp};
use custody_utils::format_duration;
use custody_vrf::{RandomWord, RandomnessOracle, RandomnessRequest, RequestId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Persisted growth state: every owner's ordered cards and the requests
/// still waiting for randomness.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthState {
    pub cards: BTreeMap<Address, Vec<CardRecord>>,
    pub pending: PendingTable,
}

/// What a delivered fulfillment did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FulfillmentOutcome {
    /// The matching card received its increment.
    Applied {
        owner: Address,
        slot: usize,
        power_increment: u128,
    },
    /// Unknown, already resolved, or empty. Nothing changed.
    Ignored,
}

pub struct GrowthEngine {
    params: GrowthParams,
    clock: Arc<dyn Clock>,
    oracle: Arc<dyn RandomnessOracle>,
    state: GrowthState,
}

impl GrowthEngine {
    pub fn new(
        params: GrowthParams,
        clock: Arc<dyn Clock>,
        oracle: Arc<dyn RandomnessOracle>,
    ) -> Result<Self, GrowthError> {
        Self::from_state(params, clock, oracle, GrowthState::default())
    }

    /// Rebuild an engine around persisted state.
    ///
    /// Every pending entry must point at an unresolved card that is waiting
    /// on that same request.
    pub fn from_state(
        params: GrowthParams,
        clock: Arc<dyn Clock>,
        oracle: Arc<dyn RandomnessOracle>,
        state: GrowthState,
    ) -> Result<Self, GrowthError> {
        params
            .validate()
            .map_err(|e| GrowthError::InvalidParams(e.to_string()))?;
        for (id, entry) in state.pending.iter() {
            let waiting = state
                .cards
                .get(&entry.owner)
                .and_then(|cards| cards.get(entry.slot))
                .and_then(|card| card.pending_request);
            if waiting != Some(*id) {
                return Err(GrowthError::CorruptState(format!(
                    "pending request {id} does not match card {} of {}",
                    entry.slot, entry.owner
                )));
            }
        }
        tracing::debug!(oracle = oracle.name(), "growth engine ready");
        Ok(Self {
            params,
            clock,
            oracle,
            state,
        })
    }

    pub fn params(&self) -> &GrowthParams {
        &self.params
    }

    pub fn state(&self) -> &GrowthState {
        &self.state
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn randomness_request(&self) -> RandomnessRequest {
        RandomnessRequest {
            key_hash: self.params.key_hash,
            subscription_id: self.params.subscription_id,
            request_confirmations: self.params.request_confirmations,
            callback_gas_limit: self.params.callback_gas_limit,
            num_words: self.params.num_words,
        }
    }

    /// Buy a card worth `amount` for `caller`.
    ///
    /// The deposit is checked first, then randomness is requested, then the
    /// deposit is pulled. A caller who cannot pay never reaches the oracle.
    /// Returns the card's slot and request id.
    pub fn create_card(
        &mut self,
        caller: &Address,
        amount: u128,
        tier_seed: u64,
        asset: &mut dyn AssetTransfer,
    ) -> Result<(usize, RequestId), GrowthError> {
        if amount == 0 {
            return Err(GrowthError::InvalidAmount);
        }
        if let Err(e) = asset.check_pull(caller, amount) {
            tracing::debug!(owner = %caller, amount, error = %e, "card deposit refused");
            return Err(e.into());
        }
        let request_id = self.oracle.request_randomness(&self.randomness_request())?;

        if let Err(e) = asset.pull(caller, amount) {
            tracing::warn!(owner = %caller, request = %request_id, error = %e, "card deposit failed after check; request orphaned");
            return Err(e.into());
        }

        let now = self.clock.now();
        let cards = self.state.cards.entry(*caller).or_default();
        cards.push(CardRecord::new(*caller, amount, tier_seed, now, request_id));
        let slot = cards.len() - 1;
        self.state.pending.insert(request_id, *caller, slot);
        tracing::info!(owner = %caller, amount, tier_seed, slot, request = %request_id, "card created");
        Ok((slot, request_id))
    }

    /// Oracle callback. Only the configured coordinator may deliver.
    pub fn on_randomness_fulfilled(
        &mut self,
        caller: &Address,
        request_id: RequestId,
        words: &[RandomWord],
    ) -> Result<FulfillmentOutcome, GrowthError> {
        if *caller != self.params.coordinator {
            tracing::warn!(%caller, request = %request_id, "fulfillment from unknown sender rejected");
            return Err(GrowthError::Unauthorized(*caller));
        }
        if words.is_empty() || !self.state.pending.contains(&request_id) {
            tracing::debug!(request = %request_id, words = words.len(), "fulfillment ignored");
            return Ok(FulfillmentOutcome::Ignored);
        }
        let Some(entry) = self.state.pending.take(&request_id) else {
            return Ok(FulfillmentOutcome::Ignored);
        };
        let Some(card) = self
            .state
            .cards
            .get_mut(&entry.owner)
            .and_then(|cards| cards.get_mut(entry.slot))
        else {
            return Err(GrowthError::CorruptState(format!(
                "request {request_id} points at missing card {} of {}",
                entry.slot, entry.owner
            )));
        };
        if card.is_resolved() || card.pending_request != Some(request_id) {
            return Err(GrowthError::CorruptState(format!(
                "card {} of {} is not waiting on {request_id}",
                entry.slot, entry.owner
            )));
        }

        let increment = derive_increment(
            words,
            card.tier_seed,
            self.params.min_increment,
            self.params.max_increment,
        )
        .ok_or(GrowthError::Overflow)?;
        card.power_increment = Some(increment);
        card.pending_request = None;
        tracing::info!(owner = %entry.owner, slot = entry.slot, request = %request_id, increment, "card resolved");
        Ok(FulfillmentOutcome::Applied {
            owner: entry.owner,
            slot: entry.slot,
            power_increment: increment,
        })
    }

    /// Destroy `caller`'s card at `slot` and pay out its current power.
    ///
    /// The deposit comes out of custody and the growth is minted into custody
    /// first, so the payout is a single push. The last card moves into the
    /// vacated slot.
    pub fn banish_card(
        &mut self,
        caller: &Address,
        slot: usize,
        asset: &mut dyn AssetTransfer,
    ) -> Result<u128, GrowthError> {
        let card = self
            .card(caller, slot)
            .ok_or(GrowthError::NotFound { owner: *caller, slot })?;
        let now = self.clock.now();
        let power = current_power(card, now, self.params.day_length_secs)
            .ok_or(GrowthError::Overflow)?;
        let growth = power - card.initial_power;
        let held = asset.custody_balance();
        if held < card.initial_power {
            return Err(TransferError::InsufficientBalance {
                needed: card.initial_power,
                available: held,
            }
            .into());
        }
        let age = card.creation_time.elapsed_since(now);

        if growth > 0 {
            asset.mint(growth)?;
        }
        asset.push(caller, power)?;

        let cards = self
            .state
            .cards
            .get_mut(caller)
            .ok_or(GrowthError::NotFound { owner: *caller, slot })?;
        let removed = cards.swap_remove(slot);
        if let Some(moved) = cards.get(slot).and_then(|c| c.pending_request) {
            self.state.pending.repoint(&moved, slot);
        }
        if cards.is_empty() {
            self.state.cards.remove(caller);
        }
        if let Some(orphan) = removed.pending_request {
            self.state.pending.take(&orphan);
        }
        tracing::info!(owner = %caller, slot, power, growth, age = %format_duration(age), "card banished");
        Ok(power)
    }

    pub fn cards_of(&self, owner: &Address) -> &[CardRecord] {
        self.state
            .cards
            .get(owner)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn card(&self, owner: &Address, slot: usize) -> Option<&CardRecord> {
        self.state.cards.get(owner)?.get(slot)
    }

    /// Current power of a card, `None` if there is no such card.
    pub fn card_power(&self, owner: &Address, slot: usize) -> Option<u128> {
        current_power(self.card(owner, slot)?, self.clock.now(), self.params.day_length_secs)
    }

    pub fn card_count(&self) -> usize {
        self.state.cards.values().map(Vec::len).sum()
    }

    pub fn pending_count(&self) -> usize {
        self.state.pending.len()
    }

    pub fn is_pending(&self, id: &RequestId) -> bool {
        self.state.pending.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use custody_asset::{Custody, TokenLedger};
    use custody_nullables::{NullClock, NullOracle};
    use custody_types::DAY_SECS;
    use custody_vrf::{derive_words, LocalCoordinator, VrfError};

    const ADMIN: Address = Address::repeat(0xad);
    const TOKEN: Address = Address::repeat(0xee);
    const VAULT: Address = Address::repeat(0x77);
    const COORDINATOR: Address = Address::repeat(0xc0);
    const USER1: Address = Address::repeat(1);
    const USER2: Address = Address::repeat(2);
    const USER3: Address = Address::repeat(3);

    struct Fixture {
        clock: Arc<NullClock>,
        coordinator: Arc<LocalCoordinator>,
        ledger: TokenLedger,
        engine: GrowthEngine,
    }

    impl Fixture {
        fn new() -> Self {
            let clock = Arc::new(NullClock::new(0));
            let coordinator = Arc::new(LocalCoordinator::new(COORDINATOR));
            let params = GrowthParams::new(ADMIN, TOKEN, COORDINATOR);
            let engine = GrowthEngine::new(params, clock.clone(), coordinator.clone()).unwrap();
            let mut ledger = TokenLedger::new(TOKEN, ADMIN);
            for user in [USER1, USER2, USER3] {
                ledger.mint(&ADMIN, &user, 10_000).unwrap();
                ledger.approve(&user, &VAULT, 10_000);
            }
            ledger.set_minter(&ADMIN, VAULT).unwrap();
            Self {
                clock,
                coordinator,
                ledger,
                engine,
            }
        }

        fn create(&mut self, who: Address, amount: u128, seed: u64) -> Result<(usize, RequestId), GrowthError> {
            let mut custody = Custody::new(&mut self.ledger, VAULT);
            self.engine.create_card(&who, amount, seed, &mut custody)
        }

        fn fulfill(&mut self, id: RequestId) -> FulfillmentOutcome {
            let f = self.coordinator.fulfill(id).unwrap();
            self.engine
                .on_randomness_fulfilled(&COORDINATOR, f.request_id, &f.words)
                .unwrap()
        }

        fn banish(&mut self, who: Address, slot: usize) -> Result<u128, GrowthError> {
            let mut custody = Custody::new(&mut self.ledger, VAULT);
            self.engine.banish_card(&who, slot, &mut custody)
        }
    }

    fn expected_increment(id: RequestId, seed: u64) -> u128 {
        derive_increment(&derive_words(id, 1), seed, 1, 100).unwrap()
    }

    #[test]
    fn anyone_can_create_a_card() {
        let mut f = Fixture::new();
        for (i, user) in [USER1, USER2, USER3].into_iter().enumerate() {
            let (slot, id) = f.create(user, 10_000, i as u64 + 1).unwrap();
            assert_eq!(slot, 0);
            assert_eq!(id, RequestId::new(i as u64 + 1));
        }
        let card = f.engine.card(&USER1, 0).unwrap();
        assert_eq!(card.initial_power, 10_000);
        assert_eq!(card.power_increment, None);
        assert_eq!(card.pending_request, Some(RequestId::new(1)));
        assert_eq!(f.engine.pending_count(), 3);
        assert_eq!(f.ledger.balance_of(&VAULT), 30_000);
    }

    #[test]
    fn fulfillment_resolves_each_card() {
        let mut f = Fixture::new();
        for (i, user) in [USER1, USER2, USER3].into_iter().enumerate() {
            f.create(user, 10_000, i as u64 + 1).unwrap();
        }
        for id in 1..=3 {
            assert!(matches!(f.fulfill(RequestId::new(id)), FulfillmentOutcome::Applied { .. }));
        }
        let card = f.engine.card(&USER2, 0).unwrap();
        assert_eq!(card.initial_power, 10_000);
        assert_eq!(card.power_increment, Some(expected_increment(RequestId::new(2), 2)));
        assert_eq!(card.pending_request, None);
        assert_eq!(f.engine.pending_count(), 0);
    }

    #[test]
    fn cards_append_in_order() {
        let mut f = Fixture::new();
        f.create(USER1, 2_000, 1).unwrap();
        f.create(USER1, 3_000, 2).unwrap();
        assert_eq!(f.create(USER1, 5_000, 3).unwrap().0, 2);
        let powers: Vec<u128> = f.engine.cards_of(&USER1).iter().map(|c| c.initial_power).collect();
        assert_eq!(powers, vec![2_000, 3_000, 5_000]);
    }

    #[test]
    fn zero_amount_rejected_before_requesting() {
        let mut f = Fixture::new();
        assert_eq!(f.create(USER1, 0, 1), Err(GrowthError::InvalidAmount));
        assert!(f.coordinator.pending_ids().is_empty());
    }

    #[test]
    fn failed_deposit_requests_nothing() {
        let mut f = Fixture::new();
        f.ledger.approve(&USER1, &VAULT, 0);
        let err = f.create(USER1, 10_000, 1).unwrap_err();
        assert!(matches!(err, GrowthError::Transfer(TransferError::InsufficientAllowance { .. })));
        assert!(f.engine.cards_of(&USER1).is_empty());
        assert!(f.coordinator.pending_ids().is_empty());
        assert_eq!(f.engine.pending_count(), 0);

        // The id that would have been used is still the next one handed out.
        f.ledger.approve(&USER1, &VAULT, 10_000);
        assert_eq!(f.create(USER1, 10_000, 1).unwrap(), (0, RequestId::new(1)));
    }

    #[test]
    fn insufficient_balance_requests_nothing() {
        let mut f = Fixture::new();
        let err = f.create(USER1, 10_001, 1).unwrap_err();
        assert!(matches!(err, GrowthError::Transfer(TransferError::InsufficientBalance { .. })));
        assert!(f.coordinator.pending_ids().is_empty());
        assert_eq!(f.ledger.balance_of(&USER1), 10_000);
    }

    #[test]
    fn oracle_failure_pulls_nothing() {
        let clock = Arc::new(NullClock::new(0));
        let params = GrowthParams::new(ADMIN, TOKEN, COORDINATOR);
        let mut engine = GrowthEngine::new(params, clock, Arc::new(NullOracle::failing())).unwrap();
        let mut ledger = TokenLedger::new(TOKEN, ADMIN);
        ledger.mint(&ADMIN, &USER1, 100).unwrap();
        ledger.approve(&USER1, &VAULT, 100);
        let err = engine
            .create_card(&USER1, 100, 1, &mut Custody::new(&mut ledger, VAULT))
            .unwrap_err();
        assert!(matches!(err, GrowthError::Oracle(VrfError::Unavailable(_))));
        assert_eq!(ledger.balance_of(&USER1), 100);
        assert_eq!(engine.card_count(), 0);
    }

    #[test]
    fn second_fulfillment_is_ignored() {
        let mut f = Fixture::new();
        let (_, id) = f.create(USER1, 10_000, 1).unwrap();
        let first = f.fulfill(id);
        let increment = f.engine.card(&USER1, 0).unwrap().power_increment;
        let replay = f
            .engine
            .on_randomness_fulfilled(&COORDINATOR, id, &[[0u8; 32]])
            .unwrap();
        assert!(matches!(first, FulfillmentOutcome::Applied { .. }));
        assert_eq!(replay, FulfillmentOutcome::Ignored);
        assert_eq!(f.engine.card(&USER1, 0).unwrap().power_increment, increment);
    }

    #[test]
    fn unknown_request_and_empty_words_ignored() {
        let mut f = Fixture::new();
        let (_, id) = f.create(USER1, 10_000, 1).unwrap();
        assert_eq!(
            f.engine.on_randomness_fulfilled(&COORDINATOR, RequestId::new(99), &[[1u8; 32]]),
            Ok(FulfillmentOutcome::Ignored)
        );
        assert_eq!(
            f.engine.on_randomness_fulfilled(&COORDINATOR, id, &[]),
            Ok(FulfillmentOutcome::Ignored)
        );
        assert!(f.engine.is_pending(&id));
    }

    #[test]
    fn only_coordinator_may_fulfill() {
        let mut f = Fixture::new();
        let (_, id) = f.create(USER1, 10_000, 1).unwrap();
        assert_eq!(
            f.engine.on_randomness_fulfilled(&USER1, id, &[[1u8; 32]]),
            Err(GrowthError::Unauthorized(USER1))
        );
        assert!(f.engine.is_pending(&id));
    }

    #[test]
    fn banish_pays_initial_plus_growth() {
        let mut f = Fixture::new();
        for (i, user) in [USER1, USER2, USER3].into_iter().enumerate() {
            f.create(user, 10_000, i as u64 + 1).unwrap();
        }
        for id in 1..=3 {
            f.fulfill(RequestId::new(id));
        }
        let increment = f.engine.card(&USER1, 0).unwrap().power_increment.unwrap();
        f.clock.set(2 * DAY_SECS);

        let paid = f.banish(USER1, 0).unwrap();

        assert_eq!(paid, 10_000 + 2 * increment);
        assert_eq!(f.ledger.balance_of(&USER1), 10_000 + 2 * increment);
        assert_eq!(f.ledger.balance_of(&VAULT), 20_000);
        assert!(f.engine.cards_of(&USER1).is_empty());
    }

    #[test]
    fn banish_without_card_not_found() {
        let mut f = Fixture::new();
        assert_eq!(
            f.banish(USER1, 0),
            Err(GrowthError::NotFound { owner: USER1, slot: 0 })
        );
    }

    #[test]
    fn banish_unresolved_card_returns_deposit_and_drops_request() {
        let mut f = Fixture::new();
        let (_, id) = f.create(USER1, 4_000, 1).unwrap();
        f.clock.set(10 * DAY_SECS);
        assert_eq!(f.banish(USER1, 0).unwrap(), 4_000);
        assert!(!f.engine.is_pending(&id));
        assert_eq!(f.fulfill(id), FulfillmentOutcome::Ignored);
        assert_eq!(f.ledger.total_supply(), 30_000);
    }

    #[test]
    fn banish_repoints_moved_pending_card() {
        let mut f = Fixture::new();
        f.create(USER1, 1_000, 1).unwrap();
        f.create(USER1, 2_000, 2).unwrap();
        let (_, last) = f.create(USER1, 3_000, 3).unwrap();

        f.banish(USER1, 0).unwrap();

        assert_eq!(f.engine.card(&USER1, 0).unwrap().initial_power, 3_000);
        assert_eq!(f.engine.state().pending.get(&last).unwrap().slot, 0);
        match f.fulfill(last) {
            FulfillmentOutcome::Applied { slot, .. } => assert_eq!(slot, 0),
            other => panic!("unexpected {other:?}"),
        }
        assert!(f.engine.card(&USER1, 0).unwrap().is_resolved());
        assert!(!f.engine.card(&USER1, 1).unwrap().is_resolved());
    }

    #[test]
    fn banish_without_mint_authority_changes_nothing() {
        let mut f = Fixture::new();
        let (_, id) = f.create(USER1, 10_000, 1).unwrap();
        f.fulfill(id);
        f.ledger.set_minter(&VAULT, ADMIN).unwrap();
        f.clock.set(3 * DAY_SECS);
        assert!(matches!(
            f.banish(USER1, 0),
            Err(GrowthError::Transfer(TransferError::MintUnauthorized(_)))
        ));
        assert_eq!(f.engine.cards_of(&USER1).len(), 1);
        assert_eq!(f.ledger.balance_of(&USER1), 0);
    }

    #[test]
    fn state_rebuild_checks_pending_table() {
        let mut f = Fixture::new();
        f.create(USER1, 1_000, 1).unwrap();
        let mut state = f.engine.state().clone();
        let params = f.engine.params().clone();
        assert!(GrowthEngine::from_state(params.clone(), f.clock.clone(), f.coordinator.clone(), state.clone()).is_ok());
        state.pending.insert(RequestId::new(42), USER2, 0);
        assert!(matches!(
            GrowthEngine::from_state(params, f.clock.clone(), f.coordinator.clone(), state),
            Err(GrowthError::CorruptState(_))
        ));
    }
}
