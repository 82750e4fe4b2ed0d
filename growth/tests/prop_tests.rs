use proptest::prelude::*;
use std::sync::Arc;

use custody_asset::{Custody, TokenLedger};
use custody_growth::{derive_increment, FulfillmentOutcome, GrowthEngine};
use custody_nullables::NullClock;
use custody_types::{Address, GrowthParams, DAY_SECS};
use custody_vrf::LocalCoordinator;

const ADMIN: Address = Address::repeat(0xad);
const TOKEN: Address = Address::repeat(0xee);
const VAULT: Address = Address::repeat(0x77);
const COORDINATOR: Address = Address::repeat(0xc0);

fn owner(n: u8) -> Address {
    Address::repeat(n + 1)
}

#[derive(Clone, Debug)]
enum Op {
    Create(u8, u16, u64),
    Fulfill(u8),
    Banish(u8, u8),
    Advance(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..4, 1u16..5_000, any::<u64>()).prop_map(|(o, a, s)| Op::Create(o, a, s)),
        (0u8..16).prop_map(Op::Fulfill),
        (0u8..4, 0u8..6).prop_map(|(o, s)| Op::Banish(o, s)),
        (0u8..5).prop_map(Op::Advance),
    ]
}

proptest! {
    /// The pending table always mirrors the unresolved cards exactly, and
    /// custody always holds every live card's deposit.
    #[test]
    fn pending_table_tracks_unresolved_cards(ops in prop::collection::vec(op_strategy(), 0..80)) {
        let clock = Arc::new(NullClock::new(0));
        let coordinator = Arc::new(LocalCoordinator::new(COORDINATOR));
        let mut engine = GrowthEngine::new(
            GrowthParams::new(ADMIN, TOKEN, COORDINATOR),
            clock.clone(),
            coordinator.clone(),
        )
        .unwrap();
        let mut ledger = TokenLedger::new(TOKEN, ADMIN);
        for n in 0..4 {
            ledger.mint(&ADMIN, &owner(n), 1_000_000).unwrap();
            ledger.approve(&owner(n), &VAULT, 1_000_000);
        }
        ledger.set_minter(&ADMIN, VAULT).unwrap();

        for op in ops {
            match op {
                Op::Create(o, amount, seed) => {
                    let mut custody = Custody::new(&mut ledger, VAULT);
                    engine.create_card(&owner(o), u128::from(amount), seed, &mut custody).unwrap();
                }
                Op::Fulfill(pick) => {
                    let ids = coordinator.pending_ids();
                    if !ids.is_empty() {
                        let id = ids[usize::from(pick) % ids.len()];
                        let f = coordinator.fulfill(id).unwrap();
                        let out = engine.on_randomness_fulfilled(&COORDINATOR, id, &f.words).unwrap();
                        if let FulfillmentOutcome::Applied { owner, slot, power_increment } = out {
                            let card = engine.card(&owner, slot).unwrap();
                            prop_assert_eq!(card.power_increment, Some(power_increment));
                            prop_assert_eq!(
                                Some(power_increment),
                                derive_increment(&f.words, card.tier_seed, 1, 100)
                            );
                        }
                    }
                }
                Op::Banish(o, slot) => {
                    let count = engine.cards_of(&owner(o)).len();
                    let expected = engine.card_power(&owner(o), usize::from(slot));
                    let mut custody = Custody::new(&mut ledger, VAULT);
                    let res = engine.banish_card(&owner(o), usize::from(slot), &mut custody);
                    prop_assert_eq!(res.is_ok(), usize::from(slot) < count);
                    prop_assert_eq!(res.ok(), expected);
                }
                Op::Advance(days) => clock.advance(u64::from(days) * DAY_SECS),
            }

            let unresolved: usize = (0..4)
                .flat_map(|n| engine.cards_of(&owner(n)).to_vec())
                .filter(|c| !c.is_resolved())
                .count();
            prop_assert_eq!(engine.pending_count(), unresolved);
            for (id, entry) in engine.state().pending.iter() {
                let card = engine.card(&entry.owner, entry.slot).unwrap();
                prop_assert_eq!(card.pending_request, Some(*id));
            }
            let deposits: u128 = (0..4)
                .flat_map(|n| engine.cards_of(&owner(n)).to_vec())
                .map(|c| c.initial_power)
                .sum();
            prop_assert_eq!(ledger.balance_of(&VAULT), deposits);
        }
    }
}
