//! Property tests over random operation scripts.
//!
//! Whatever a script does, tokens are conserved, custody always backs the
//! engines' books, and a rejected operation leaves every balance as it was.

use proptest::prelude::*;

use custody_node::{CustodyNode, NodeConfig, Operation};
use custody_types::{Address, DAY_SECS};

const ADMIN: Address = Address::repeat(0xad);

fn user(n: u8) -> Address {
    Address::repeat(n + 1)
}

fn op_strategy() -> impl Strategy<Value = Operation> {
    let who = (0u8..3).prop_map(user);
    prop_oneof![
        (who.clone(), 0u128..3_000).prop_map(|(caller, amount)| Operation::Stake { caller, amount }),
        (who.clone(), who.clone()).prop_map(|(caller, owner)| Operation::Unstake { caller, owner }),
        (who.clone(), 0u128..3_000).prop_map(|(caller, amount)| Operation::Lock { caller, amount }),
        who.clone().prop_map(|caller| Operation::Claim { caller }),
        who.clone().prop_map(|owner| Operation::AddToBlacklist { caller: ADMIN, owner }),
        (who.clone(), 0u128..3_000, any::<u64>())
            .prop_map(|(caller, amount, tier_seed)| Operation::CreateCard { caller, amount, tier_seed }),
        (who.clone(), 0usize..3).prop_map(|(caller, slot)| Operation::BanishCard { caller, slot }),
        Just(Operation::FulfillRandomness { request_id: None }),
        (0u64..40).prop_map(|days| Operation::AdvanceTime { secs: days * DAY_SECS }),
        Just(Operation::EmergencyWithdraw { caller: ADMIN }),
    ]
}

fn setup() -> CustodyNode {
    let mut node = CustodyNode::new(NodeConfig::dev_manual_clock()).unwrap();
    let staking = node.staking_custody();
    let growth = node.growth_custody();
    for n in 0..3 {
        node.apply_all([
            Operation::Mint { caller: ADMIN, to: user(n), amount: 20_000 },
            Operation::Approve { owner: user(n), spender: staking, amount: u128::MAX },
            Operation::Approve { owner: user(n), spender: growth, amount: u128::MAX },
        ])
        .unwrap();
    }
    node.apply(Operation::SetMinter { caller: ADMIN, minter: growth }).unwrap();
    node
}

fn balances(node: &CustodyNode) -> Vec<u128> {
    let mut who: Vec<Address> = (0..3).map(user).collect();
    who.push(node.staking_custody());
    who.push(node.growth_custody());
    who.iter().map(|a| node.ledger().balance_of(a)).collect()
}

proptest! {
    #[test]
    fn books_always_balance(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let mut node = setup();
        for op in ops {
            let before = balances(&node);
            if node.apply(op).is_err() {
                prop_assert_eq!(balances(&node), before);
            }

            let held: u128 = node.ledger().holders().map(|(_, b)| b).sum();
            prop_assert_eq!(held, node.ledger().total_supply());
            prop_assert_eq!(
                node.ledger().balance_of(&node.staking_custody()),
                node.staking().total_staked() + node.staking().total_locked()
            );
            let deposits: u128 = (0..3)
                .flat_map(|n| node.growth().cards_of(&user(n)).to_vec())
                .map(|c| c.initial_power)
                .sum();
            prop_assert_eq!(node.ledger().balance_of(&node.growth_custody()), deposits);
            prop_assert!(node.staking().state().stakes.is_dense());
            prop_assert!(node.staking().state().locks.is_dense());
        }
    }
}
