//! Serializable operations and their results.
//!
//! Scripts are JSON arrays of [`Operation`]s, one single-key object per
//! step: `{"stake": {"caller": "0x..", "amount": 10000}}`. Every public
//! engine operation has a variant, plus token setup and clock control so a
//! script can stage a whole scenario.

use custody_growth::FulfillmentOutcome;
use custody_staking::{ClaimOutcome, WithdrawReport};
use custody_types::{Address, Timestamp};
use custody_vrf::RequestId;
use serde::{Deserialize, Serialize};

// Externally tagged: internally tagged enums cannot carry u128 fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    // ── Token ───────────────────────────────────────────────────────────
    Mint {
        caller: Address,
        to: Address,
        amount: u128,
    },
    Approve {
        owner: Address,
        spender: Address,
        amount: u128,
    },
    Transfer {
        from: Address,
        to: Address,
        amount: u128,
    },
    SetMinter {
        caller: Address,
        minter: Address,
    },

    // ── Staking ─────────────────────────────────────────────────────────
    Stake {
        caller: Address,
        amount: u128,
    },
    Unstake {
        caller: Address,
        owner: Address,
    },
    Lock {
        caller: Address,
        amount: u128,
    },
    Claim {
        caller: Address,
    },
    AddToBlacklist {
        caller: Address,
        owner: Address,
    },
    RemoveFromBlacklist {
        caller: Address,
        owner: Address,
    },
    EmergencyWithdraw {
        caller: Address,
    },

    // ── Growth ──────────────────────────────────────────────────────────
    CreateCard {
        caller: Address,
        amount: u128,
        tier_seed: u64,
    },
    BanishCard {
        caller: Address,
        slot: usize,
    },
    /// Have the coordinator fulfill one request, or every pending one when
    /// `request_id` is omitted, then deliver the results.
    FulfillRandomness {
        #[serde(default)]
        request_id: Option<u64>,
    },

    // ── Clock ───────────────────────────────────────────────────────────
    SetTime {
        secs: u64,
    },
    AdvanceTime {
        secs: u64,
    },
}

impl Operation {
    /// Short name used in logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mint { .. } => "mint",
            Self::Approve { .. } => "approve",
            Self::Transfer { .. } => "transfer",
            Self::SetMinter { .. } => "set_minter",
            Self::Stake { .. } => "stake",
            Self::Unstake { .. } => "unstake",
            Self::Lock { .. } => "lock",
            Self::Claim { .. } => "claim",
            Self::AddToBlacklist { .. } => "add_to_blacklist",
            Self::RemoveFromBlacklist { .. } => "remove_from_blacklist",
            Self::EmergencyWithdraw { .. } => "emergency_withdraw",
            Self::CreateCard { .. } => "create_card",
            Self::BanishCard { .. } => "banish_card",
            Self::FulfillRandomness { .. } => "fulfill_randomness",
            Self::SetTime { .. } => "set_time",
            Self::AdvanceTime { .. } => "advance_time",
        }
    }
}

/// What an applied operation produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum OperationOutcome {
    Done,
    /// Registry index of the affected record.
    Indexed { index: u64 },
    /// Amount paid out.
    Paid { amount: u128 },
    Claimed(ClaimOutcome),
    Withdrawn(WithdrawSummary),
    /// Whether the blacklist changed.
    Blacklist { changed: bool },
    CardCreated { slot: usize, request_id: RequestId },
    Fulfilled { outcomes: Vec<FulfillmentOutcome> },
    Time { now: Timestamp },
}

/// Serializable form of a [`WithdrawReport`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WithdrawSummary {
    pub stakes_paid: Vec<(Address, u128)>,
    pub locks_paid: Vec<(Address, u128)>,
    pub failed: Vec<(Address, String)>,
    pub total_paid: u128,
}

impl From<WithdrawReport> for WithdrawSummary {
    fn from(report: WithdrawReport) -> Self {
        let total_paid = report.total_paid();
        Self {
            stakes_paid: report.stakes_paid,
            locks_paid: report.locks_paid,
            failed: report
                .failed
                .into_iter()
                .map(|(owner, e)| (owner, e.to_string()))
                .collect(),
            total_paid,
        }
    }
}
