//! The custody node: wires the token, both engines and the coordinator together.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use custody_asset::{Custody, TokenLedger};
use custody_growth::{FulfillmentOutcome, GrowthEngine, GrowthState};
use custody_nullables::NullClock;
use custody_staking::{StakingEngine, StakingState};
use custody_types::{Address, Clock, SystemClock, Timestamp};
use custody_vrf::{CoordinatorSnapshot, Fulfillment, LocalCoordinator, RequestId};

use crate::config::{ClockMode, NodeConfig};
use crate::error::NodeError;
use crate::metrics::{gauge_value, CustodyMetrics};
use crate::operation::{Operation, OperationOutcome};

/// Bumped whenever the snapshot layout changes.
const SNAPSHOT_VERSION: u32 = 1;

/// Everything needed to bring a node back to where it was.
#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    now: Timestamp,
    ledger: TokenLedger,
    staking: StakingState,
    growth: GrowthState,
    coordinator: CoordinatorSnapshot,
}

/// Time source, keeping a handle on the manual clock so operations can move it.
enum NodeClock {
    System(Arc<SystemClock>),
    Manual(Arc<NullClock>),
}

impl NodeClock {
    fn from_config(config: &NodeConfig, start: u64) -> Self {
        match config.clock.mode {
            ClockMode::System => Self::System(Arc::new(SystemClock::new())),
            ClockMode::Manual => Self::Manual(Arc::new(NullClock::new(start))),
        }
    }

    fn shared(&self) -> Arc<dyn Clock> {
        match self {
            Self::System(c) => c.clone() as Arc<dyn Clock>,
            Self::Manual(c) => c.clone() as Arc<dyn Clock>,
        }
    }

    fn now(&self) -> Timestamp {
        match self {
            Self::System(c) => c.now(),
            Self::Manual(c) => c.now(),
        }
    }

    fn manual(&self) -> Result<&NullClock, NodeError> {
        match self {
            Self::Manual(c) => Ok(c.as_ref()),
            Self::System(_) => Err(NodeError::Config(
                "clock control needs [clock] mode = \"manual\"".into(),
            )),
        }
    }
}

pub struct CustodyNode {
    config: NodeConfig,
    clock: NodeClock,
    ledger: TokenLedger,
    staking: StakingEngine,
    growth: GrowthEngine,
    coordinator: Arc<LocalCoordinator>,
    /// Fulfillments emitted by the coordinator, waiting to be delivered.
    inbox: mpsc::UnboundedReceiver<Fulfillment>,
    metrics: CustodyMetrics,
}

impl CustodyNode {
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        config.validate()?;
        let ledger = TokenLedger::new(config.token.address, config.token.minter);
        let coordinator = LocalCoordinator::new(config.growth.coordinator);
        let start = config.clock.start_secs;
        Self::assemble(
            config,
            start,
            ledger,
            StakingState::default(),
            GrowthState::default(),
            coordinator,
        )
    }

    fn assemble(
        config: NodeConfig,
        start: u64,
        ledger: TokenLedger,
        staking_state: StakingState,
        growth_state: GrowthState,
        coordinator: LocalCoordinator,
    ) -> Result<Self, NodeError> {
        let clock = NodeClock::from_config(&config, start);
        let (tx, inbox) = mpsc::unbounded_channel();
        let coordinator = Arc::new(coordinator.with_outbox(tx));
        let staking =
            StakingEngine::from_state(config.staking_params()?, clock.shared(), staking_state)?;
        let growth = GrowthEngine::from_state(
            config.growth_params()?,
            clock.shared(),
            coordinator.clone(),
            growth_state,
        )?;
        let node = Self {
            config,
            clock,
            ledger,
            staking,
            growth,
            coordinator,
            inbox,
            metrics: CustodyMetrics::new()?,
        };
        node.refresh_gauges();
        tracing::info!(
            network = node.config.network.as_str(),
            now = %node.clock.now(),
            stakes = node.staking.stake_count(),
            locks = node.staking.lock_count(),
            cards = node.growth.card_count(),
            "custody node ready"
        );
        Ok(node)
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn ledger(&self) -> &TokenLedger {
        &self.ledger
    }

    pub fn staking(&self) -> &StakingEngine {
        &self.staking
    }

    pub fn growth(&self) -> &GrowthEngine {
        &self.growth
    }

    pub fn coordinator(&self) -> &LocalCoordinator {
        &self.coordinator
    }

    pub fn metrics(&self) -> &CustodyMetrics {
        &self.metrics
    }

    pub fn staking_custody(&self) -> Address {
        self.config.staking.custody
    }

    pub fn growth_custody(&self) -> Address {
        self.config.growth.custody
    }

    /// Apply one operation. A failed operation changes no state.
    pub fn apply(&mut self, op: Operation) -> Result<OperationOutcome, NodeError> {
        let name = op.name();
        match self.dispatch(op) {
            Ok(outcome) => {
                self.refresh_gauges();
                Ok(outcome)
            }
            Err(e) => {
                self.metrics.operations_rejected.inc();
                tracing::warn!(op = name, error = %e, "operation rejected");
                Err(e)
            }
        }
    }

    /// Apply operations in order, stopping at the first failure.
    pub fn apply_all(
        &mut self,
        ops: impl IntoIterator<Item = Operation>,
    ) -> Result<Vec<OperationOutcome>, NodeError> {
        ops.into_iter().map(|op| self.apply(op)).collect()
    }

    fn dispatch(&mut self, op: Operation) -> Result<OperationOutcome, NodeError> {
        let staking_custody = self.config.staking.custody;
        let growth_custody = self.config.growth.custody;
        let outcome = match op {
            Operation::Mint { caller, to, amount } => {
                self.ledger.mint(&caller, &to, amount)?;
                OperationOutcome::Done
            }
            Operation::Approve {
                owner,
                spender,
                amount,
            } => {
                self.ledger.approve(&owner, &spender, amount);
                OperationOutcome::Done
            }
            Operation::Transfer { from, to, amount } => {
                self.ledger.transfer(&from, &to, amount)?;
                OperationOutcome::Done
            }
            Operation::SetMinter { caller, minter } => {
                self.ledger.set_minter(&caller, minter)?;
                OperationOutcome::Done
            }
            Operation::Stake { caller, amount } => {
                let mut custody = Custody::new(&mut self.ledger, staking_custody);
                let index = self.staking.stake(&caller, amount, &mut custody)?;
                self.metrics.stakes.inc();
                OperationOutcome::Indexed { index }
            }
            Operation::Unstake { caller, owner } => {
                let mut custody = Custody::new(&mut self.ledger, staking_custody);
                let amount = self.staking.unstake(&caller, &owner, &mut custody)?;
                self.metrics.unstakes.inc();
                OperationOutcome::Paid { amount }
            }
            Operation::Lock { caller, amount } => {
                let mut custody = Custody::new(&mut self.ledger, staking_custody);
                let index = self.staking.lock(&caller, amount, &mut custody)?;
                self.metrics.locks.inc();
                OperationOutcome::Indexed { index }
            }
            Operation::Claim { caller } => {
                let mut custody = Custody::new(&mut self.ledger, staking_custody);
                let claimed = self.staking.claim(&caller, &mut custody)?;
                self.metrics.claims.inc();
                OperationOutcome::Claimed(claimed)
            }
            Operation::AddToBlacklist { caller, owner } => OperationOutcome::Blacklist {
                changed: self.staking.add_to_blacklist(&caller, &owner)?,
            },
            Operation::RemoveFromBlacklist { caller, owner } => OperationOutcome::Blacklist {
                changed: self.staking.remove_from_blacklist(&caller, &owner)?,
            },
            Operation::EmergencyWithdraw { caller } => {
                let mut custody = Custody::new(&mut self.ledger, staking_custody);
                let report = self.staking.emergency_withdraw(&caller, &mut custody)?;
                self.metrics.emergency_withdrawals.inc();
                OperationOutcome::Withdrawn(report.into())
            }
            Operation::CreateCard {
                caller,
                amount,
                tier_seed,
            } => {
                let mut custody = Custody::new(&mut self.ledger, growth_custody);
                let (slot, request_id) =
                    self.growth
                        .create_card(&caller, amount, tier_seed, &mut custody)?;
                self.metrics.cards_created.inc();
                OperationOutcome::CardCreated { slot, request_id }
            }
            Operation::BanishCard { caller, slot } => {
                let mut custody = Custody::new(&mut self.ledger, growth_custody);
                let amount = self.growth.banish_card(&caller, slot, &mut custody)?;
                self.metrics.cards_banished.inc();
                OperationOutcome::Paid { amount }
            }
            Operation::FulfillRandomness { request_id } => {
                match request_id {
                    Some(raw) => {
                        self.coordinator.fulfill(RequestId::new(raw))?;
                    }
                    None => {
                        self.coordinator.fulfill_all();
                    }
                }
                OperationOutcome::Fulfilled {
                    outcomes: self.deliver_fulfillments()?,
                }
            }
            Operation::SetTime { secs } => {
                self.clock.manual()?.set(secs);
                OperationOutcome::Time {
                    now: self.clock.now(),
                }
            }
            Operation::AdvanceTime { secs } => {
                self.clock.manual()?.advance(secs);
                OperationOutcome::Time {
                    now: self.clock.now(),
                }
            }
        };
        Ok(outcome)
    }

    /// Deliver every fulfillment waiting in the inbox to the growth engine.
    pub fn deliver_fulfillments(&mut self) -> Result<Vec<FulfillmentOutcome>, NodeError> {
        let from = *self.coordinator.address();
        let mut outcomes = Vec::new();
        while let Ok(fulfillment) = self.inbox.try_recv() {
            let outcome = self.growth.on_randomness_fulfilled(
                &from,
                fulfillment.request_id,
                &fulfillment.words,
            )?;
            match outcome {
                FulfillmentOutcome::Applied { .. } => self.metrics.fulfillments_applied.inc(),
                FulfillmentOutcome::Ignored => self.metrics.fulfillments_ignored.inc(),
            }
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    fn refresh_gauges(&self) {
        let m = &self.metrics;
        m.active_stakes.set(self.staking.stake_count() as i64);
        m.active_locks.set(self.staking.lock_count() as i64);
        m.active_cards.set(self.growth.card_count() as i64);
        m.pending_requests.set(self.growth.pending_count() as i64);
        m.staking_custody_balance
            .set(gauge_value(self.ledger.balance_of(&self.config.staking.custody)));
        m.growth_custody_balance
            .set(gauge_value(self.ledger.balance_of(&self.config.growth.custody)));
    }

    // ── Persistence ─────────────────────────────────────────────────────

    /// Write the full node state to `path` with bincode.
    pub fn save_snapshot(&self, path: &Path) -> Result<(), NodeError> {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            now: self.clock.now(),
            ledger: self.ledger.clone(),
            staking: self.staking.state().clone(),
            growth: self.growth.state().clone(),
            coordinator: self.coordinator.snapshot(),
        };
        let bytes =
            bincode::serialize(&snapshot).map_err(|e| NodeError::Snapshot(e.to_string()))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, bytes)?;
        tracing::info!(path = %path.display(), "snapshot saved");
        Ok(())
    }

    /// Rebuild a node from a snapshot written by [`Self::save_snapshot`].
    ///
    /// A manual clock resumes from the snapshot's time; a system clock
    /// simply reads the wall clock.
    pub fn load_snapshot(config: NodeConfig, path: &Path) -> Result<Self, NodeError> {
        config.validate()?;
        let bytes = std::fs::read(path)?;
        let snapshot: Snapshot =
            bincode::deserialize(&bytes).map_err(|e| NodeError::Snapshot(e.to_string()))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(NodeError::Snapshot(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                snapshot.version
            )));
        }
        if snapshot.ledger.address() != &config.token.address {
            return Err(NodeError::Snapshot(format!(
                "snapshot token {} does not match configured token {}",
                snapshot.ledger.address(),
                config.token.address
            )));
        }
        let coordinator = LocalCoordinator::restore(config.growth.coordinator, snapshot.coordinator);
        tracing::info!(path = %path.display(), "snapshot loaded");
        Self::assemble(
            config,
            snapshot.now.as_secs(),
            snapshot.ledger,
            snapshot.staking,
            snapshot.growth,
            coordinator,
        )
    }
}
