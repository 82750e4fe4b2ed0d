//! Prometheus metrics for the custody node.
//!
//! Counters track operations as they are applied; gauges are refreshed
//! from engine state after each one. [`CustodyMetrics::encode`] renders the
//! registry in the Prometheus text exposition format.

use prometheus::{
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, IntCounter,
    IntGauge, Opts, Registry, TextEncoder,
};

use crate::NodeError;

/// Central collection of all node-level Prometheus metrics.
pub struct CustodyMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    pub stakes: IntCounter,
    pub unstakes: IntCounter,
    pub locks: IntCounter,
    pub claims: IntCounter,
    pub emergency_withdrawals: IntCounter,
    pub cards_created: IntCounter,
    pub cards_banished: IntCounter,
    pub fulfillments_applied: IntCounter,
    /// Deliveries that matched no waiting card.
    pub fulfillments_ignored: IntCounter,
    /// Operations that returned an error.
    pub operations_rejected: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    pub active_stakes: IntGauge,
    pub active_locks: IntGauge,
    pub active_cards: IntGauge,
    pub pending_requests: IntGauge,
    /// Staking custody balance, saturated to `i64`.
    pub staking_custody_balance: IntGauge,
    /// Growth custody balance, saturated to `i64`.
    pub growth_custody_balance: IntGauge,
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter, NodeError> {
    Ok(register_int_counter_with_registry!(Opts::new(name, help), registry)?)
}

fn gauge(registry: &Registry, name: &str, help: &str) -> Result<IntGauge, NodeError> {
    Ok(register_int_gauge_with_registry!(Opts::new(name, help), registry)?)
}

impl CustodyMetrics {
    /// Create a fresh set of metrics, all registered under a new [`Registry`].
    pub fn new() -> Result<Self, NodeError> {
        let registry = Registry::new();
        Ok(Self {
            stakes: counter(&registry, "custody_stakes_total", "Successful stake operations")?,
            unstakes: counter(&registry, "custody_unstakes_total", "Successful unstake operations")?,
            locks: counter(&registry, "custody_locks_total", "Successful lock operations")?,
            claims: counter(&registry, "custody_claims_total", "Successful vesting claims")?,
            emergency_withdrawals: counter(
                &registry,
                "custody_emergency_withdrawals_total",
                "Emergency sweeps run by the admin",
            )?,
            cards_created: counter(&registry, "custody_cards_created_total", "Cards created")?,
            cards_banished: counter(&registry, "custody_cards_banished_total", "Cards banished")?,
            fulfillments_applied: counter(
                &registry,
                "custody_fulfillments_applied_total",
                "Randomness fulfillments that resolved a card",
            )?,
            fulfillments_ignored: counter(
                &registry,
                "custody_fulfillments_ignored_total",
                "Randomness fulfillments that matched no waiting card",
            )?,
            operations_rejected: counter(
                &registry,
                "custody_operations_rejected_total",
                "Operations that failed",
            )?,
            active_stakes: gauge(&registry, "custody_active_stakes", "Active stake records")?,
            active_locks: gauge(&registry, "custody_active_locks", "Active lock records")?,
            active_cards: gauge(&registry, "custody_active_cards", "Live cards")?,
            pending_requests: gauge(
                &registry,
                "custody_pending_requests",
                "Cards waiting on randomness",
            )?,
            staking_custody_balance: gauge(
                &registry,
                "custody_staking_balance",
                "Units held by the staking custody account",
            )?,
            growth_custody_balance: gauge(
                &registry,
                "custody_growth_balance",
                "Units held by the growth custody account",
            )?,
            registry,
        })
    }

    /// Render every metric in the Prometheus text format.
    pub fn encode(&self) -> Result<String, NodeError> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| NodeError::Other(e.to_string()))
    }
}

/// Clamp a raw amount into a gauge value.
pub(crate) fn gauge_value(amount: u128) -> i64 {
    i64::try_from(amount).unwrap_or(i64::MAX)
}
