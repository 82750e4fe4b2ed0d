//! Custody node: hosts the staking and growth engines over one token.
//!
//! The node is the central coordinator that:
//! - Owns the in-memory token ledger and both custody accounts
//! - Routes each operation to the right engine with the right custody
//! - Delivers randomness fulfillments from the coordinator to the growth engine
//! - Tracks metrics and persists snapshots

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod operation;

pub use config::{ClockConfig, ClockMode, GrowthConfig, NodeConfig, StakingConfig, TokenConfig};
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use metrics::CustodyMetrics;
pub use node::CustodyNode;
pub use operation::{Operation, OperationOutcome, WithdrawSummary};
