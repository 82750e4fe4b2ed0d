//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use custody_types::{Address, GrowthParams, KeyHash, NetworkId, StakingParams, DAY_SECS};

use crate::NodeError;

/// Configuration for a custody node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Addresses and the key hash are
/// `0x`-prefixed hex strings in TOML.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Which deployment this node serves.
    #[serde(default = "default_network")]
    pub network: NetworkId,

    /// Directory that relative snapshot paths resolve against.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to render Prometheus metrics after a script run.
    #[serde(default)]
    pub enable_metrics: bool,

    #[serde(default)]
    pub token: TokenConfig,

    #[serde(default)]
    pub staking: StakingConfig,

    #[serde(default)]
    pub growth: GrowthConfig,

    #[serde(default)]
    pub clock: ClockConfig,
}

/// The in-memory token both engines hold in custody.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenConfig {
    #[serde(default = "default_token_address")]
    pub address: Address,

    /// Initial mint authority.
    #[serde(default = "default_admin")]
    pub minter: Address,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StakingConfig {
    #[serde(default = "default_admin")]
    pub admin: Address,

    /// Account the engine holds deposits in. Depositors approve this address.
    #[serde(default = "default_staking_custody")]
    pub custody: Address,

    #[serde(default = "default_vesting_window_secs")]
    pub vesting_window_secs: u64,

    #[serde(default = "default_vesting_period_secs")]
    pub vesting_period_secs: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GrowthConfig {
    #[serde(default = "default_admin")]
    pub admin: Address,

    /// Account the engine holds card deposits in. Must end up holding mint
    /// authority for banished cards to pay their growth.
    #[serde(default = "default_growth_custody")]
    pub custody: Address,

    #[serde(default = "default_coordinator")]
    pub coordinator: Address,

    #[serde(default)]
    pub fee_token: Address,

    #[serde(default)]
    pub key_hash: KeyHash,

    #[serde(default = "default_subscription_id")]
    pub subscription_id: u64,

    #[serde(default = "default_callback_gas_limit")]
    pub callback_gas_limit: u32,

    #[serde(default = "default_request_confirmations")]
    pub request_confirmations: u16,

    #[serde(default = "default_num_words")]
    pub num_words: u32,

    #[serde(default = "default_day_length_secs")]
    pub day_length_secs: u64,

    #[serde(default = "default_min_increment")]
    pub min_increment: u64,

    #[serde(default = "default_max_increment")]
    pub max_increment: u64,
}

/// Where the node reads time from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockMode {
    /// Wall clock.
    System,
    /// Starts at `start_secs` and only moves when an operation moves it.
    Manual,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClockConfig {
    #[serde(default = "default_clock_mode")]
    pub mode: ClockMode,

    #[serde(default)]
    pub start_secs: u64,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_network() -> NetworkId {
    NetworkId::Dev
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./custody_data")
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_admin() -> Address {
    Address::repeat(0xad)
}

fn default_token_address() -> Address {
    Address::repeat(0xee)
}

fn default_staking_custody() -> Address {
    Address::repeat(0x51)
}

fn default_growth_custody() -> Address {
    Address::repeat(0x52)
}

fn default_coordinator() -> Address {
    Address::repeat(0xc0)
}

fn default_vesting_window_secs() -> u64 {
    StakingParams::DEFAULT_WINDOW_SECS
}

fn default_vesting_period_secs() -> u64 {
    StakingParams::DEFAULT_PERIOD_SECS
}

fn default_subscription_id() -> u64 {
    1
}

fn default_callback_gas_limit() -> u32 {
    GrowthParams::DEFAULT_CALLBACK_GAS_LIMIT
}

fn default_request_confirmations() -> u16 {
    GrowthParams::DEFAULT_REQUEST_CONFIRMATIONS
}

fn default_num_words() -> u32 {
    1
}

fn default_day_length_secs() -> u64 {
    DAY_SECS
}

fn default_min_increment() -> u64 {
    1
}

fn default_max_increment() -> u64 {
    100
}

fn default_clock_mode() -> ClockMode {
    ClockMode::System
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(format!("{path}: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Resolve a snapshot path: absolute paths are kept, relative ones are
    /// placed under `data_dir`.
    pub fn snapshot_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    /// A development config with a manual clock starting at zero.
    pub fn dev_manual_clock() -> Self {
        let mut config = Self::default();
        config.clock.mode = ClockMode::Manual;
        config
    }

    pub fn staking_params(&self) -> Result<StakingParams, NodeError> {
        let params = StakingParams::new(self.staking.admin, self.token.address)
            .with_schedule(self.staking.vesting_window_secs, self.staking.vesting_period_secs);
        params.validate()?;
        Ok(params)
    }

    pub fn growth_params(&self) -> Result<GrowthParams, NodeError> {
        let g = &self.growth;
        let params = GrowthParams {
            fee_token: g.fee_token,
            key_hash: g.key_hash,
            subscription_id: g.subscription_id,
            callback_gas_limit: g.callback_gas_limit,
            request_confirmations: g.request_confirmations,
            num_words: g.num_words,
            day_length_secs: g.day_length_secs,
            min_increment: u128::from(g.min_increment),
            max_increment: u128::from(g.max_increment),
            ..GrowthParams::new(g.admin, self.token.address, g.coordinator)
        };
        params.validate()?;
        Ok(params)
    }

    /// Check everything a node needs before it starts.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.clock.mode == ClockMode::Manual && !self.network.allows_manual_clock() {
            return Err(NodeError::Config(format!(
                "manual clock is not allowed on the {} network",
                self.network.as_str()
            )));
        }
        if self.staking.custody == self.growth.custody {
            return Err(NodeError::Config(
                "staking and growth need separate custody accounts".into(),
            ));
        }
        self.staking_params()?;
        self.growth_params()?;
        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            data_dir: default_data_dir(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            enable_metrics: false,
            token: TokenConfig::default(),
            staking: StakingConfig::default(),
            growth: GrowthConfig::default(),
            clock: ClockConfig::default(),
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            address: default_token_address(),
            minter: default_admin(),
        }
    }
}

impl Default for StakingConfig {
    fn default() -> Self {
        Self {
            admin: default_admin(),
            custody: default_staking_custody(),
            vesting_window_secs: default_vesting_window_secs(),
            vesting_period_secs: default_vesting_period_secs(),
        }
    }
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            admin: default_admin(),
            custody: default_growth_custody(),
            coordinator: default_coordinator(),
            fee_token: Address::ZERO,
            key_hash: KeyHash::ZERO,
            subscription_id: default_subscription_id(),
            callback_gas_limit: default_callback_gas_limit(),
            request_confirmations: default_request_confirmations(),
            num_words: default_num_words(),
            day_length_secs: default_day_length_secs(),
            min_increment: default_min_increment(),
            max_increment: default_max_increment(),
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            mode: default_clock_mode(),
            start_secs: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = NodeConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = NodeConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.staking.custody, config.staking.custody);
        assert_eq!(parsed.growth.key_hash, config.growth.key_hash);
        assert_eq!(parsed.clock.mode, ClockMode::System);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = NodeConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.network, NetworkId::Dev);
        assert_eq!(config.log_format, "human");
        assert_eq!(config.staking.vesting_window_secs, 360 * DAY_SECS);
        assert_eq!(config.growth.callback_gas_limit, 2_000_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn sections_override() {
        let toml = r#"
            network = "test"

            [staking]
            vesting_window_secs = 3600
            vesting_period_secs = 600

            [growth]
            coordinator = "0x00000000000000000000000000000000000000c1"
            key_hash = "0x6c3699283bda56ad74f6b855546325b68d482e983852a7a82979cc4807b641f4"
            request_confirmations = 3

            [clock]
            mode = "manual"
            start_secs = 1000
        "#;
        let config = NodeConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.network, NetworkId::Test);
        assert_eq!(config.staking.vesting_period_secs, 600);
        assert_eq!(config.growth.coordinator.as_bytes()[19], 0xc1);
        assert_eq!(config.growth.key_hash.as_bytes()[0], 0x6c);
        assert_eq!(config.clock.start_secs, 1000);
        assert_eq!(config.log_level, "info"); // default
        assert!(config.validate().is_ok());
    }

    #[test]
    fn manual_clock_refused_on_live() {
        let mut config = NodeConfig::dev_manual_clock();
        assert!(config.validate().is_ok());
        config.network = NetworkId::Live;
        assert!(matches!(config.validate(), Err(NodeError::Config(_))));
    }

    #[test]
    fn bad_schedule_rejected() {
        let mut config = NodeConfig::default();
        config.staking.vesting_period_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn shared_custody_rejected() {
        let mut config = NodeConfig::default();
        config.growth.custody = config.staking.custody;
        assert!(matches!(config.validate(), Err(NodeError::Config(_))));
    }

    #[test]
    fn malformed_address_is_config_error() {
        let result = NodeConfig::from_toml_str("[token]\naddress = \"0x12\"\n");
        assert!(matches!(result, Err(NodeError::Config(_))));
    }

    #[test]
    fn relative_snapshot_paths_land_in_data_dir() {
        let mut config = NodeConfig::default();
        config.data_dir = PathBuf::from("/var/lib/custody");
        assert_eq!(
            config.snapshot_path(Path::new("run1.bin")),
            PathBuf::from("/var/lib/custody/run1.bin")
        );
        assert_eq!(
            config.snapshot_path(Path::new("/tmp/elsewhere.bin")),
            PathBuf::from("/tmp/elsewhere.bin")
        );
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = NodeConfig::from_toml_file("/nonexistent/custody.toml");
        assert!(matches!(result, Err(NodeError::Config(_))));
    }
}
