use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("staking error: {0}")]
    Staking(#[from] custody_staking::StakingError),

    #[error("growth error: {0}")]
    Growth(#[from] custody_growth::GrowthError),

    #[error("token error: {0}")]
    Token(#[from] custody_asset::TransferError),

    #[error("oracle error: {0}")]
    Oracle(#[from] custody_vrf::VrfError),

    #[error("invalid value: {0}")]
    Custody(#[from] custody_types::CustodyError),

    #[error("config error: {0}")]
    Config(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
