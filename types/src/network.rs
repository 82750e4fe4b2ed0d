//! Network identifier.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::CustodyError;

/// Identifies which deployment a node is running against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    /// The production deployment.
    Live,
    /// The public test deployment.
    Test,
    /// Local development.
    Dev,
}

impl NetworkId {
    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Test => "test",
            Self::Dev => "dev",
        }
    }

    /// Whether the clock may be overridden on this network.
    pub fn allows_manual_clock(&self) -> bool {
        !matches!(self, Self::Live)
    }
}

impl FromStr for NetworkId {
    type Err = CustodyError;

    /// Case-insensitive. Unknown names are an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "test" => Ok(Self::Test),
            "dev" => Ok(Self::Dev),
            _ => Err(CustodyError::UnknownNetwork(s.to_string())),
        }
    }
}
