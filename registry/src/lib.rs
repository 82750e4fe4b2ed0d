//! Indexed registry, the positional store behind every custody position.
//!
//! Records are keyed by owner and carry a 1-based slot index. Index 0 means
//! "absent". Removal swaps the last slot into the freed one so the active
//! indices are always exactly `1..=len`.

pub mod error;
pub mod registry;

pub use error::RegistryError;
pub use registry::{Indexed, IndexedRegistry};
