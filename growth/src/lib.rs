//! Randomized growth engine.
//!
//! An owner buys a card by depositing its initial power. The card's daily
//! power increment is unknown until the randomness oracle answers; from then
//! on the card grows by that increment every whole day. Banishing a card pays
//! its current power back: the deposit from custody, the growth freshly
//! minted.

pub mod card;
pub mod engine;
pub mod error;
pub mod pending;
pub mod power;

pub use card::CardRecord;
pub use engine::{FulfillmentOutcome, GrowthEngine, GrowthState};
pub use error::GrowthError;
pub use pending::{PendingEntry, PendingTable};
pub use power::{current_power, derive_increment};
