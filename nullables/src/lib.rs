//! Nullable infrastructure for deterministic testing.
//!
//! Time and randomness are the two things the engines read from outside.
//! This crate provides test-friendly implementations of both that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the system clock or a real oracle
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod oracle;

pub use clock::NullClock;
pub use oracle::NullOracle;
