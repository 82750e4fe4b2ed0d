//! Tracing setup for tests and tools that run without a node.

use tracing_subscriber::EnvFilter;

/// Initialize tracing with `level` as the fallback filter when `RUST_LOG`
/// is unset. Safe to call more than once; later calls are ignored.
pub fn init_tracing_with_level(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
