//! Nullable randomness oracle.

use custody_vrf::{RandomnessOracle, RandomnessRequest, RequestId, VrfError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// An oracle that hands out sequential ids and never fulfills anything.
///
/// Every request is recorded so tests can inspect what was asked for, and
/// the oracle can be switched into a failing mode.
#[derive(Debug, Default)]
pub struct NullOracle {
    requests: Mutex<Vec<RandomnessRequest>>,
    failing: AtomicBool,
}

impl NullOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// An oracle whose every request fails with [`VrfError::Unavailable`].
    pub fn failing() -> Self {
        let oracle = Self::default();
        oracle.set_failing(true);
        oracle
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Requests accepted so far, in order.
    pub fn requests(&self) -> Vec<RandomnessRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

impl RandomnessOracle for NullOracle {
    fn request_randomness(&self, request: &RandomnessRequest) -> Result<RequestId, VrfError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(VrfError::Unavailable("null oracle set to fail".into()));
        }
        let mut requests = self.requests.lock().unwrap_or_else(|p| p.into_inner());
        requests.push(request.clone());
        Ok(RequestId::new(requests.len() as u64))
    }

    fn name(&self) -> &str {
        "null-oracle"
    }
}
