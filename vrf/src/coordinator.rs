//! Local randomness coordinator.
//!
//! Issues sequential request ids starting at 1 and keeps every request
//! pending until someone asks it to fulfill. Words are derived
//! deterministically from the request id, so a replayed script always rolls
//! the same cards. Fulfillments are returned to the caller and, when an
//! outbox is attached, also pushed down a channel for the node to apply.

use crate::{Fulfillment, RandomWord, RandomnessOracle, RandomnessRequest, RequestId, VrfError};
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use custody_types::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::mpsc;

type Blake2b256 = Blake2b<U32>;

#[derive(Default)]
struct CoordinatorState {
    next_id: u64,
    pending: BTreeMap<RequestId, RandomnessRequest>,
}

/// Persistable view of a coordinator's outstanding work.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorSnapshot {
    pub next_id: u64,
    pub pending: Vec<(RequestId, RandomnessRequest)>,
}

pub struct LocalCoordinator {
    address: Address,
    state: Mutex<CoordinatorState>,
    outbox: Option<mpsc::UnboundedSender<Fulfillment>>,
}

impl LocalCoordinator {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            state: Mutex::new(CoordinatorState {
                next_id: 1,
                pending: BTreeMap::new(),
            }),
            outbox: None,
        }
    }

    /// Rebuild a coordinator that carries on from `snapshot`.
    pub fn restore(address: Address, snapshot: CoordinatorSnapshot) -> Self {
        Self {
            address,
            state: Mutex::new(CoordinatorState {
                next_id: snapshot.next_id.max(1),
                pending: snapshot.pending.into_iter().collect(),
            }),
            outbox: None,
        }
    }

    pub fn snapshot(&self) -> CoordinatorSnapshot {
        let state = self.lock();
        CoordinatorSnapshot {
            next_id: state.next_id,
            pending: state
                .pending
                .iter()
                .map(|(id, r)| (*id, r.clone()))
                .collect(),
        }
    }

    /// Attach a channel that receives every fulfillment this coordinator produces.
    pub fn with_outbox(mut self, outbox: mpsc::UnboundedSender<Fulfillment>) -> Self {
        self.outbox = Some(outbox);
        self
    }

    /// The address fulfillments are delivered from.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Ids of requests that have not been fulfilled yet, oldest first.
    pub fn pending_ids(&self) -> Vec<RequestId> {
        self.lock().pending.keys().copied().collect()
    }

    pub fn pending_request(&self, id: RequestId) -> Option<RandomnessRequest> {
        self.lock().pending.get(&id).cloned()
    }

    /// Fulfill `id` with words derived from the id itself.
    pub fn fulfill(&self, id: RequestId) -> Result<Fulfillment, VrfError> {
        let num_words = self
            .lock()
            .pending
            .get(&id)
            .map(|r| r.num_words)
            .ok_or(VrfError::UnknownRequest(id))?;
        self.fulfill_with_words(id, derive_words(id, num_words))
    }

    /// Fulfill `id` with caller-chosen words.
    pub fn fulfill_with_words(
        &self,
        id: RequestId,
        words: Vec<RandomWord>,
    ) -> Result<Fulfillment, VrfError> {
        if self.lock().pending.remove(&id).is_none() {
            return Err(VrfError::UnknownRequest(id));
        }
        let fulfillment = Fulfillment {
            request_id: id,
            words,
        };
        if let Some(outbox) = &self.outbox {
            if outbox.send(fulfillment.clone()).is_err() {
                tracing::warn!(request = %id, "fulfillment outbox closed; delivery left to caller");
            }
        }
        tracing::debug!(request = %id, "randomness fulfilled");
        Ok(fulfillment)
    }

    /// Fulfill every pending request in id order.
    pub fn fulfill_all(&self) -> Vec<Fulfillment> {
        self.pending_ids()
            .into_iter()
            .filter_map(|id| self.fulfill(id).ok())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RandomnessOracle for LocalCoordinator {
    fn request_randomness(&self, request: &RandomnessRequest) -> Result<RequestId, VrfError> {
        if request.num_words == 0 {
            return Err(VrfError::RequestFailed("zero words requested".into()));
        }
        let mut state = self.lock();
        let id = RequestId::new(state.next_id);
        state.next_id = state
            .next_id
            .checked_add(1)
            .ok_or_else(|| VrfError::Other("request id space exhausted".into()))?;
        state.pending.insert(id, request.clone());
        tracing::debug!(request = %id, words = request.num_words, "randomness requested");
        Ok(id)
    }

    fn name(&self) -> &str {
        "local-coordinator"
    }
}

/// Deterministic words for `id`: word `i` is BLAKE2b-256 of `(id, i)`.
pub fn derive_words(id: RequestId, num_words: u32) -> Vec<RandomWord> {
    (0..num_words)
        .map(|i| {
            let mut hasher = Blake2b256::new();
            hasher.update(id.raw().to_be_bytes());
            hasher.update(u64::from(i).to_be_bytes());
            let result = hasher.finalize();
            let mut word = [0u8; 32];
            word.copy_from_slice(&result);
            word
        })
        .collect()
}
