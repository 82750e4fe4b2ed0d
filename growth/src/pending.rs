//! Outstanding randomness requests.
//!
//! Maps each request id to the card waiting for it. Card slots shift when a
//! card is banished, so the engine re-points entries after every swap.

use custody_types::Address;
use custody_vrf::RequestId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where the card waiting on a request lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEntry {
    pub owner: Address,
    pub slot: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTable {
    entries: BTreeMap<RequestId, PendingEntry>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &RequestId) -> Option<&PendingEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &RequestId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn insert(&mut self, id: RequestId, owner: Address, slot: usize) {
        self.entries.insert(id, PendingEntry { owner, slot });
    }

    /// Take an entry out. Each id resolves at most once.
    pub fn take(&mut self, id: &RequestId) -> Option<PendingEntry> {
        self.entries.remove(id)
    }

    /// Point `id` at a new slot. No-op if `id` is not pending.
    pub fn repoint(&mut self, id: &RequestId, slot: usize) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.slot = slot;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RequestId, &PendingEntry)> {
        self.entries.iter()
    }
}
