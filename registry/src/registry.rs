//! Generic append / swap-delete registry.

use crate::error::RegistryError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

/// A record that remembers its own 1-based slot in an [`IndexedRegistry`].
pub trait Indexed {
    /// Current slot, 0 when the record is not stored in a registry.
    fn index(&self) -> u64;

    /// Called by the registry whenever the record is placed or moved.
    fn set_index(&mut self, index: u64);
}

/// Owner-keyed positional store.
///
/// `slots[i]` holds the key of the record whose index is `i + 1`; `records`
/// maps each active key to its record. Both structures always describe the
/// same set of keys.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(
    serialize = "K: Serialize + Eq + Hash, R: Serialize",
    deserialize = "K: Deserialize<'de> + Eq + Hash, R: Deserialize<'de>"
))]
pub struct IndexedRegistry<K, R> {
    slots: Vec<K>,
    records: HashMap<K, R>,
}

impl<K, R> IndexedRegistry<K, R>
where
    K: Eq + Hash + Clone,
    R: Indexed,
{
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            records: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.records.contains_key(key)
    }

    pub fn get(&self, key: &K) -> Option<&R> {
        self.records.get(key)
    }

    /// Mutable access to a stored record. Callers must not change its index.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut R> {
        self.records.get_mut(key)
    }

    /// Slot of `key`, or 0 when absent.
    pub fn index_of(&self, key: &K) -> u64 {
        self.records.get(key).map(Indexed::index).unwrap_or(0)
    }

    /// Key stored at a 1-based slot.
    pub fn key_at(&self, index: u64) -> Option<&K> {
        let pos = index.checked_sub(1)?;
        self.slots.get(usize::try_from(pos).ok()?)
    }

    /// Append `record` under `key` and return its new slot.
    pub fn insert(&mut self, key: K, mut record: R) -> Result<u64, RegistryError> {
        if let Some(existing) = self.records.get(&key) {
            return Err(RegistryError::AlreadyPresent(existing.index()));
        }
        self.slots.push(key.clone());
        let index = self.slots.len() as u64;
        record.set_index(index);
        self.records.insert(key, record);
        Ok(index)
    }

    /// Remove `key` in O(1): the last slot moves into the freed one.
    ///
    /// The returned record has its index reset to 0.
    pub fn remove(&mut self, key: &K) -> Option<R> {
        let mut record = self.records.remove(key)?;
        let pos = record.index().saturating_sub(1) as usize;
        debug_assert!(self.slots.get(pos) == Some(key), "slot array out of sync");
        self.slots.swap_remove(pos);
        if let Some(moved) = self.slots.get(pos) {
            if let Some(moved_record) = self.records.get_mut(moved) {
                moved_record.set_index(pos as u64 + 1);
            }
        }
        record.set_index(0);
        Some(record)
    }

    /// Iterate records in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &R)> + '_ {
        self.slots
            .iter()
            .filter_map(move |k| self.records.get(k).map(|r| (k, r)))
    }

    /// Keys in slot order.
    pub fn keys(&self) -> &[K] {
        &self.slots
    }

    /// Check that slots and records agree and indices are exactly `1..=len`.
    ///
    /// Used after deserializing a snapshot.
    pub fn is_dense(&self) -> bool {
        if self.slots.len() != self.records.len() {
            return false;
        }
        self.slots.iter().enumerate().all(|(pos, key)| {
            self.records
                .get(key)
                .is_some_and(|r| r.index() == pos as u64 + 1)
        })
    }
}

impl<K, R> Default for IndexedRegistry<K, R>
where
    K: Eq + Hash + Clone,
    R: Indexed,
{
    fn default() -> Self {
        Self::new()
    }
}
