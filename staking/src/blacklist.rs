//! Owners barred from locking.

use custody_types::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Blacklist {
    owners: BTreeSet<Address>,
}

impl Blacklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the owner was already listed.
    pub fn add(&mut self, owner: Address) -> bool {
        self.owners.insert(owner)
    }

    /// Returns `false` if the owner was not listed.
    pub fn remove(&mut self, owner: &Address) -> bool {
        self.owners.remove(owner)
    }

    pub fn contains(&self, owner: &Address) -> bool {
        self.owners.contains(owner)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.owners.iter()
    }
}
