//! email -> owning account
//!
//! Uniqueness is enforced at claim time through the DashMap entry API, so
//! two concurrent writers can never both own the same address even if both
//! passed validation against an older view.

use std::hash::BuildHasherDefault;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use roamdb_core::AccountId;
use rustc_hash::FxHasher;

/// Global email ownership map.
#[derive(Debug, Default)]
pub struct EmailIndex {
    owners: DashMap<String, AccountId, BuildHasherDefault<FxHasher>>,
}

impl EmailIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an index with room for `capacity` addresses.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            owners: DashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Account currently owning `email`.
    pub fn owner(&self, email: &str) -> Option<AccountId> {
        self.owners.get(email).map(|owner| *owner)
    }

    /// Take `email` for `account`.
    ///
    /// Succeeds if the address is free or already owned by `account`;
    /// otherwise returns the current owner.
    pub fn claim(&self, email: &str, account: AccountId) -> Result<(), AccountId> {
        match self.owners.entry(email.to_string()) {
            Entry::Occupied(slot) if *slot.get() != account => Err(*slot.get()),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(account);
                Ok(())
            }
        }
    }

    /// Give up `email` if `account` owns it.
    pub fn release(&self, email: &str, account: AccountId) {
        self.owners.remove_if(email, |_, owner| *owner == account);
    }

    /// Number of claimed addresses.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Check if no address is claimed.
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
