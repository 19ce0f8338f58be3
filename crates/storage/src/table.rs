//! Sharded entity table
//!
//! # Design
//!
//! - DashMap: 16-way sharded by default, readers of one shard never block
//!   readers of another
//! - FxHasher: ids are small integers, a non-crypto hash is enough
//! - Whole-record swaps: a write installs a fully built record under the
//!   shard lock, so a reader sees either the old value or the new one
//!
//! # Thread Safety
//!
//! All operations are thread-safe:
//! - get(): clones the record under a shard read guard
//! - insert_new(): check-and-insert in one shard critical section
//! - replace()/modify(): only lock the target shard
//!
//! Callers never receive a reference into the map that outlives a call.

use std::hash::BuildHasherDefault;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rustc_hash::FxHasher;

type FxBuildHasher = BuildHasherDefault<FxHasher>;

/// Id-keyed table owning its record values.
pub struct Table<T> {
    rows: DashMap<u32, T, FxBuildHasher>,
}

impl<T: Clone> Table<T> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            rows: DashMap::with_hasher(FxBuildHasher::default()),
        }
    }

    /// Create a table with room for `capacity` records
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: DashMap::with_capacity_and_hasher(capacity, FxBuildHasher::default()),
        }
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check if a record exists
    #[inline]
    pub fn contains(&self, id: u32) -> bool {
        self.rows.contains_key(&id)
    }

    /// Copy of the record stored under `id`
    #[inline]
    pub fn get(&self, id: u32) -> Option<T> {
        self.rows.get(&id).map(|row| row.value().clone())
    }

    /// Run `f` against the stored record without cloning it.
    ///
    /// `f` runs under the shard read guard; it must not touch this table.
    #[inline]
    pub fn read<R>(&self, id: u32, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.rows.get(&id).map(|row| f(row.value()))
    }

    /// Insert a record under an unused id.
    ///
    /// Returns `false`, leaving the table untouched, if the id is taken.
    pub fn insert_new(&self, id: u32, row: T) -> bool {
        match self.rows.entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(row);
                true
            }
        }
    }

    /// Swap in a new value for an existing record.
    ///
    /// Returns the previous value, or `None` (and stores nothing) if the id
    /// is unknown.
    pub fn replace(&self, id: u32, row: T) -> Option<T> {
        self.rows
            .get_mut(&id)
            .map(|mut slot| std::mem::replace(slot.value_mut(), row))
    }

    /// Read-modify-write of one record under its shard lock.
    ///
    /// Returns `(previous, current)`. `f` must not touch this table.
    pub fn modify(&self, id: u32, f: impl FnOnce(&T) -> T) -> Option<(T, T)> {
        self.rows.get_mut(&id).map(|mut slot| {
            let next = f(slot.value());
            let previous = std::mem::replace(slot.value_mut(), next.clone());
            (previous, next)
        })
    }
}

impl<T: Clone> Default for Table<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Table<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("len", &self.rows.len())
            .finish()
    }
}
