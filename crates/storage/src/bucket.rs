//! Id-only secondary index.
//!
//! Maps a key (an account id or a place id) to the bucket of visit ids whose
//! current foreign key equals that key. The order inside a bucket carries no
//! meaning, so removal is swap-with-last.
//!
//! The whole index sits behind one `parking_lot::RwLock`. Writers hold the
//! [`BucketWriter`] guard across a record swap plus the matching bucket
//! move; readers hold a [`BucketReader`] while they resolve a bucket. That
//! makes a move atomic for every reader of the index.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use roamdb_core::VisitId;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Visit ids filed under one key.
pub type Bucket = SmallVec<[VisitId; 8]>;

/// key -> bucket of visit ids
#[derive(Debug, Default)]
pub struct BucketIndex {
    buckets: RwLock<FxHashMap<u32, Bucket>>,
}

impl BucketIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an index with room for `keys` buckets.
    pub fn with_capacity(keys: usize) -> Self {
        Self {
            buckets: RwLock::new(FxHashMap::with_capacity_and_hasher(
                keys,
                Default::default(),
            )),
        }
    }

    /// Shared access for resolving buckets.
    pub fn read(&self) -> BucketReader<'_> {
        BucketReader {
            guard: self.buckets.read(),
        }
    }

    /// Exclusive access for bucket mutation.
    pub fn write(&self) -> BucketWriter<'_> {
        BucketWriter {
            guard: self.buckets.write(),
        }
    }

    /// Copy of one bucket.
    pub fn members(&self, key: u32) -> Vec<VisitId> {
        self.read().members(key).to_vec()
    }

    /// Add one visit id to a bucket.
    pub fn insert(&self, key: u32, visit: VisitId) {
        self.write().insert(key, visit);
    }

    /// Move one visit id between buckets in a single critical section.
    pub fn move_member(&self, visit: VisitId, from: u32, to: u32) {
        self.write().move_member(visit, from, to);
    }

    /// Number of non-empty buckets.
    pub fn key_count(&self) -> usize {
        self.read().guard.len()
    }
}

/// Read guard over a [`BucketIndex`].
pub struct BucketReader<'a> {
    guard: RwLockReadGuard<'a, FxHashMap<u32, Bucket>>,
}

impl BucketReader<'_> {
    /// Visit ids filed under `key`; empty if the key has none.
    pub fn members(&self, key: u32) -> &[VisitId] {
        self.guard.get(&key).map(|b| b.as_slice()).unwrap_or(&[])
    }
}

/// Write guard over a [`BucketIndex`].
pub struct BucketWriter<'a> {
    guard: RwLockWriteGuard<'a, FxHashMap<u32, Bucket>>,
}

impl BucketWriter<'_> {
    /// Visit ids filed under `key`.
    pub fn members(&self, key: u32) -> &[VisitId] {
        self.guard.get(&key).map(|b| b.as_slice()).unwrap_or(&[])
    }

    /// Append `visit` to the bucket for `key`.
    ///
    /// Doesn't deduplicate; callers insert each visit id once.
    pub fn insert(&mut self, key: u32, visit: VisitId) {
        self.guard.entry(key).or_default().push(visit);
    }

    /// Remove `visit` from the bucket for `key`.
    ///
    /// Returns `false` if it wasn't there. Empty buckets are dropped.
    pub fn remove(&mut self, key: u32, visit: VisitId) -> bool {
        let Some(bucket) = self.guard.get_mut(&key) else {
            return false;
        };
        let Some(pos) = bucket.iter().position(|v| *v == visit) else {
            return false;
        };
        bucket.swap_remove(pos);
        if bucket.is_empty() {
            self.guard.remove(&key);
        }
        true
    }

    /// Refile `visit` from `from` to `to`. A no-op when the keys are equal.
    pub fn move_member(&mut self, visit: VisitId, from: u32, to: u32) {
        if from == to {
            return;
        }
        self.remove(from, visit);
        self.insert(to, visit);
    }
}
