//! The in-memory store.
//!
//! `Store` owns every record value and both visit indexes. Callers get
//! copies out and hand full records or patches in; nobody outside holds a
//! reference into a table.
//!
//! # Write paths
//!
//! - `create_*`: raw insert under a caller-assigned id. Fails with
//!   `Conflict` if the id is taken. Used by the bulk loader and by the
//!   validated `new_*` paths.
//! - `new_*`: decode a creation patch, validate, then `create_*`.
//! - `update_*`: merge a patch into the current record, validate, then swap
//!   the whole record in.
//!
//! # Visit indexes
//!
//! A visit write that may change a foreign key holds the write guard of the
//! affected index while it swaps the record and moves the bucket entry, so a
//! reader holding that index's read guard sees either the old record in the
//! old bucket or the new record in the new bucket. Mark and date updates
//! don't touch the indexes and only take the visit shard lock.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use parking_lot::Mutex;
use roamdb_core::{
    Account, AccountId, AccountPatch, EntityKind, Place, PlaceId, PlacePatch, RoamError,
    RoamResult, Timestamp, Visit, VisitId, VisitPatch,
};
use roamdb_storage::{BucketIndex, EmailIndex, Table};
use serde::Serialize;

use crate::validate;

/// Sizing hints and the age reference instant.
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    /// Expected number of accounts
    pub accounts: usize,
    /// Expected number of places
    pub places: usize,
    /// Expected number of visits
    pub visits: usize,
    /// Instant ages are computed against; defaults to now
    pub reference_time: Option<Timestamp>,
}

/// Record counts, logged after a bulk load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Accounts stored
    pub accounts: usize,
    /// Places stored
    pub places: usize,
    /// Visits stored
    pub visits: usize,
    /// Distinct accounts with at least one visit
    pub visited_accounts: usize,
    /// Distinct places with at least one visit
    pub visited_places: usize,
}

/// Accounts, places, visits and the indexes over them.
pub struct Store {
    pub(crate) accounts: Table<Account>,
    pub(crate) places: Table<Place>,
    pub(crate) visits: Table<Visit>,
    emails: EmailIndex,
    /// Serializes account commits so a record's email and its ownership
    /// entry change together.
    account_commits: Mutex<()>,
    pub(crate) by_account: BucketIndex,
    pub(crate) by_place: BucketIndex,
    reference_time: AtomicI64,
}

fn rejected(entity: EntityKind, id: u32, err: RoamError) -> RoamError {
    tracing::debug!(target: "roamdb::store", entity = %entity, id, error = %err, "write rejected");
    err
}

impl Store {
    /// Create an empty store whose reference instant is now.
    pub fn new() -> Self {
        Self::with_options(StoreOptions::default())
    }

    /// Create an empty store.
    pub fn with_options(options: StoreOptions) -> Self {
        let reference = options
            .reference_time
            .unwrap_or_else(|| Utc::now().timestamp());
        Self {
            accounts: Table::with_capacity(options.accounts),
            places: Table::with_capacity(options.places),
            visits: Table::with_capacity(options.visits),
            emails: EmailIndex::with_capacity(options.accounts),
            account_commits: Mutex::new(()),
            by_account: BucketIndex::with_capacity(options.accounts),
            by_place: BucketIndex::with_capacity(options.places),
            reference_time: AtomicI64::new(reference),
        }
    }

    /// Instant ages are computed against.
    pub fn reference_time(&self) -> Timestamp {
        self.reference_time.load(Ordering::Acquire)
    }

    /// Change the age reference instant.
    pub fn set_reference_time(&self, reference: Timestamp) {
        self.reference_time.store(reference, Ordering::Release);
    }

    /// Current record counts.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            accounts: self.accounts.len(),
            places: self.places.len(),
            visits: self.visits.len(),
            visited_accounts: self.by_account.key_count(),
            visited_places: self.by_place.key_count(),
        }
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Fetch an account.
    pub fn account(&self, id: AccountId) -> RoamResult<Account> {
        self.accounts
            .get(id)
            .ok_or_else(|| RoamError::not_found(EntityKind::Account, id))
    }

    /// Fetch a place.
    pub fn place(&self, id: PlaceId) -> RoamResult<Place> {
        self.places
            .get(id)
            .ok_or_else(|| RoamError::not_found(EntityKind::Place, id))
    }

    /// Fetch a visit.
    pub fn visit(&self, id: VisitId) -> RoamResult<Visit> {
        self.visits
            .get(id)
            .ok_or_else(|| RoamError::not_found(EntityKind::Visit, id))
    }

    /// Check if an account exists.
    pub fn contains_account(&self, id: AccountId) -> bool {
        self.accounts.contains(id)
    }

    /// Check if a place exists.
    pub fn contains_place(&self, id: PlaceId) -> bool {
        self.places.contains(id)
    }

    /// Check if a visit exists.
    pub fn contains_visit(&self, id: VisitId) -> bool {
        self.visits.contains(id)
    }

    /// Account that owns `email`.
    pub fn email_owner(&self, email: &str) -> Option<AccountId> {
        self.emails.owner(email)
    }

    /// Ids of the visits currently filed under `account`.
    pub fn visits_of_account(&self, account: AccountId) -> Vec<VisitId> {
        self.by_account.members(account)
    }

    /// Ids of the visits currently filed under `place`.
    pub fn visits_of_place(&self, place: PlaceId) -> Vec<VisitId> {
        self.by_place.members(place)
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Store a new account under its own id and claim its email.
    ///
    /// Doesn't run field validation; see [`Store::new_account`].
    pub fn create_account(&self, account: Account) -> RoamResult<()> {
        let id = account.id;
        let _commit = self.account_commits.lock();
        if self.accounts.contains(id) {
            return Err(RoamError::Conflict {
                entity: EntityKind::Account,
                id,
            });
        }
        if let Err(owner) = self.emails.claim(&account.email, id) {
            return Err(RoamError::invalid(
                EntityKind::Account,
                format!("`email` already belongs to account {}", owner),
            ));
        }
        self.accounts.insert_new(id, account);
        Ok(())
    }

    /// Validate and store a new account decoded from a creation body.
    pub fn new_account(&self, patch: AccountPatch) -> RoamResult<()> {
        let account = patch.into_account()?;
        let id = account.id;
        validate::account(self, &account, id)
            .and_then(|_| self.create_account(account))
            .map_err(|e| rejected(EntityKind::Account, id, e))
    }

    /// Merge `patch` into account `id`.
    pub fn update_account(&self, id: AccountId, patch: &AccountPatch) -> RoamResult<()> {
        let current = self.account(id)?;
        if patch.carries_id() {
            return Err(rejected(
                EntityKind::Account,
                id,
                RoamError::invalid(EntityKind::Account, "`id` cannot be changed"),
            ));
        }
        let candidate = patch.merge(&current);
        validate::account(self, &candidate, id)
            .and_then(|_| self.commit_account(candidate))
            .map_err(|e| rejected(EntityKind::Account, id, e))
    }

    /// Swap in a validated account, moving its email claim if it changed.
    ///
    /// Ownership is compared against the record stored at commit time, not
    /// the snapshot the candidate was merged from.
    fn commit_account(&self, candidate: Account) -> RoamResult<()> {
        let id = candidate.id;
        let _commit = self.account_commits.lock();
        let stored_email = self
            .accounts
            .read(id, |stored| stored.email.clone())
            .ok_or_else(|| RoamError::not_found(EntityKind::Account, id))?;

        if stored_email == candidate.email {
            self.accounts.replace(id, candidate);
            return Ok(());
        }

        if let Err(owner) = self.emails.claim(&candidate.email, id) {
            return Err(RoamError::invalid(
                EntityKind::Account,
                format!("`email` already belongs to account {}", owner),
            ));
        }
        self.accounts.replace(id, candidate);
        self.emails.release(&stored_email, id);
        Ok(())
    }

    // =========================================================================
    // Places
    // =========================================================================

    /// Store a new place under its own id.
    pub fn create_place(&self, place: Place) -> RoamResult<()> {
        let id = place.id;
        if !self.places.insert_new(id, place) {
            return Err(RoamError::Conflict {
                entity: EntityKind::Place,
                id,
            });
        }
        Ok(())
    }

    /// Validate and store a new place decoded from a creation body.
    pub fn new_place(&self, patch: PlacePatch) -> RoamResult<()> {
        let place = patch.into_place()?;
        let id = place.id;
        validate::place(&place)
            .and_then(|_| self.create_place(place))
            .map_err(|e| rejected(EntityKind::Place, id, e))
    }

    /// Merge `patch` into place `id`.
    pub fn update_place(&self, id: PlaceId, patch: &PlacePatch) -> RoamResult<()> {
        let current = self.place(id)?;
        if patch.carries_id() {
            return Err(rejected(
                EntityKind::Place,
                id,
                RoamError::invalid(EntityKind::Place, "`id` cannot be changed"),
            ));
        }
        let candidate = patch.merge(&current);
        validate::place(&candidate).map_err(|e| rejected(EntityKind::Place, id, e))?;
        self.places
            .replace(id, candidate)
            .map(|_| ())
            .ok_or_else(|| RoamError::not_found(EntityKind::Place, id))
    }

    // =========================================================================
    // Visits
    // =========================================================================

    /// Store a new visit and file it under its account and place.
    ///
    /// Doesn't check the references; see [`Store::new_visit`].
    pub fn create_visit(&self, visit: Visit) -> RoamResult<()> {
        let (id, account, place) = (visit.id, visit.account_id, visit.place_id);
        let mut by_account = self.by_account.write();
        let mut by_place = self.by_place.write();
        if !self.visits.insert_new(id, visit) {
            return Err(RoamError::Conflict {
                entity: EntityKind::Visit,
                id,
            });
        }
        by_account.insert(account, id);
        by_place.insert(place, id);
        Ok(())
    }

    /// Store a batch of visits, taking each index lock once.
    ///
    /// Visits whose id is already taken are skipped. Returns how many were
    /// stored.
    pub fn create_visits(&self, batch: Vec<Visit>) -> usize {
        let mut by_account = self.by_account.write();
        let mut by_place = self.by_place.write();
        let mut stored = 0;
        for visit in batch {
            let (id, account, place) = (visit.id, visit.account_id, visit.place_id);
            if self.visits.insert_new(id, visit) {
                by_account.insert(account, id);
                by_place.insert(place, id);
                stored += 1;
            }
        }
        stored
    }

    /// Validate and store a new visit decoded from a creation body.
    pub fn new_visit(&self, patch: VisitPatch) -> RoamResult<()> {
        let visit = patch.into_visit()?;
        let id = visit.id;
        validate::visit(self, &visit)
            .and_then(|_| self.create_visit(visit))
            .map_err(|e| rejected(EntityKind::Visit, id, e))
    }

    /// Apply `patch` to visit `id`, refiling it if a reference changes.
    pub fn update_visit(&self, id: VisitId, patch: &VisitPatch) -> RoamResult<()> {
        if !self.visits.contains(id) {
            return Err(RoamError::not_found(EntityKind::Visit, id));
        }
        if patch.carries_id() {
            return Err(rejected(
                EntityKind::Visit,
                id,
                RoamError::invalid(EntityKind::Visit, "`id` cannot be changed"),
            ));
        }
        validate::visit_patch(self, patch).map_err(|e| rejected(EntityKind::Visit, id, e))?;

        let not_found = || RoamError::not_found(EntityKind::Visit, id);
        if !patch.touches_references() {
            return self
                .visits
                .modify(id, |current| patch.apply(current))
                .map(|_| ())
                .ok_or_else(not_found);
        }

        let mut by_account = patch.new_account().map(|_| self.by_account.write());
        let mut by_place = patch.new_place().map(|_| self.by_place.write());
        let (previous, current) = self
            .visits
            .modify(id, |current| patch.apply(current))
            .ok_or_else(not_found)?;
        if let Some(index) = by_account.as_mut() {
            index.move_member(id, previous.account_id, current.account_id);
        }
        if let Some(index) = by_place.as_mut() {
            index.move_member(id, previous.place_id, current.place_id);
        }
        Ok(())
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("stats", &self.stats())
            .field("reference_time", &self.reference_time())
            .finish()
    }
}
