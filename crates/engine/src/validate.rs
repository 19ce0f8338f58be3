//! Field rules for candidate records.
//!
//! Validation is read-only: it may look at the store for email ownership and
//! foreign keys, but never changes anything. It runs before any lock is
//! taken, so the store re-checks the properties that can race (id and email
//! ownership) when it commits.

use once_cell::sync::Lazy;
use regex::Regex;
use roamdb_core::{
    Account, AccountId, EntityKind, Place, RoamError, RoamResult, Visit, VisitPatch,
};

use crate::store::Store;

/// Names, cities and countries must be shorter than this.
pub const MAX_NAME_LEN: usize = 50;
/// Emails must be shorter than this.
pub const MAX_EMAIL_LEN: usize = 100;
/// Highest allowed mark.
pub const MAX_MARK: i32 = 5;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email pattern compiles")
});

fn char_len(value: &str) -> usize {
    value.chars().count()
}

fn check_len(entity: EntityKind, field: &str, value: &str, max: usize) -> RoamResult<()> {
    if char_len(value) >= max {
        return Err(RoamError::invalid(
            entity,
            format!("`{}` must be shorter than {} characters", field, max),
        ));
    }
    Ok(())
}

/// Whether `email` is shaped like `local@domain.tld`.
pub fn is_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Check an account that is about to be stored under `existing`.
///
/// The email may already belong to `existing` (self-update) but to no one
/// else.
pub fn account(store: &Store, candidate: &Account, existing: AccountId) -> RoamResult<()> {
    let entity = EntityKind::Account;
    if !matches!(candidate.gender.as_str(), "" | "m" | "f") {
        return Err(RoamError::invalid(entity, "`gender` must be \"m\" or \"f\""));
    }
    check_len(entity, "first_name", &candidate.first_name, MAX_NAME_LEN)?;
    check_len(entity, "last_name", &candidate.last_name, MAX_NAME_LEN)?;
    check_len(entity, "email", &candidate.email, MAX_EMAIL_LEN)?;
    if !is_email(&candidate.email) {
        return Err(RoamError::invalid(entity, "`email` is not a valid address"));
    }
    match store.email_owner(&candidate.email) {
        Some(owner) if owner != existing => Err(RoamError::invalid(
            entity,
            format!("`email` already belongs to account {}", owner),
        )),
        _ => Ok(()),
    }
}

/// Check a place.
pub fn place(candidate: &Place) -> RoamResult<()> {
    let entity = EntityKind::Place;
    check_len(entity, "country", &candidate.country, MAX_NAME_LEN)?;
    check_len(entity, "city", &candidate.city, MAX_NAME_LEN)?;
    Ok(())
}

fn check_mark(mark: i32) -> RoamResult<()> {
    if !(0..=MAX_MARK).contains(&mark) {
        return Err(RoamError::invalid(
            EntityKind::Visit,
            format!("`mark` must be between 0 and {}", MAX_MARK),
        ));
    }
    Ok(())
}

fn check_account_ref(store: &Store, account: AccountId) -> RoamResult<()> {
    if !store.contains_account(account) {
        return Err(RoamError::invalid(
            EntityKind::Visit,
            format!("account {} does not exist", account),
        ));
    }
    Ok(())
}

fn check_place_ref(store: &Store, place: u32) -> RoamResult<()> {
    if !store.contains_place(place) {
        return Err(RoamError::invalid(
            EntityKind::Visit,
            format!("place {} does not exist", place),
        ));
    }
    Ok(())
}

/// Check a complete visit about to be created. Both references must exist.
pub fn visit(store: &Store, candidate: &Visit) -> RoamResult<()> {
    check_mark(candidate.mark)?;
    check_account_ref(store, candidate.account_id)?;
    check_place_ref(store, candidate.place_id)?;
    Ok(())
}

/// Check the fields a visit update sets. Zero references mean "unchanged"
/// and are not looked up.
pub fn visit_patch(store: &Store, patch: &VisitPatch) -> RoamResult<()> {
    if let Some(mark) = patch.mark {
        check_mark(mark)?;
    }
    if let Some(account) = patch.new_account() {
        check_account_ref(store, account)?;
    }
    if let Some(place) = patch.new_place() {
        check_place_ref(store, place)?;
    }
    Ok(())
}
