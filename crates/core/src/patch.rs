//! Partial records decoded from request bodies.
//!
//! A patch carries only the fields a client sent. When merged into a stored
//! record, a field holding its zero-equivalent (absent, `""` or `0`) keeps
//! the stored value. The one exception is `mark`: a present mark of `0` is a
//! real rating and replaces the stored one.
//!
//! The same patch types decode creation bodies; [`AccountPatch::into_account`]
//! and friends insist on every field being present.

use serde::Deserialize;

use crate::error::{RoamError, RoamResult};
use crate::types::{Account, AccountId, Place, PlaceId, Timestamp, Visit, VisitId};

fn merged_str(update: &Option<String>, current: &str) -> String {
    match update {
        Some(value) if !value.is_empty() => value.clone(),
        _ => current.to_string(),
    }
}

fn merged_int<T: Copy + Default + PartialEq>(update: Option<T>, current: T) -> T {
    match update {
        Some(value) if value != T::default() => value,
        _ => current,
    }
}

fn required<T>(value: Option<T>, field: &str) -> RoamResult<T> {
    value.ok_or_else(|| RoamError::malformed(format!("missing field `{}`", field)))
}

fn required_id(id: Option<u32>) -> RoamResult<u32> {
    match id {
        Some(id) if id != 0 => Ok(id),
        _ => Err(RoamError::malformed("a positive `id` is required on creation")),
    }
}

/// Account fields sent by a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AccountPatch {
    /// Only meaningful on creation
    pub id: Option<AccountId>,
    /// New email
    pub email: Option<String>,
    /// New given name
    pub first_name: Option<String>,
    /// New family name
    pub last_name: Option<String>,
    /// New gender
    pub gender: Option<String>,
    /// New birth date
    pub birth_date: Option<Timestamp>,
}

impl AccountPatch {
    /// Whether the body names an id. Updates must not.
    pub fn carries_id(&self) -> bool {
        matches!(self.id, Some(id) if id != 0)
    }

    /// Overlay this patch on `current`, keeping stored values for
    /// zero-equivalent fields. The id never changes.
    pub fn merge(&self, current: &Account) -> Account {
        Account {
            id: current.id,
            email: merged_str(&self.email, &current.email),
            first_name: merged_str(&self.first_name, &current.first_name),
            last_name: merged_str(&self.last_name, &current.last_name),
            gender: merged_str(&self.gender, &current.gender),
            birth_date: merged_int(self.birth_date, current.birth_date),
        }
    }

    /// Turn a creation body into a full record.
    pub fn into_account(self) -> RoamResult<Account> {
        Ok(Account {
            id: required_id(self.id)?,
            email: required(self.email, "email")?,
            first_name: required(self.first_name, "first_name")?,
            last_name: required(self.last_name, "last_name")?,
            gender: required(self.gender, "gender")?,
            birth_date: required(self.birth_date, "birth_date")?,
        })
    }
}

/// Place fields sent by a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PlacePatch {
    /// Only meaningful on creation
    pub id: Option<PlaceId>,
    /// New distance
    pub distance: Option<i32>,
    /// New city
    pub city: Option<String>,
    /// New name
    #[serde(alias = "place")]
    pub place_name: Option<String>,
    /// New country
    pub country: Option<String>,
}

impl PlacePatch {
    /// Whether the body names an id. Updates must not.
    pub fn carries_id(&self) -> bool {
        matches!(self.id, Some(id) if id != 0)
    }

    /// Overlay this patch on `current`.
    pub fn merge(&self, current: &Place) -> Place {
        Place {
            id: current.id,
            distance: merged_int(self.distance, current.distance),
            city: merged_str(&self.city, &current.city),
            place_name: merged_str(&self.place_name, &current.place_name),
            country: merged_str(&self.country, &current.country),
        }
    }

    /// Turn a creation body into a full record.
    pub fn into_place(self) -> RoamResult<Place> {
        Ok(Place {
            id: required_id(self.id)?,
            distance: required(self.distance, "distance")?,
            city: required(self.city, "city")?,
            place_name: required(self.place_name, "place_name")?,
            country: required(self.country, "country")?,
        })
    }
}

/// Visit fields sent by a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VisitPatch {
    /// Only meaningful on creation
    pub id: Option<VisitId>,
    /// New visiting account
    #[serde(alias = "user")]
    pub account_id: Option<AccountId>,
    /// New visited place
    #[serde(alias = "location")]
    pub place_id: Option<PlaceId>,
    /// New visit instant
    pub visited_at: Option<Timestamp>,
    /// New rating; `0` is a valid rating
    pub mark: Option<i32>,
}

impl VisitPatch {
    /// Whether the body names an id. Updates must not.
    pub fn carries_id(&self) -> bool {
        matches!(self.id, Some(id) if id != 0)
    }

    /// Account the patch moves the visit to, if any.
    pub fn new_account(&self) -> Option<AccountId> {
        self.account_id.filter(|id| *id != 0)
    }

    /// Place the patch moves the visit to, if any.
    pub fn new_place(&self) -> Option<PlaceId> {
        self.place_id.filter(|id| *id != 0)
    }

    /// Whether applying the patch may change a foreign key.
    pub fn touches_references(&self) -> bool {
        self.new_account().is_some() || self.new_place().is_some()
    }

    /// Overlay this patch on `current`.
    pub fn apply(&self, current: &Visit) -> Visit {
        Visit {
            id: current.id,
            account_id: merged_int(self.account_id, current.account_id),
            place_id: merged_int(self.place_id, current.place_id),
            visited_at: merged_int(self.visited_at, current.visited_at),
            mark: self.mark.unwrap_or(current.mark),
        }
    }

    /// Turn a creation body into a full record.
    pub fn into_visit(self) -> RoamResult<Visit> {
        Ok(Visit {
            id: required_id(self.id)?,
            account_id: required(self.account_id, "account_id")?,
            place_id: required(self.place_id, "place_id")?,
            visited_at: required(self.visited_at, "visited_at")?,
            mark: required(self.mark, "mark")?,
        })
    }
}
