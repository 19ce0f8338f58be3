//! Read algorithms over the visit indexes.
//!
//! Both queries resolve a bucket while holding that index's read guard, so a
//! visit being refiled is seen exactly once: either in its old bucket with
//! its old reference or in its new bucket with the new one.

use std::collections::HashMap;

use roamdb_core::{
    AccountId, EntityKind, Gender, Place, PlaceId, RoamError, RoamResult, Timestamp,
};
use serde::Serialize;

use crate::age::age_at;
use crate::store::Store;

/// Digits kept by [`round_half_up`].
pub const AVERAGE_DECIMALS: i32 = 5;

/// Mean of `total` over `count`, rounded half-up to [`AVERAGE_DECIMALS`]
/// decimal digits.
///
/// Rounding happens on the exact ratio in integers; a tie such as
/// `23 / 320 = 0.071875` has no exact `f64` form and would otherwise round
/// down. `count` must be positive and `total` non-negative.
pub fn round_half_up(total: i64, count: i64) -> f64 {
    let scale = 10i128.pow(AVERAGE_DECIMALS as u32);
    let (total, count) = (i128::from(total), i128::from(count));
    let scaled = (2 * total * scale + count) / (2 * count);
    scaled as f64 / scale as f64
}

/// Parse a numeric filter. Non-integers and zero are rejected.
fn numeric(params: &HashMap<String, String>, name: &str) -> RoamResult<Option<i64>> {
    let Some(raw) = params.get(name) else {
        return Ok(None);
    };
    match raw.parse::<i64>() {
        Ok(0) => Err(RoamError::malformed(format!("`{}` must not be zero", name))),
        Ok(value) => Ok(Some(value)),
        Err(_) => Err(RoamError::malformed(format!(
            "`{}` must be an integer, got {:?}",
            name, raw
        ))),
    }
}

/// Strict date window shared by both queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct DateWindow {
    from: Option<Timestamp>,
    to: Option<Timestamp>,
}

impl DateWindow {
    fn parse(params: &HashMap<String, String>) -> RoamResult<Self> {
        Ok(Self {
            from: numeric(params, "fromDate")?,
            to: numeric(params, "toDate")?,
        })
    }

    fn admits(&self, at: Timestamp) -> bool {
        self.from.map_or(true, |from| at > from) && self.to.map_or(true, |to| at < to)
    }
}

/// Filters for [`Store::visits_for_account`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitFilter {
    /// Keep visits strictly after this instant
    pub from_date: Option<Timestamp>,
    /// Keep visits strictly before this instant
    pub to_date: Option<Timestamp>,
    /// Keep visits to places in exactly this country
    pub country: Option<String>,
    /// Keep visits to places strictly closer than this
    pub to_distance: Option<i64>,
}

impl VisitFilter {
    /// Read `fromDate`, `toDate`, `country` and `toDistance` from query
    /// parameters. Other parameters are ignored.
    pub fn from_params(params: &HashMap<String, String>) -> RoamResult<Self> {
        let dates = DateWindow::parse(params)?;
        Ok(Self {
            from_date: dates.from,
            to_date: dates.to,
            country: params.get("country").cloned(),
            to_distance: numeric(params, "toDistance")?,
        })
    }

    fn dates(&self) -> DateWindow {
        DateWindow {
            from: self.from_date,
            to: self.to_date,
        }
    }

    fn admits_place(&self, place: &Place) -> bool {
        let country = self
            .country
            .as_deref()
            .map_or(true, |country| place.country == country);
        let distance = self
            .to_distance
            .map_or(true, |limit| i64::from(place.distance) < limit);
        country && distance
    }
}

/// Filters for [`Store::average_mark`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AverageFilter {
    /// Keep visits strictly after this instant
    pub from_date: Option<Timestamp>,
    /// Keep visits strictly before this instant
    pub to_date: Option<Timestamp>,
    /// Keep visitors at least this old
    pub from_age: Option<i64>,
    /// Keep visitors younger than this
    pub to_age: Option<i64>,
    /// Keep visitors of this gender
    pub gender: Option<Gender>,
}

impl AverageFilter {
    /// Read `fromDate`, `toDate`, `fromAge`, `toAge` and `gender` from query
    /// parameters. Other parameters are ignored.
    pub fn from_params(params: &HashMap<String, String>) -> RoamResult<Self> {
        let dates = DateWindow::parse(params)?;
        let gender = match params.get("gender") {
            None => None,
            Some(raw) => Some(Gender::parse(raw).ok_or_else(|| {
                RoamError::malformed(format!("`gender` must be \"m\" or \"f\", got {:?}", raw))
            })?),
        };
        Ok(Self {
            from_date: dates.from,
            to_date: dates.to,
            from_age: numeric(params, "fromAge")?,
            to_age: numeric(params, "toAge")?,
            gender,
        })
    }

    fn dates(&self) -> DateWindow {
        DateWindow {
            from: self.from_date,
            to: self.to_date,
        }
    }

    /// An unknown age passes only when no age bound is set.
    fn admits_age(&self, age: Option<i32>) -> bool {
        if self.from_age.is_none() && self.to_age.is_none() {
            return true;
        }
        let Some(age) = age else {
            return false;
        };
        let age = i64::from(age);
        self.from_age.map_or(true, |from| age >= from) && self.to_age.map_or(true, |to| age < to)
    }
}

/// One row of an account's visit listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountVisit {
    /// Name of the visited place
    pub place_name: String,
    /// When the visit happened
    pub visited_at: Timestamp,
    /// Rating given
    pub mark: i32,
}

impl Store {
    /// Visits of `account` passing `filter`, oldest first.
    ///
    /// Visits with equal instants keep their bucket order.
    pub fn visits_for_account(
        &self,
        account: AccountId,
        filter: &VisitFilter,
    ) -> RoamResult<Vec<AccountVisit>> {
        if !self.contains_account(account) {
            return Err(RoamError::not_found(EntityKind::Account, account));
        }

        let dates = filter.dates();
        let mut rows = Vec::new();
        {
            let index = self.by_account.read();
            for &id in index.members(account) {
                let Some(visit) = self.visits.get(id) else {
                    continue;
                };
                if visit.account_id != account || !dates.admits(visit.visited_at) {
                    continue;
                }
                let Some(place) = self.places.get(visit.place_id) else {
                    continue;
                };
                if !filter.admits_place(&place) {
                    continue;
                }
                rows.push(AccountVisit {
                    place_name: place.place_name,
                    visited_at: visit.visited_at,
                    mark: visit.mark,
                });
            }
        }

        rows.sort_by_key(|row| row.visited_at);
        Ok(rows)
    }

    /// Mean mark of the visits to `place` passing `filter`, rounded half-up
    /// to five decimals. `0.0` when nothing matches.
    pub fn average_mark(&self, place: PlaceId, filter: &AverageFilter) -> RoamResult<f64> {
        if !self.contains_place(place) {
            return Err(RoamError::not_found(EntityKind::Place, place));
        }

        let reference = self.reference_time();
        let dates = filter.dates();
        let needs_visitor =
            filter.gender.is_some() || filter.from_age.is_some() || filter.to_age.is_some();

        let (mut total, mut count) = (0i64, 0i64);
        {
            let index = self.by_place.read();
            for &id in index.members(place) {
                let Some(visit) = self.visits.get(id) else {
                    continue;
                };
                if visit.place_id != place || !dates.admits(visit.visited_at) {
                    continue;
                }
                if needs_visitor {
                    let admitted = self.accounts.read(visit.account_id, |visitor| {
                        filter
                            .gender
                            .map_or(true, |gender| gender.matches(&visitor.gender))
                            && filter.admits_age(age_at(visitor.birth_date, reference))
                    });
                    if admitted != Some(true) {
                        continue;
                    }
                }
                total += i64::from(visit.mark);
                count += 1;
            }
        }

        if count == 0 {
            return Ok(0.0);
        }
        Ok(round_half_up(total, count))
    }
}
