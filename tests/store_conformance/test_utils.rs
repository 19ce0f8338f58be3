//! Shared fixtures for the conformance suite.

use roamdb::{Account, AccountId, Place, PlaceId, Store, StoreOptions, Timestamp, Visit, VisitId};

/// 2017-08-25T21:10:52Z
pub const NOW: Timestamp = 1_503_695_452;

const DAY: Timestamp = 24 * 3600;

/// Store whose age reference is [`NOW`].
pub fn store() -> Store {
    Store::with_options(StoreOptions {
        reference_time: Some(NOW),
        ..Default::default()
    })
}

/// Birth date making someone `years` old at [`NOW`], a month past their
/// birthday.
pub fn born_years_ago(years: i64) -> Timestamp {
    NOW - years * 365 * DAY - years / 4 * DAY - 30 * DAY
}

pub fn account(id: AccountId, gender: &str, age: i64) -> Account {
    Account {
        id,
        email: format!("traveller{}@mail.ru", id),
        first_name: "Пётр".into(),
        last_name: "Фетатосян".into(),
        gender: gender.into(),
        birth_date: born_years_ago(age),
    }
}

pub fn place(id: PlaceId, country: &str, distance: i32) -> Place {
    Place {
        id,
        distance,
        city: "Санктгород".into(),
        place_name: format!("place {}", id),
        country: country.into(),
    }
}

pub fn visit(
    id: VisitId,
    account_id: AccountId,
    place_id: PlaceId,
    visited_at: Timestamp,
    mark: i32,
) -> Visit {
    Visit {
        id,
        account_id,
        place_id,
        visited_at,
        mark,
    }
}
