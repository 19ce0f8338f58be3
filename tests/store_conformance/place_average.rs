//! Average marks with age and gender filters.

use roamdb::{age_at, AverageFilter, Gender};

use crate::test_utils::*;

fn seeded() -> roamdb::Store {
    let store = store();
    store.create_account(account(1, "m", 8)).unwrap();
    store.create_account(account(2, "f", 25)).unwrap();
    store.create_account(account(3, "m", 40)).unwrap();
    store.create_place(place(1, "Россия", 3)).unwrap();
    store.create_place(place(2, "Чили", 40)).unwrap();
    for (id, account_id, at, mark) in [
        (1, 1, 100, 3),
        (2, 2, 200, 2),
        (3, 3, 300, 3),
        (4, 3, 400, 2),
        (5, 2, 500, 3),
        (6, 1, 600, 3),
        (7, 2, 700, 2),
    ] {
        store.create_visit(visit(id, account_id, 1, at, mark)).unwrap();
    }
    store
}

#[test]
fn fixture_ages() {
    assert_eq!(age_at(born_years_ago(8), NOW), Some(8));
    assert_eq!(age_at(born_years_ago(25), NOW), Some(25));
    assert_eq!(age_at(born_years_ago(40), NOW), Some(40));
}

#[test]
fn unfiltered_average_rounds_half_up() {
    let store = seeded();
    // 18 / 7 = 2.571428...
    assert_eq!(
        store.average_mark(1, &AverageFilter::default()).unwrap(),
        2.57143
    );
}

#[test]
fn no_matching_visits_is_zero() {
    let store = seeded();
    assert_eq!(store.average_mark(2, &AverageFilter::default()).unwrap(), 0.0);
    let filter = AverageFilter {
        from_date: Some(700),
        ..Default::default()
    };
    assert_eq!(store.average_mark(1, &filter).unwrap(), 0.0);
}

#[test]
fn age_bounds() {
    let store = seeded();
    let adults = AverageFilter {
        from_age: Some(25),
        ..Default::default()
    };
    // 2, 3, 2, 3, 2
    assert_eq!(store.average_mark(1, &adults).unwrap(), 2.4);

    let under_25 = AverageFilter {
        to_age: Some(25),
        ..Default::default()
    };
    assert_eq!(store.average_mark(1, &under_25).unwrap(), 3.0);
}

#[test]
fn gender_and_dates() {
    let store = seeded();
    let men = AverageFilter {
        gender: Some(Gender::Male),
        ..Default::default()
    };
    assert_eq!(store.average_mark(1, &men).unwrap(), 2.75);

    let window = AverageFilter {
        from_date: Some(100),
        to_date: Some(600),
        gender: Some(Gender::Female),
        ..Default::default()
    };
    assert_eq!(store.average_mark(1, &window).unwrap(), 2.5);
}

#[test]
fn reference_time_moves_ages() {
    let store = seeded();
    let filter = AverageFilter {
        to_age: Some(10),
        ..Default::default()
    };
    assert_eq!(store.average_mark(1, &filter).unwrap(), 3.0);
    store.set_reference_time(NOW + 5 * 366 * 24 * 3600);
    assert_eq!(store.average_mark(1, &filter).unwrap(), 0.0);
}
