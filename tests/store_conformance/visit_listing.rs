//! Filtered visit listings.

use roamdb::VisitFilter;

use crate::test_utils::*;

fn seeded() -> roamdb::Store {
    let store = store();
    store.create_account(account(1, "m", 30)).unwrap();
    store.create_account(account(2, "f", 25)).unwrap();
    store.create_place(place(1, "Россия", 3)).unwrap();
    store.create_place(place(2, "Чили", 40)).unwrap();
    for (id, account_id, place_id, at, mark) in [
        (1, 1, 1, 500, 3),
        (2, 1, 2, 100, 4),
        (3, 1, 1, 300, 1),
        (4, 2, 2, 200, 5),
        (5, 1, 2, 400, 2),
    ] {
        store
            .create_visit(visit(id, account_id, place_id, at, mark))
            .unwrap();
    }
    store
}

#[test]
fn output_is_sorted_by_date() {
    let store = seeded();
    let rows = store.visits_for_account(1, &VisitFilter::default()).unwrap();
    let dates: Vec<_> = rows.iter().map(|r| r.visited_at).collect();
    assert_eq!(dates, vec![100, 300, 400, 500]);
}

#[test]
fn from_date_is_strict() {
    let store = seeded();
    let filter = VisitFilter {
        from_date: Some(300),
        ..Default::default()
    };
    let rows = store.visits_for_account(1, &filter).unwrap();
    assert!(rows.iter().all(|r| r.visited_at > 300));
    assert_eq!(rows.len(), 2);
}

#[test]
fn filters_combine() {
    let store = seeded();
    let filter = VisitFilter {
        to_date: Some(450),
        country: Some("Чили".into()),
        ..Default::default()
    };
    let rows = store.visits_for_account(1, &filter).unwrap();
    let marks: Vec<_> = rows.iter().map(|r| r.mark).collect();
    assert_eq!(marks, vec![4, 2]);

    let filter = VisitFilter {
        to_distance: Some(40),
        ..Default::default()
    };
    let rows = store.visits_for_account(1, &filter).unwrap();
    assert!(rows.iter().all(|r| r.place_name == "place 1"));
    assert_eq!(rows.len(), 2);
}

#[test]
fn listing_follows_account_moves() {
    let store = seeded();
    let patch = roamdb::VisitPatch {
        account_id: Some(2),
        ..Default::default()
    };
    store.update_visit(2, &patch).unwrap();

    let first = store.visits_for_account(1, &VisitFilter::default()).unwrap();
    let second = store.visits_for_account(2, &VisitFilter::default()).unwrap();
    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 2);
    assert_eq!(second[0].visited_at, 100);
}
