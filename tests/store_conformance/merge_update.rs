//! Patches merge into stored records; rejected writes change nothing.

use roamdb::{AccountPatch, PlacePatch, RoamError, VisitPatch};

use crate::test_utils::*;

#[test]
fn created_account_reads_back_unchanged() {
    let store = store();
    let patch = AccountPatch {
        id: Some(5),
        email: Some("johndoe1@gmail.com".into()),
        first_name: Some("Jessie".into()),
        last_name: Some("Pinkman".into()),
        gender: Some("m".into()),
        birth_date: Some(616_550_400),
    };
    store.new_account(patch).unwrap();

    let stored = store.account(5).unwrap();
    assert_eq!(stored.email, "johndoe1@gmail.com");
    assert_eq!(stored.first_name, "Jessie");
    assert_eq!(stored.last_name, "Pinkman");
    assert_eq!(stored.gender, "m");
    assert_eq!(stored.birth_date, 616_550_400);
}

#[test]
fn partial_update_keeps_other_fields() {
    let store = store();
    store.create_account(account(5, "f", 30)).unwrap();
    let before = store.account(5).unwrap();

    let patch = AccountPatch {
        first_name: Some("X".into()),
        ..Default::default()
    };
    store.update_account(5, &patch).unwrap();

    let after = store.account(5).unwrap();
    assert_eq!(after.first_name, "X");
    assert_eq!(after.email, before.email);
    assert_eq!(after.gender, before.gender);
    assert_eq!(after.birth_date, before.birth_date);
}

#[test]
fn zero_values_keep_stored_fields() {
    let store = store();
    store.create_place(place(1, "Чили", 40)).unwrap();
    let patch = PlacePatch {
        distance: Some(0),
        city: Some(String::new()),
        ..Default::default()
    };
    store.update_place(1, &patch).unwrap();
    assert_eq!(store.place(1).unwrap(), place(1, "Чили", 40));
}

#[test]
fn duplicate_email_at_different_id_fails() {
    let store = store();
    let patch = |id| AccountPatch {
        id: Some(id),
        email: Some("same@mail.ru".into()),
        first_name: Some("A".into()),
        last_name: Some("B".into()),
        gender: Some("f".into()),
        birth_date: Some(0),
    };
    store.new_account(patch(1)).unwrap();
    assert!(matches!(
        store.new_account(patch(2)),
        Err(RoamError::Invalid { .. })
    ));
    assert!(!store.contains_account(2));
}

#[test]
fn mark_zero_is_a_real_rating() {
    let store = store();
    store.create_account(account(1, "m", 30)).unwrap();
    store.create_place(place(1, "Чили", 40)).unwrap();
    store.create_visit(visit(1, 1, 1, 100, 4)).unwrap();

    let patch = VisitPatch {
        mark: Some(0),
        visited_at: Some(0),
        ..Default::default()
    };
    store.update_visit(1, &patch).unwrap();
    let stored = store.visit(1).unwrap();
    assert_eq!(stored.mark, 0);
    assert_eq!(stored.visited_at, 100);
}

#[test]
fn rejected_update_leaves_record_and_index() {
    let store = store();
    store.create_account(account(1, "m", 30)).unwrap();
    store.create_place(place(1, "Чили", 40)).unwrap();
    store.create_visit(visit(1, 1, 1, 100, 4)).unwrap();

    let patch = VisitPatch {
        place_id: Some(2),
        mark: Some(3),
        ..Default::default()
    };
    assert!(store.update_visit(1, &patch).is_err());
    assert_eq!(store.visit(1).unwrap(), visit(1, 1, 1, 100, 4));
    assert_eq!(store.visits_of_place(1), vec![1]);
    assert!(store.visits_of_place(2).is_empty());
}
