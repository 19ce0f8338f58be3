//! Concurrent writers against readers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use roamdb::{AccountPatch, AverageFilter, Store, VisitFilter, VisitPatch};

use crate::test_utils::*;

#[test]
fn concurrent_creations_for_one_account() {
    let store = Arc::new(store());
    store.create_account(account(1, "m", 30)).unwrap();
    store.create_place(place(1, "Чили", 4)).unwrap();

    let threads = 8u32;
    let per_thread = 250u32;
    let barrier = Arc::new(Barrier::new(threads as usize));
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..per_thread {
                    let id = t * per_thread + i + 1;
                    store
                        .create_visit(visit(id, 1, 1, i64::from(id), 3))
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let mut ids = store.visits_of_account(1);
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), (threads * per_thread) as usize);
    assert_eq!(store.stats().visits, (threads * per_thread) as usize);
}

#[test]
fn same_id_created_twice_concurrently_wins_once() {
    let store = Arc::new(store());
    store.create_account(account(1, "m", 30)).unwrap();
    store.create_place(place(1, "Чили", 4)).unwrap();

    let barrier = Arc::new(Barrier::new(4));
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store.create_visit(visit(7, 1, 1, t, 3)).is_ok()
            })
        })
        .collect();
    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|won| *won)
        .count();
    assert_eq!(winners, 1);
    assert_eq!(store.visits_of_place(1), vec![7]);
}

#[test]
fn averages_never_double_count_a_moving_visit() {
    let store = Arc::new(store());
    store.create_account(account(1, "m", 30)).unwrap();
    store.create_place(place(1, "Россия", 3)).unwrap();
    store.create_place(place(2, "Чили", 40)).unwrap();
    // place 1 keeps ten 1-marks; the roaming visit carries a 5
    for id in 1..=10 {
        store.create_visit(visit(id, 1, 1, i64::from(id), 1)).unwrap();
    }
    store.create_visit(visit(11, 1, 2, 11, 5)).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let mover = {
        let store = Arc::clone(&store);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for round in 0..2_000u32 {
                let to = if round % 2 == 0 { 1 } else { 2 };
                let patch = VisitPatch {
                    place_id: Some(to),
                    ..Default::default()
                };
                store.update_visit(11, &patch).unwrap();
            }
            done.store(true, Ordering::Release);
        })
    };

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let store = Arc::clone(&store);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let filter = AverageFilter::default();
                while !done.load(Ordering::Acquire) {
                    let home = store.average_mark(1, &filter).unwrap();
                    // ten 1s alone, or ten 1s plus the 5
                    assert!(home == 1.0 || home == 1.36364, "avg {}", home);
                    let away = store.average_mark(2, &filter).unwrap();
                    assert!(away == 0.0 || away == 5.0, "avg {}", away);
                }
            })
        })
        .collect();

    mover.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }
    let filed = store.visits_of_place(1).len() + store.visits_of_place(2).len();
    assert_eq!(filed, 11);
}

#[test]
fn listing_sees_each_visit_once_during_account_moves() {
    let store = Arc::new(store());
    store.create_account(account(1, "m", 30)).unwrap();
    store.create_account(account(2, "f", 30)).unwrap();
    store.create_place(place(1, "Чили", 4)).unwrap();
    for id in 1..=20 {
        store.create_visit(visit(id, 1, 1, i64::from(id), 2)).unwrap();
    }

    let done = Arc::new(AtomicBool::new(false));
    let mover = {
        let store = Arc::clone(&store);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for round in 0..1_000u32 {
                let id = round % 20 + 1;
                let to = if (round / 20) % 2 == 0 { 2 } else { 1 };
                let patch = VisitPatch {
                    account_id: Some(to),
                    ..Default::default()
                };
                store.update_visit(id, &patch).unwrap();
            }
            done.store(true, Ordering::Release);
        })
    };

    let reader = {
        let store = Arc::clone(&store);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            while !done.load(Ordering::Acquire) {
                for account_id in [1, 2] {
                    let rows = store
                        .visits_for_account(account_id, &VisitFilter::default())
                        .unwrap();
                    let mut dates: Vec<_> = rows.iter().map(|r| r.visited_at).collect();
                    let len = dates.len();
                    dates.dedup();
                    assert_eq!(dates.len(), len);
                }
            }
        })
    };

    mover.join().unwrap();
    reader.join().unwrap();
    let total = store.visits_of_account(1).len() + store.visits_of_account(2).len();
    assert_eq!(total, 20);
}

#[test]
fn racing_email_claims_leave_one_owner() {
    let store: Arc<Store> = Arc::new(store());
    for id in 1..=6 {
        store.create_account(account(id, "m", 30)).unwrap();
    }

    let barrier = Arc::new(Barrier::new(6));
    let handles: Vec<_> = (1..=6u32)
        .map(|id| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let patch = AccountPatch {
                    email: Some("contested@mail.ru".into()),
                    ..Default::default()
                };
                store.update_account(id, &patch).is_ok()
            })
        })
        .collect();
    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|won| *won)
        .count();
    assert_eq!(winners, 1);

    let owner = store.email_owner("contested@mail.ru").unwrap();
    assert_eq!(store.account(owner).unwrap().email, "contested@mail.ru");
    for id in (1..=6).filter(|id| *id != owner) {
        let email = store.account(id).unwrap().email;
        assert_eq!(email, format!("traveller{}@mail.ru", id));
        assert_eq!(store.email_owner(&email), Some(id));
    }
}
