//! Conflict detection and concurrent readers

use std::sync::{Arc, Barrier};
use std::thread;

use crate::common::{begin, seed, setup};
use stratakv::{AccessMode, ErrorCode, Hints, Key, KvMethods, StatusHint};

#[test]
fn test_tracked_writes_conflict() {
    let (_engine, shared, cf) = setup();
    let key = Key::from("contended");

    let mut first = begin(&shared, AccessMode::Transactional, Hints::NONE);
    let mut second = begin(&shared, AccessMode::Transactional, Hints::NONE);
    first
        .methods()
        .put(&cf, &key, b"first", StatusHint::Document)
        .unwrap();
    second
        .methods()
        .put(&cf, &key, b"second", StatusHint::Document)
        .unwrap();

    first.commit().unwrap();
    let err = second.commit().unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::Conflict));

    let mut reader = begin(&shared, AccessMode::ReadOnly, Hints::NONE);
    assert_eq!(&reader.methods().get(&cf, &key).unwrap()[..], b"first");
}

#[test]
fn test_untracked_writes_do_not_conflict() {
    let (_engine, shared, cf) = setup();
    let key = Key::from("counter");

    let mut first = begin(&shared, AccessMode::TransactionalUntracked, Hints::NONE);
    let mut second = begin(&shared, AccessMode::TransactionalUntracked, Hints::NONE);
    first
        .methods()
        .put(&cf, &key, b"1", StatusHint::None)
        .unwrap();
    second
        .methods()
        .put(&cf, &key, b"2", StatusHint::None)
        .unwrap();

    first.commit().unwrap();
    second.commit().unwrap();

    let mut reader = begin(&shared, AccessMode::ReadOnly, Hints::NONE);
    assert_eq!(&reader.methods().get(&cf, &key).unwrap()[..], b"2");
}

#[test]
fn test_batched_overlay_never_conflicts() {
    let (engine, shared, cf) = setup();
    let mut overlay = begin(&shared, AccessMode::BatchedOverlay, Hints::NONE);
    overlay
        .methods()
        .put(&cf, &Key::from("k"), b"overlay", StatusHint::Document)
        .unwrap();
    seed(&engine, &cf, &[("k", "direct")]);
    overlay.commit().unwrap();

    let mut reader = begin(&shared, AccessMode::ReadOnly, Hints::NONE);
    assert_eq!(
        &reader.methods().get(&cf, &Key::from("k")).unwrap()[..],
        b"overlay"
    );
}

#[test]
fn test_read_only_methods_shared_across_threads() {
    let (engine, shared, cf) = setup();
    seed(&engine, &cf, &[("a", "1"), ("b", "2"), ("c", "3")]);

    let txn = begin(&shared, AccessMode::ReadOnly, Hints::NONE);
    seed(&engine, &cf, &[("d", "4")]);

    let view = txn.read_only_methods();
    let barrier = Arc::new(Barrier::new(4));
    thread::scope(|s| {
        for _ in 0..4 {
            let barrier = Arc::clone(&barrier);
            let cf = &cf;
            s.spawn(move || {
                barrier.wait();
                for key in ["a", "b", "c"] {
                    assert!(view.exists(cf, &Key::from(key)).unwrap());
                }
                assert!(!view.exists(cf, &Key::from("d")).unwrap());
            });
        }
    });
}

#[test]
fn test_concurrent_transactions_one_winner() {
    let (_engine, shared, cf) = setup();
    let writers = 8;
    let barrier = Arc::new(Barrier::new(writers));

    let outcomes: Vec<bool> = thread::scope(|s| {
        let handles: Vec<_> = (0..writers)
            .map(|i| {
                let barrier = Arc::clone(&barrier);
                let shared = Arc::clone(&shared);
                let cf = cf.clone();
                s.spawn(move || {
                    let mut txn = begin(&shared, AccessMode::Transactional, Hints::NONE);
                    txn.methods()
                        .put(&cf, &Key::from("hot"), i.to_string().as_bytes(), StatusHint::Document)
                        .unwrap();
                    barrier.wait();
                    txn.commit().is_ok()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect()
    });

    assert_eq!(outcomes.iter().filter(|won| **won).count(), 1);
}
