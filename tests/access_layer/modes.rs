//! Visibility rules of the four access strategies

use crate::common::{begin, seed, setup, ALL_MODES};
use stratakv::{AccessMode, Error, Hints, Key, KeyBounds, KvEngine, ReadOptions, StatusHint};

#[test]
fn test_unwritten_keys_are_absent_in_every_mode() {
    let (engine, shared, cf) = setup();
    seed(&engine, &cf, &[("present", "v")]);

    for mode in ALL_MODES {
        let mut txn = begin(&shared, mode, Hints::NONE);
        let methods = txn.methods();
        let key = Key::from("never-written");
        assert!(!methods.exists(&cf, &key).unwrap(), "{:?}", mode);
        let err = methods.get(&cf, &key).unwrap_err();
        assert!(err.is_not_found(), "{:?}: {}", mode, err);
        assert!(methods.exists(&cf, &Key::from("present")).unwrap(), "{:?}", mode);
    }
}

#[test]
fn test_last_write_wins_in_transactional_modes() {
    let (_engine, shared, cf) = setup();
    for mode in [AccessMode::Transactional, AccessMode::TransactionalUntracked] {
        let mut txn = begin(&shared, mode, Hints::NONE);
        let mut methods = txn.methods();
        let key = Key::from("k");
        for value in ["v1", "v2", "v3"] {
            methods
                .put(&cf, &key, value.as_bytes(), StatusHint::Document)
                .unwrap();
            assert_eq!(&methods.get(&cf, &key).unwrap()[..], value.as_bytes());
        }
        let mut out = Vec::new();
        methods.get_into(&cf, &key, &mut out).unwrap();
        assert_eq!(out, b"v3");
    }
}

#[test]
fn test_read_only_rejects_every_write() {
    let (engine, shared, cf) = setup();
    seed(&engine, &cf, &[("k", "v")]);
    let before = engine.latest_sequence_number();

    let mut txn = begin(&shared, AccessMode::ReadOnly, Hints::NONE);
    {
        let mut methods = txn.methods();
        let key = Key::from("k");
        assert_eq!(
            methods.put(&cf, &key, b"x", StatusHint::Document),
            Err(Error::ReadOnlyViolation)
        );
        assert_eq!(methods.delete(&cf, &key), Err(Error::ReadOnlyViolation));
        assert_eq!(methods.single_delete(&cf, &key), Err(Error::ReadOnlyViolation));
        assert_eq!(&methods.get(&cf, &key).unwrap()[..], b"v");
    }
    txn.commit().unwrap();

    assert_eq!(engine.latest_sequence_number(), before);
    assert_eq!(
        &engine.get(&ReadOptions::default(), &cf, b"k").unwrap()[..],
        b"v"
    );
}

#[test]
fn test_snapshot_modes_ignore_later_commits() {
    let (engine, shared, cf) = setup();
    let mut pinned = [
        begin(&shared, AccessMode::ReadOnly, Hints::NONE),
        begin(&shared, AccessMode::Transactional, Hints::NONE),
        begin(&shared, AccessMode::TransactionalUntracked, Hints::NONE),
    ];
    let mut batched = begin(&shared, AccessMode::BatchedOverlay, Hints::NONE);

    seed(&engine, &cf, &[("late", "v")]);

    for txn in pinned.iter_mut() {
        assert!(!txn.methods().exists(&cf, &Key::from("late")).unwrap());
    }
    // the overlay reads the latest committed state
    assert!(batched.methods().exists(&cf, &Key::from("late")).unwrap());
}

#[test]
fn test_batched_overlay_then_apply() {
    let (engine, shared, cf) = setup();
    let key = Key::from("k");

    let mut overlay = begin(&shared, AccessMode::BatchedOverlay, Hints::NONE);
    {
        let mut methods = overlay.methods();
        methods.put(&cf, &key, b"v", StatusHint::Document).unwrap();
        assert!(methods.exists(&cf, &key).unwrap());
        assert_eq!(&methods.get(&cf, &key).unwrap()[..], b"v");
    }
    assert!(engine
        .get(&ReadOptions::default(), &cf, key.as_bytes())
        .unwrap_err()
        .is_not_found());

    overlay.commit().unwrap();

    for mode in [AccessMode::ReadOnly, AccessMode::Transactional] {
        let mut fresh = begin(&shared, mode, Hints::NONE);
        assert_eq!(&fresh.methods().get(&cf, &key).unwrap()[..], b"v", "{:?}", mode);
    }
}

#[test]
fn test_iterators_follow_strategy_visibility() {
    let (engine, shared, cf) = setup();
    seed(&engine, &cf, &[("a/1", "x"), ("a/2", "x"), ("b/1", "x")]);
    let bounds = KeyBounds::prefix(cf.clone(), b"a/");

    for mode in [
        AccessMode::Transactional,
        AccessMode::TransactionalUntracked,
        AccessMode::BatchedOverlay,
    ] {
        let mut txn = begin(&shared, mode, Hints::NONE);
        let mut methods = txn.methods();
        methods
            .put(&cf, &Key::from("a/3"), b"y", StatusHint::Document)
            .unwrap();
        methods.delete(&cf, &Key::from("a/1")).unwrap();

        assert_eq!(methods.count_in_bounds(&bounds, false).unwrap(), 2, "{:?}", mode);
        assert_eq!(methods.count_in_bounds(&bounds, true).unwrap(), 1, "{:?}", mode);
    }

    let mut reader = begin(&shared, AccessMode::ReadOnly, Hints::NONE);
    assert_eq!(reader.methods().count_in_bounds(&bounds, false).unwrap(), 2);
}

#[test]
fn test_disabled_indexing_hides_own_writes_until_commit() {
    let (engine, shared, cf) = setup();
    let mut txn = begin(&shared, AccessMode::Transactional, Hints::NONE);
    {
        let mut methods = txn.methods();
        assert!(methods.disable_indexing());
        methods
            .put(&cf, &Key::from("bulk"), b"v", StatusHint::Document)
            .unwrap();
        assert!(!methods.exists(&cf, &Key::from("bulk")).unwrap());
        methods.enable_indexing();
    }
    txn.commit().unwrap();
    assert!(engine.get(&ReadOptions::default(), &cf, b"bulk").is_ok());
}

#[test]
fn test_indexing_toggle_is_noop_outside_transactions() {
    let (_engine, shared, _cf) = setup();
    for mode in [AccessMode::ReadOnly, AccessMode::BatchedOverlay] {
        let mut txn = begin(&shared, mode, Hints::NONE);
        let mut methods = txn.methods();
        assert!(!methods.disable_indexing(), "{:?}", mode);
        methods.enable_indexing();
    }
}
