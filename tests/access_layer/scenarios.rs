//! End-to-end flows

use crate::common::{begin, seed, setup};
use stratakv::{
    AccessMode, Error, ErrorCode, Hints, Key, KvEngine, OperationKind, ReadOptions, SavePoint,
    StatusHint,
};

#[test]
fn test_second_guard_rolled_back() {
    let (engine, shared, cf) = setup();
    let mut txn = begin(&shared, AccessMode::Transactional, Hints::NONE);

    {
        let mut first = SavePoint::new(&mut txn, OperationKind::Insert);
        first
            .methods()
            .put(&cf, &Key::from("k1"), b"v1", StatusHint::Document)
            .unwrap();
        let ic = first
            .state_mut()
            .add_operation(OperationKind::Insert, 2)
            .unwrap();
        first.finish(ic);
    }
    {
        let mut second = SavePoint::new(&mut txn, OperationKind::Insert);
        second
            .methods()
            .put(&cf, &Key::from("k2"), b"v2", StatusHint::Document)
            .unwrap();
        second
            .state_mut()
            .add_operation(OperationKind::Insert, 2)
            .unwrap();
        second.rollback().unwrap();
    }

    {
        let methods = txn.methods();
        assert_eq!(&methods.get(&cf, &Key::from("k1")).unwrap()[..], b"v1");
        assert!(methods.get(&cf, &Key::from("k2")).unwrap_err().is_not_found());
    }
    assert_eq!(txn.counters().inserts, 1);

    txn.commit().unwrap();
    let options = ReadOptions::default();
    assert_eq!(&engine.get(&options, &cf, b"k1").unwrap()[..], b"v1");
    assert!(engine.get(&options, &cf, b"k2").unwrap_err().is_not_found());
}

#[test]
fn test_read_only_scenario() {
    let (_engine, shared, cf) = setup();
    let mut txn = begin(&shared, AccessMode::ReadOnly, Hints::NONE);
    let mut methods = txn.methods();
    let key = Key::from("never");

    assert!(!methods.exists(&cf, &key).unwrap());
    assert_eq!(methods.delete(&cf, &key), Err(Error::ReadOnlyViolation));
}

#[test]
fn test_untracked_metadata_alongside_tracked_data() {
    let (engine, shared, cf) = setup();
    let meta = engine.create_column_family("meta");

    let mut data = begin(&shared, AccessMode::Transactional, Hints::NONE);
    data.methods()
        .put(&cf, &Key::from("doc"), b"body", StatusHint::Document)
        .unwrap();
    data.commit().unwrap();

    let mut counter = begin(&shared, AccessMode::TransactionalUntracked, Hints::NONE);
    counter
        .methods()
        .put(&meta, &Key::from("count"), b"1", StatusHint::None)
        .unwrap();
    counter.commit().unwrap();

    let mut reader = begin(&shared, AccessMode::ReadOnly, Hints::NONE);
    let methods = reader.methods();
    assert!(methods.exists(&cf, &Key::from("doc")).unwrap());
    assert_eq!(&methods.get(&meta, &Key::from("count")).unwrap()[..], b"1");
}

#[test]
fn test_abort_discards_everything() {
    let (engine, shared, cf) = setup();
    seed(&engine, &cf, &[("k", "old")]);

    for mode in [
        AccessMode::Transactional,
        AccessMode::TransactionalUntracked,
        AccessMode::BatchedOverlay,
    ] {
        let mut txn = begin(&shared, mode, Hints::NONE);
        txn.methods()
            .put(&cf, &Key::from("k"), b"new", StatusHint::Document)
            .unwrap();
        txn.abort();
    }

    assert_eq!(
        &engine.get(&ReadOptions::default(), &cf, b"k").unwrap()[..],
        b"old"
    );
    assert_eq!(engine.pinned_snapshots(), 0);
}

#[test]
fn test_unknown_column_family_is_bad_parameter() {
    let (_engine, shared, _cf) = setup();
    let stranger = stratakv::ColumnFamily::new(42, "stranger");

    let mut txn = begin(&shared, AccessMode::Transactional, Hints::NONE);
    let err = txn
        .methods()
        .get(&stranger, &Key::from("k"))
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::BadParameter));
    assert!(err.to_string().contains("Get - in TrxMethods"));
}
