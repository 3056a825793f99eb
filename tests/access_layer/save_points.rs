//! Guarded operations

use std::sync::Arc;

use crate::common::{begin, setup, CountingEngine, COLLECTION};
use stratakv::{
    AccessMode, ColumnFamily, ErrorCode, Hints, Key, KvEngine, MemoryEngine, OperationCounters,
    OperationKind, SavePoint, StatusHint, TransactionOptions, TransactionState,
};

fn guarded_put<'a>(
    txn: &'a mut TransactionState,
    kind: OperationKind,
    cf: &ColumnFamily,
    key: &str,
    value: &str,
) -> SavePoint<'a> {
    let mut guard = SavePoint::new(txn, kind);
    guard
        .methods()
        .put(cf, &Key::from(key), value.as_bytes(), StatusHint::Document)
        .unwrap();
    guard
        .state_mut()
        .add_operation(kind, value.len() as u64)
        .unwrap();
    guard
}

fn counting() -> (Arc<CountingEngine>, ColumnFamily) {
    let engine = MemoryEngine::new();
    let cf = engine.create_column_family(COLLECTION);
    (Arc::new(CountingEngine::new(engine)), cf)
}

fn begin_counting(engine: &Arc<CountingEngine>, hints: Hints) -> TransactionState {
    let shared: Arc<dyn KvEngine> = Arc::clone(engine) as Arc<dyn KvEngine>;
    TransactionState::begin(shared, AccessMode::Transactional, hints, TransactionOptions::default())
        .unwrap()
}

#[test]
fn test_rolled_back_operation_leaves_earlier_one() {
    let (_engine, shared, cf) = setup();
    let mut txn = begin(&shared, AccessMode::Transactional, Hints::NONE);

    guarded_put(&mut txn, OperationKind::Insert, &cf, "a", "1").finish(false);
    {
        let mut b = guarded_put(&mut txn, OperationKind::Update, &cf, "a", "2");
        b.methods()
            .put(&cf, &Key::from("b"), b"2", StatusHint::Document)
            .unwrap();
        b.rollback().unwrap();
    }

    let methods = txn.methods();
    assert_eq!(&methods.get(&cf, &Key::from("a")).unwrap()[..], b"1");
    assert!(!methods.exists(&cf, &Key::from("b")).unwrap());
    drop(methods);
    assert_eq!(
        txn.counters(),
        OperationCounters {
            inserts: 1,
            updates: 0,
            removes: 0
        }
    );
}

#[test]
fn test_second_finish_or_rollback_is_noop() {
    let (engine, cf) = counting();
    let mut txn = begin_counting(&engine, Hints::NONE);

    {
        let mut guard = guarded_put(&mut txn, OperationKind::Insert, &cf, "a", "1");
        guard.finish(false);
        guard.finish(false);
        guard.rollback().unwrap();
    }
    assert_eq!(engine.calls.snapshot(), (1, 0, 1));

    {
        let mut guard = guarded_put(&mut txn, OperationKind::Remove, &cf, "b", "1");
        guard.rollback().unwrap();
        guard.rollback().unwrap();
        guard.finish(false);
    }
    assert_eq!(engine.calls.snapshot(), (2, 1, 1));
    assert_eq!(txn.counters().removes, 0);
}

#[test]
fn test_single_operation_touches_no_save_points() {
    let (engine, cf) = counting();
    let mut txn = begin_counting(&engine, Hints::SINGLE_OPERATION);
    assert!(txn.is_single_operation_transaction());

    guarded_put(&mut txn, OperationKind::Insert, &cf, "a", "1").finish(false);
    {
        // implicit drop
        let _guard = guarded_put(&mut txn, OperationKind::Insert, &cf, "b", "1");
    }
    {
        let mut guard = guarded_put(&mut txn, OperationKind::Insert, &cf, "c", "1");
        guard.rollback().unwrap();
    }

    assert_eq!(engine.calls.snapshot(), (0, 0, 0));
    assert_eq!(txn.counters().inserts, 3);
    txn.commit().unwrap();
}

#[test]
fn test_implicit_rollback_on_error_path() {
    fn failing_operation(txn: &mut TransactionState, cf: &ColumnFamily) -> stratakv::Result<()> {
        let mut guard = SavePoint::new(txn, OperationKind::Insert);
        guard
            .methods()
            .put(cf, &Key::from("partial"), b"v", StatusHint::Document)?;
        guard.state_mut().add_operation(OperationKind::Insert, 1)?;
        // a later step of the same operation fails; the guard rolls back
        guard.methods().get(cf, &Key::from("missing"))?;
        guard.finish(false);
        Ok(())
    }

    let (_engine, shared, cf) = setup();
    let mut txn = begin(&shared, AccessMode::Transactional, Hints::NONE);
    let err = failing_operation(&mut txn, &cf).unwrap_err();
    assert!(err.is_not_found());

    assert!(!txn.methods().exists(&cf, &Key::from("partial")).unwrap());
    assert_eq!(txn.counters().inserts, 0);
}

#[test]
fn test_guards_are_noops_on_read_only_and_batched() {
    let (_engine, shared, cf) = setup();

    let mut reader = begin(&shared, AccessMode::ReadOnly, Hints::NONE);
    {
        let mut guard = SavePoint::new(&mut reader, OperationKind::Insert);
        assert!(guard.rollback().is_ok());
    }

    let mut overlay = begin(&shared, AccessMode::BatchedOverlay, Hints::NONE);
    {
        let mut guard = guarded_put(&mut overlay, OperationKind::Insert, &cf, "k", "v");
        guard.rollback().unwrap();
    }
    // overlay writes are not undone, the counters are
    assert!(overlay.methods().exists(&cf, &Key::from("k")).unwrap());
    assert_eq!(overlay.counters().inserts, 0);
}

#[test]
fn test_rejected_operation_keeps_earlier_counters() {
    let (_engine, shared, cf) = setup();
    let limited = TransactionOptions {
        max_transaction_size: 16,
        intermediate_commit_size: 16,
        ..TransactionOptions::default()
    };
    let mut txn =
        TransactionState::begin(shared, AccessMode::Transactional, Hints::NONE, limited).unwrap();

    guarded_put(&mut txn, OperationKind::Insert, &cf, "a", "0123456789").finish(false);
    {
        let mut b = SavePoint::new(&mut txn, OperationKind::Insert);
        b.methods()
            .put(&cf, &Key::from("b"), b"0123456789", StatusHint::Document)
            .unwrap();
        let err = b
            .state_mut()
            .add_operation(OperationKind::Insert, 10)
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ResourceLimit));
        assert!(!b.is_recorded());
        // dropped without finish
    }

    let methods = txn.methods();
    assert!(methods.exists(&cf, &Key::from("a")).unwrap());
    assert!(!methods.exists(&cf, &Key::from("b")).unwrap());
    drop(methods);
    assert_eq!(txn.counters().inserts, 1);
    assert_eq!(txn.buffered_size(), 10);
}
