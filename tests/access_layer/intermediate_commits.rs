//! Size-bounded transactions

use std::sync::Arc;

use crate::common::{seed, setup};
use stratakv::{
    AccessMode, ErrorCode, Hints, Key, KeyBounds, KvEngine, OperationKind, ReadOptions, SavePoint,
    StatusHint, TransactionOptions, TransactionState,
};

fn options(count: u64) -> TransactionOptions {
    TransactionOptions {
        intermediate_commit_count: count,
        ..TransactionOptions::default()
    }
}

#[test]
fn test_intermediate_commit_keeps_guard_consistent() {
    let (engine, shared, cf) = setup();
    let mut txn = TransactionState::begin(
        Arc::clone(&shared),
        AccessMode::Transactional,
        Hints::INTERMEDIATE_COMMITS,
        options(3),
    )
    .unwrap();

    let mut commits = 0;
    for i in 0..7 {
        let mut guard = SavePoint::new(&mut txn, OperationKind::Insert);
        guard
            .methods()
            .put(&cf, &Key::from(format!("k{}", i).as_str()), b"v", StatusHint::Document)
            .unwrap();
        let ic = guard
            .state_mut()
            .add_operation(OperationKind::Insert, 1)
            .unwrap();
        if ic {
            commits += 1;
        }
        guard.finish(ic);
    }
    assert_eq!(commits, 2);
    assert_eq!(txn.num_intermediate_commits(), 2);
    assert_eq!(txn.counters().inserts, 7);

    // six keys are already visible outside the transaction
    let visible = (0..7)
        .filter(|i| {
            engine
                .get(&ReadOptions::default(), &cf, format!("k{}", i).as_bytes())
                .is_ok()
        })
        .count();
    assert_eq!(visible, 6);

    txn.commit().unwrap();
    assert_eq!(engine.pinned_snapshots(), 0);
}

#[test]
fn test_iterators_read_at_begin_snapshot() {
    let (engine, shared, cf) = setup();
    seed(&engine, &cf, &[("a/0", "x")]);

    let mut txn = TransactionState::begin(
        Arc::clone(&shared),
        AccessMode::Transactional,
        Hints::INTERMEDIATE_COMMITS,
        options(1),
    )
    .unwrap();
    let begin_sequence = txn.sequence_number();

    txn.methods()
        .put(&cf, &Key::from("a/1"), b"x", StatusHint::Document)
        .unwrap();
    assert!(txn.add_operation(OperationKind::Insert, 1).unwrap());
    assert!(txn.sequence_number() > begin_sequence);

    let methods = txn.methods();
    let read_options = methods.iterator_read_options();
    assert_eq!(
        read_options.snapshot.as_ref().map(|s| s.sequence()),
        Some(begin_sequence)
    );
    // point reads use the moved snapshot, range counts the begin snapshot
    assert!(methods.exists(&cf, &Key::from("a/1")).unwrap());
    let bounds = KeyBounds::prefix(cf.clone(), b"a/");
    assert_eq!(methods.count_in_bounds(&bounds, false).unwrap(), 1);
}

#[test]
fn test_size_limit_rejects_operation() {
    let (_engine, shared, _cf) = setup();
    let limited = TransactionOptions {
        max_transaction_size: 16,
        intermediate_commit_size: 16,
        ..TransactionOptions::default()
    };
    let mut txn =
        TransactionState::begin(shared, AccessMode::BatchedOverlay, Hints::NONE, limited).unwrap();

    txn.add_operation(OperationKind::Insert, 10).unwrap();
    let err = txn.add_operation(OperationKind::Insert, 10).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::ResourceLimit));
    assert_eq!(txn.buffered_size(), 10);
}

#[test]
fn test_options_from_toml() {
    let (_engine, shared, _cf) = setup();
    let parsed = TransactionOptions::from_toml_str(concat!(
        "max_transaction_size = 1048576\n",
        "intermediate_commit_size = 65536\n",
        "intermediate_commit_count = 5\n",
    ))
    .unwrap();
    let txn =
        TransactionState::begin(shared, AccessMode::Transactional, Hints::NONE, parsed).unwrap();
    assert_eq!(txn.options().intermediate_commit_count, 5);
    assert_eq!(txn.options().max_transaction_size, 1 << 20);
}
