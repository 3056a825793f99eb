//! Transactional access layer
//!
//! This crate sits between callers and a `KvEngine`:
//! - TransactionState: one logical transaction (snapshot, backing, counters)
//! - Access strategies: ReadOnly, Transactional, TransactionalUntracked,
//!   BatchedOverlay behind the `KvMethods` contract
//! - SavePoint: scoped per-operation rollback guard
//! - TransactionOptions / Hints: size limits and behavioral hints

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod methods;
pub mod save_point;
pub mod state;

pub use config::{
    Hints, TransactionOptions, DEFAULT_INTERMEDIATE_COMMIT_COUNT,
    DEFAULT_INTERMEDIATE_COMMIT_SIZE,
};
pub use methods::{
    AccessMethods, BatchedMethods, KvMethods, MethodsBase, ReadOnlyMethods, TrxMethods,
    TrxUntrackedMethods,
};
pub use save_point::SavePoint;
pub use state::{AccessMode, OperationCounters, OperationKind, TransactionState};
