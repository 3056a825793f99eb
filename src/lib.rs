//! stratakv - transactional key-value access layer over an LSM-style engine
//!
//! Every logical transaction reaches the engine through one of four access
//! strategies, selected by [`AccessMode`]:
//!
//! - `ReadOnly`: reads at the transaction snapshot, writes are rejected
//! - `Transactional`: reads and conflict-tracked writes through an engine
//!   transaction
//! - `TransactionalUntracked`: same, but writes skip conflict tracking
//! - `BatchedOverlay`: writes are buffered in an overlay batch that is
//!   applied atomically on commit
//!
//! Individual operations are bracketed by a [`SavePoint`] so a failed
//! operation can be undone without aborting the whole transaction.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use stratakv::{
//!     AccessMode, Hints, Key, MemoryEngine, OperationKind, SavePoint, StatusHint,
//!     TransactionOptions, TransactionState,
//! };
//!
//! let engine = MemoryEngine::new();
//! let cf = engine.create_column_family("documents");
//! let mut txn = TransactionState::begin(
//!     Arc::new(engine.clone()),
//!     AccessMode::Transactional,
//!     Hints::NONE,
//!     TransactionOptions::default(),
//! )?;
//!
//! let mut guard = SavePoint::new(&mut txn, OperationKind::Insert);
//! guard.methods().put(&cf, &Key::from("k1"), b"v1", StatusHint::Document)?;
//! let intermediate = guard.state_mut().add_operation(OperationKind::Insert, 4)?;
//! guard.finish(intermediate);
//! drop(guard);
//!
//! txn.commit()?;
//! # Ok::<(), stratakv::Error>(())
//! ```
//!
//! # Architecture
//!
//! - `strata-core`: types, status translation, engine traits, write batch
//! - `strata-storage`: in-memory reference engine
//! - `strata-concurrency`: transaction state, access strategies, save points

pub use strata_concurrency::*;
pub use strata_core::{
    check, convert_status, ColumnFamily, EngineResult, EngineTransaction, Error, ErrorCode, Key,
    KeyBounds, KvEngine, KvIterator, MayExist, ReadOptions, Result, SequenceNumber, Snapshot,
    Status, StatusCode, StatusHint, SubCode, WriteBatch,
};
pub use strata_storage::MemoryEngine;
