//! Core types and traits for the strata KV access layer
//!
//! This crate defines the foundational types used throughout the system:
//! - ColumnFamily, Key, KeyBounds: Keyspace partitions and opaque keys
//! - ReadOptions, Snapshot: Read visibility
//! - Status, StatusHint: Engine outcomes and their translation
//! - Error: Domain error taxonomy (NotFound, ReadOnlyViolation, Storage)
//! - Traits: Engine abstraction (KvEngine, EngineTransaction, KvIterator)
//! - WriteBatch: Indexed write buffer used as transaction buffer and overlay

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod iterator;
pub mod options;
pub mod status;
pub mod traits;
pub mod types;
pub mod write_batch;

pub use error::{Error, ErrorCode, Result};
pub use iterator::{collect_entries, BaseDeltaIterator, DeltaEntries, KvIterator, VecIterator};
pub use options::{ReadOptions, Snapshot};
pub use status::{check, convert_status, EngineResult, Status, StatusCode, StatusHint, SubCode};
pub use traits::{EngineTransaction, KvEngine, MayExist};
pub use types::{ColumnFamily, Key, KeyBounds, SequenceNumber};
pub use write_batch::{BatchEntry, BatchLookup, WriteBatch, WriteKind};
