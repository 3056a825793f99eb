//! Storage layer for the access strategies
//!
//! This crate implements the in-memory reference engine with:
//! - MemoryEngine: multi-version tables per column family behind one RwLock
//! - MemoryTransaction: optimistic transactions with tracked-key validation
//! - Bloom filters (xxh3) backing `key_may_exist`
//! - Snapshot pinning
//! - Sequence numbers with AtomicU64, one per applied batch

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bloom;
pub mod engine;
pub mod memtable;
pub mod registry;
pub mod snapshot;
pub mod transaction;

pub use bloom::BloomFilter;
pub use engine::MemoryEngine;
pub use memtable::MemTable;
pub use registry::{ColumnFamilyRegistry, DEFAULT_COLUMN_FAMILY};
pub use snapshot::SnapshotTracker;
pub use transaction::MemoryTransaction;
