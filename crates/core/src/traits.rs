//! Engine abstraction
//!
//! This module defines the interface the access layer consumes from the
//! embedded key-value engine. The access strategies only talk to these
//! traits, so the reference engine in `strata-storage` can be swapped for
//! another implementation without touching upper layers.
//!
//! Thread safety: engines and transaction handles must be `Send + Sync`.
//! Iterators are borrowed from their source and are not `Send`.

use bytes::Bytes;

use crate::iterator::KvIterator;
use crate::options::{ReadOptions, Snapshot};
use crate::status::EngineResult;
use crate::types::{ColumnFamily, SequenceNumber};
use crate::write_batch::WriteBatch;

/// Answer of the cheap existence probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MayExist {
    /// Definitely absent
    No,
    /// Possibly present; an authoritative read is required
    Maybe,
    /// Present, and the probe already found the value
    Found(Bytes),
}

/// Embedded key-value engine
pub trait KvEngine: Send + Sync {
    /// Point read
    ///
    /// Reads at `options.snapshot`, or the latest committed state when no
    /// snapshot is set. Fails with `NotFound` when the key is absent.
    fn get(&self, options: &ReadOptions, cf: &ColumnFamily, key: &[u8]) -> EngineResult<Bytes>;

    /// Cheap existence probe that may report false positives but never
    /// false negatives
    fn key_may_exist(&self, options: &ReadOptions, cf: &ColumnFamily, key: &[u8]) -> MayExist;

    /// Range cursor over `cf` at `options.snapshot`
    fn new_iterator<'a>(&'a self, options: &ReadOptions, cf: &ColumnFamily)
        -> Box<dyn KvIterator + 'a>;

    /// Apply a batch atomically, returning its sequence number
    fn write(&self, batch: &WriteBatch) -> EngineResult<SequenceNumber>;

    /// Pin the latest committed state
    fn snapshot(&self) -> Snapshot;

    /// Unpin a snapshot obtained from [`snapshot`](Self::snapshot)
    fn release_snapshot(&self, snapshot: &Snapshot);

    /// Sequence number of the most recently applied batch
    fn latest_sequence_number(&self) -> SequenceNumber;

    /// Start an engine transaction reading at `snapshot`
    ///
    /// The caller keeps ownership of the snapshot and releases it.
    fn begin_transaction(&self, snapshot: Snapshot) -> Box<dyn EngineTransaction>;
}

/// Live engine transaction handle
///
/// Writes are buffered until [`commit`](Self::commit). Tracked writes are
/// validated against concurrent commits; untracked writes are not.
pub trait EngineTransaction: Send + Sync {
    /// Point read through the transaction (own indexed writes first)
    fn get(&self, options: &ReadOptions, cf: &ColumnFamily, key: &[u8]) -> EngineResult<Bytes>;

    /// Tracked put
    fn put(&mut self, cf: &ColumnFamily, key: &[u8], value: &[u8]) -> EngineResult<()>;

    /// Tracked delete
    fn delete(&mut self, cf: &ColumnFamily, key: &[u8]) -> EngineResult<()>;

    /// Tracked single delete
    fn single_delete(&mut self, cf: &ColumnFamily, key: &[u8]) -> EngineResult<()>;

    /// Put without conflict tracking
    fn put_untracked(&mut self, cf: &ColumnFamily, key: &[u8], value: &[u8]) -> EngineResult<()>;

    /// Delete without conflict tracking
    fn delete_untracked(&mut self, cf: &ColumnFamily, key: &[u8]) -> EngineResult<()>;

    /// Single delete without conflict tracking
    fn single_delete_untracked(&mut self, cf: &ColumnFamily, key: &[u8]) -> EngineResult<()>;

    /// Cursor over the transaction's writes layered on the engine state
    fn iterator<'a>(&'a self, options: &ReadOptions, cf: &ColumnFamily)
        -> Box<dyn KvIterator + 'a>;

    /// Push a save point
    fn set_save_point(&mut self);

    /// Undo every write since the most recent save point and pop it
    fn rollback_to_save_point(&mut self) -> EngineResult<()>;

    /// Pop the most recent save point without undoing writes
    fn pop_save_point(&mut self) -> EngineResult<()>;

    /// Stop indexing subsequent writes; they stay invisible to the
    /// transaction's own reads until commit
    fn disable_indexing(&mut self);

    /// Resume indexing writes
    fn enable_indexing(&mut self);

    /// Approximate buffered bytes
    fn data_size(&self) -> usize;

    /// Number of buffered writes
    fn num_writes(&self) -> usize;

    /// Validate and apply buffered writes
    fn commit(&mut self) -> EngineResult<SequenceNumber>;

    /// Discard buffered writes
    fn rollback(&mut self);
}
