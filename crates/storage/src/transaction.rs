//! MemoryTransaction: optimistic engine transaction
//!
//! Writes are buffered in an indexed [`WriteBatch`]. Tracked writes also
//! record their key; at commit every tracked key is checked against the
//! transaction's snapshot and the commit fails with `Busy` if another
//! batch wrote the key after the snapshot was taken.
//!
//! # Lifecycle
//!
//! `Active` → `Committed` | `RolledBack`. A failed commit leaves the
//! transaction active so the caller can roll it back. Any use after the
//! transaction finished fails with `InvalidArgument`.

use std::sync::Arc;

use bytes::Bytes;
use smallvec::SmallVec;
use strata_core::{
    BatchLookup, ColumnFamily, EngineResult, EngineTransaction, KvIterator, ReadOptions,
    SequenceNumber, Snapshot, Status, WriteBatch, WriteKind,
};
use tracing::debug;

use crate::engine::{EngineInner, TrackedKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxnState {
    Active,
    Committed,
    RolledBack,
}

/// Engine transaction over a [`MemoryEngine`](crate::MemoryEngine)
#[derive(Debug)]
pub struct MemoryTransaction {
    inner: Arc<EngineInner>,
    snapshot: Snapshot,
    batch: WriteBatch,
    tracked: Vec<TrackedKey>,
    /// Length of `tracked` at each save point
    tracked_marks: SmallVec<[usize; 4]>,
    indexing: bool,
    state: TxnState,
}

impl MemoryTransaction {
    pub(crate) fn new(inner: Arc<EngineInner>, snapshot: Snapshot) -> Self {
        Self {
            inner,
            snapshot,
            batch: WriteBatch::new(),
            tracked: Vec::new(),
            tracked_marks: SmallVec::new(),
            indexing: true,
            state: TxnState::Active,
        }
    }

    fn ensure_active(&self) -> EngineResult<()> {
        match self.state {
            TxnState::Active => Ok(()),
            TxnState::Committed => {
                Err(Status::invalid_argument("transaction already committed"))
            }
            TxnState::RolledBack => {
                Err(Status::invalid_argument("transaction already rolled back"))
            }
        }
    }

    fn write(
        &mut self,
        cf: &ColumnFamily,
        key: &[u8],
        kind: WriteKind,
        track: bool,
    ) -> EngineResult<()> {
        self.ensure_active()?;
        self.inner.check_column_family(cf)?;
        self.batch.push(cf, key, kind, self.indexing);
        if track {
            self.tracked.push((cf.clone(), key.to_vec()));
        }
        Ok(())
    }

    /// Snapshot the transaction validates against
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Number of keys tracked for conflict detection
    pub fn tracked_keys(&self) -> usize {
        self.tracked.len()
    }
}

impl EngineTransaction for MemoryTransaction {
    fn get(&self, options: &ReadOptions, cf: &ColumnFamily, key: &[u8]) -> EngineResult<Bytes> {
        self.ensure_active()?;
        match self.batch.get_from_batch(cf, key) {
            BatchLookup::Found(value) => Ok(value),
            BatchLookup::Deleted => Err(Status::not_found("deleted in transaction")),
            BatchLookup::NotFound => self.inner.get(options, cf, key),
        }
    }

    fn put(&mut self, cf: &ColumnFamily, key: &[u8], value: &[u8]) -> EngineResult<()> {
        self.write(cf, key, WriteKind::Put(Bytes::copy_from_slice(value)), true)
    }

    fn delete(&mut self, cf: &ColumnFamily, key: &[u8]) -> EngineResult<()> {
        self.write(cf, key, WriteKind::Delete, true)
    }

    fn single_delete(&mut self, cf: &ColumnFamily, key: &[u8]) -> EngineResult<()> {
        self.write(cf, key, WriteKind::SingleDelete, true)
    }

    fn put_untracked(&mut self, cf: &ColumnFamily, key: &[u8], value: &[u8]) -> EngineResult<()> {
        self.write(cf, key, WriteKind::Put(Bytes::copy_from_slice(value)), false)
    }

    fn delete_untracked(&mut self, cf: &ColumnFamily, key: &[u8]) -> EngineResult<()> {
        self.write(cf, key, WriteKind::Delete, false)
    }

    fn single_delete_untracked(&mut self, cf: &ColumnFamily, key: &[u8]) -> EngineResult<()> {
        self.write(cf, key, WriteKind::SingleDelete, false)
    }

    fn iterator<'a>(
        &'a self,
        options: &ReadOptions,
        cf: &ColumnFamily,
    ) -> Box<dyn KvIterator + 'a> {
        let base = self.inner.iterator(options, cf);
        Box::new(self.batch.iterator_with_base(cf, base, options))
    }

    fn set_save_point(&mut self) {
        self.batch.set_save_point();
        self.tracked_marks.push(self.tracked.len());
    }

    fn rollback_to_save_point(&mut self) -> EngineResult<()> {
        self.ensure_active()?;
        self.batch.rollback_to_save_point()?;
        if let Some(mark) = self.tracked_marks.pop() {
            self.tracked.truncate(mark);
        }
        Ok(())
    }

    fn pop_save_point(&mut self) -> EngineResult<()> {
        self.ensure_active()?;
        self.batch.pop_save_point()?;
        self.tracked_marks.pop();
        Ok(())
    }

    fn disable_indexing(&mut self) {
        self.indexing = false;
    }

    fn enable_indexing(&mut self) {
        self.indexing = true;
    }

    fn data_size(&self) -> usize {
        self.batch.data_size()
    }

    fn num_writes(&self) -> usize {
        self.batch.count()
    }

    fn commit(&mut self) -> EngineResult<SequenceNumber> {
        self.ensure_active()?;
        let sequence = self
            .inner
            .commit(&self.batch, &self.tracked, self.snapshot.sequence())?;
        debug!(
            target: "strata::storage",
            sequence,
            writes = self.batch.count(),
            tracked = self.tracked.len(),
            "Transaction committed"
        );
        self.batch.clear();
        self.tracked.clear();
        self.tracked_marks.clear();
        self.state = TxnState::Committed;
        Ok(sequence)
    }

    fn rollback(&mut self) {
        self.batch.clear();
        self.tracked.clear();
        self.tracked_marks.clear();
        self.state = TxnState::RolledBack;
    }
}
