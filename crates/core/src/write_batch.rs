//! Indexed write batch (overlay)
//!
//! A `WriteBatch` buffers puts and deletes in arrival order and keeps an
//! index of the latest indexed write per key, so the buffered state can be
//! read back:
//!
//! - point reads through [`WriteBatch::get_from_batch`] or merged with the
//!   engine through [`WriteBatch::get_from_batch_and_db`]
//! - range reads through [`WriteBatch::iterator_with_base`]
//!
//! Writes pushed with `indexed = false` are applied when the batch is written
//! but are invisible to batch reads. Save points mark a prefix of the batch;
//! rolling back truncates to the mark and rebuilds the index.

use std::collections::BTreeMap;

use bytes::Bytes;
use smallvec::SmallVec;

use crate::iterator::{BaseDeltaIterator, DeltaEntries, KvIterator};
use crate::options::ReadOptions;
use crate::status::{EngineResult, Status};
use crate::traits::KvEngine;
use crate::types::ColumnFamily;

/// Fixed bookkeeping bytes accounted per buffered write
const ENTRY_OVERHEAD: usize = 1;

/// Kind of a buffered write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteKind {
    /// Insert or overwrite with the given value
    Put(Bytes),
    /// Remove the key
    Delete,
    /// Remove a key that was written at most once
    SingleDelete,
}

impl WriteKind {
    /// Value written, `None` for deletes
    pub fn value(&self) -> Option<&Bytes> {
        match self {
            WriteKind::Put(value) => Some(value),
            WriteKind::Delete | WriteKind::SingleDelete => None,
        }
    }
}

/// One buffered write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    /// Target column family
    pub column_family: ColumnFamily,
    /// Encoded key
    pub key: Vec<u8>,
    /// Put or delete
    pub kind: WriteKind,
    /// Whether batch reads observe this write
    pub indexed: bool,
}

impl BatchEntry {
    fn size(&self) -> usize {
        ENTRY_OVERHEAD + self.key.len() + self.kind.value().map_or(0, |v| v.len())
    }
}

/// Result of looking a key up in the batch alone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchLookup {
    /// Latest indexed write is a put
    Found(Bytes),
    /// Latest indexed write is a delete
    Deleted,
    /// Batch holds no indexed write for the key
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SavePointMark {
    len: usize,
    data_size: usize,
}

/// Ordered write buffer with a read index
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    entries: Vec<BatchEntry>,
    index: BTreeMap<u32, BTreeMap<Vec<u8>, usize>>,
    save_points: SmallVec<[SavePointMark; 4]>,
    data_size: usize,
}

impl WriteBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer a put
    pub fn put(&mut self, cf: &ColumnFamily, key: &[u8], value: &[u8]) {
        self.push(cf, key, WriteKind::Put(Bytes::copy_from_slice(value)), true);
    }

    /// Buffer a delete
    pub fn delete(&mut self, cf: &ColumnFamily, key: &[u8]) {
        self.push(cf, key, WriteKind::Delete, true);
    }

    /// Buffer a single delete
    pub fn single_delete(&mut self, cf: &ColumnFamily, key: &[u8]) {
        self.push(cf, key, WriteKind::SingleDelete, true);
    }

    /// Buffer a write, optionally leaving it out of the read index
    pub fn push(&mut self, cf: &ColumnFamily, key: &[u8], kind: WriteKind, indexed: bool) {
        let entry = BatchEntry {
            column_family: cf.clone(),
            key: key.to_vec(),
            kind,
            indexed,
        };
        self.data_size += entry.size();
        if indexed {
            self.index
                .entry(cf.id())
                .or_default()
                .insert(entry.key.clone(), self.entries.len());
        }
        self.entries.push(entry);
    }

    /// Look a key up in the batch alone
    pub fn get_from_batch(&self, cf: &ColumnFamily, key: &[u8]) -> BatchLookup {
        match self.index.get(&cf.id()).and_then(|keys| keys.get(key)) {
            Some(&pos) => match &self.entries[pos].kind {
                WriteKind::Put(value) => BatchLookup::Found(value.clone()),
                WriteKind::Delete | WriteKind::SingleDelete => BatchLookup::Deleted,
            },
            None => BatchLookup::NotFound,
        }
    }

    /// Look a key up in the batch, falling back to the engine
    ///
    /// The engine read uses `options` as given; the batch always wins.
    pub fn get_from_batch_and_db(
        &self,
        db: &dyn KvEngine,
        options: &ReadOptions,
        cf: &ColumnFamily,
        key: &[u8],
    ) -> EngineResult<Bytes> {
        match self.get_from_batch(cf, key) {
            BatchLookup::Found(value) => Ok(value),
            BatchLookup::Deleted => Err(Status::not_found("deleted in write batch")),
            BatchLookup::NotFound => db.get(options, cf, key),
        }
    }

    /// Sorted indexed writes for one column family, bounded by `options`
    pub fn delta_entries(&self, cf: &ColumnFamily, options: &ReadOptions) -> DeltaEntries {
        let Some(keys) = self.index.get(&cf.id()) else {
            return DeltaEntries::new();
        };
        keys.iter()
            .take_while(|(key, _)| options.below_upper_bound(key))
            .map(|(key, &pos)| (key.clone(), self.entries[pos].kind.value().cloned()))
            .collect()
    }

    /// Layer the batch's writes for `cf` over `base`
    pub fn iterator_with_base<'a>(
        &self,
        cf: &ColumnFamily,
        base: Box<dyn KvIterator + 'a>,
        options: &ReadOptions,
    ) -> BaseDeltaIterator<'a> {
        BaseDeltaIterator::new(base, self.delta_entries(cf, options))
    }

    /// Record a save point at the current end of the batch
    pub fn set_save_point(&mut self) {
        self.save_points.push(SavePointMark {
            len: self.entries.len(),
            data_size: self.data_size,
        });
    }

    /// Discard every write made since the most recent save point
    ///
    /// Fails with `NotFound` when no save point is set.
    pub fn rollback_to_save_point(&mut self) -> EngineResult<()> {
        let mark = self
            .save_points
            .pop()
            .ok_or_else(|| Status::not_found("no save point set"))?;
        self.entries.truncate(mark.len);
        self.data_size = mark.data_size;
        self.rebuild_index();
        Ok(())
    }

    /// Forget the most recent save point without rolling back
    ///
    /// Fails with `NotFound` when no save point is set.
    pub fn pop_save_point(&mut self) -> EngineResult<()> {
        self.save_points
            .pop()
            .map(|_| ())
            .ok_or_else(|| Status::not_found("no save point set"))
    }

    /// Number of save points currently set
    pub fn save_point_count(&self) -> usize {
        self.save_points.len()
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (pos, entry) in self.entries.iter().enumerate() {
            if entry.indexed {
                self.index
                    .entry(entry.column_family.id())
                    .or_default()
                    .insert(entry.key.clone(), pos);
            }
        }
    }

    /// Buffered writes in arrival order
    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    /// Number of buffered writes
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Whether the batch holds no writes
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Approximate buffered bytes
    pub fn data_size(&self) -> usize {
        self.data_size
    }

    /// Drop all writes and save points
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.save_points.clear();
        self.data_size = 0;
    }
}
