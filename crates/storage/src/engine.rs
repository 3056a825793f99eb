//! MemoryEngine: in-memory multi-version engine
//!
//! This is the reference [`KvEngine`] the access layer runs against in tests
//! and embedded use. It behaves like an LSM engine from the caller's point
//! of view:
//!
//! - every applied batch gets one new sequence number
//! - snapshots pin a sequence and see exactly the batches at or below it
//! - `key_may_exist` is a bloom probe (false positives, no false negatives)
//! - transactions buffer writes and validate tracked keys at commit
//!
//! # Atomicity
//!
//! Batches are applied under a single write lock acquisition and the
//! sequence counter is published while the lock is still held, so no reader
//! can observe a partial batch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use strata_core::{
    ColumnFamily, EngineResult, EngineTransaction, KvEngine, KvIterator, MayExist, ReadOptions,
    SequenceNumber, Snapshot, Status, VecIterator, WriteBatch,
};
use tracing::debug;

use crate::memtable::MemTable;
use crate::registry::ColumnFamilyRegistry;
use crate::snapshot::SnapshotTracker;
use crate::transaction::MemoryTransaction;

/// Key written by a transaction that must not have changed since its
/// snapshot
pub(crate) type TrackedKey = (ColumnFamily, Vec<u8>);

/// Shared engine state
#[derive(Debug)]
pub(crate) struct EngineInner {
    registry: ColumnFamilyRegistry,
    tables: RwLock<FxHashMap<u32, MemTable>>,
    sequence: AtomicU64,
    snapshots: SnapshotTracker,
}

fn unknown_column_family(cf: &ColumnFamily) -> Status {
    Status::invalid_argument(format!("unknown column family {}", cf))
}

impl EngineInner {
    fn new() -> Self {
        let registry = ColumnFamilyRegistry::new();
        let mut tables = FxHashMap::default();
        tables.insert(registry.default_family().id(), MemTable::new());
        Self {
            registry,
            tables: RwLock::new(tables),
            sequence: AtomicU64::new(0),
            snapshots: SnapshotTracker::new(),
        }
    }

    pub(crate) fn latest(&self) -> SequenceNumber {
        self.sequence.load(Ordering::Acquire)
    }

    pub(crate) fn check_column_family(&self, cf: &ColumnFamily) -> EngineResult<()> {
        if self.registry.contains(cf) {
            Ok(())
        } else {
            Err(unknown_column_family(cf))
        }
    }

    fn read_sequence(&self, options: &ReadOptions) -> SequenceNumber {
        options.sequence().unwrap_or_else(|| self.latest())
    }

    pub(crate) fn get(
        &self,
        options: &ReadOptions,
        cf: &ColumnFamily,
        key: &[u8],
    ) -> EngineResult<Bytes> {
        self.check_column_family(cf)?;
        let tables = self.tables.read();
        let table = tables.get(&cf.id()).ok_or_else(|| unknown_column_family(cf))?;
        table
            .get(key, self.read_sequence(options))
            .ok_or_else(|| Status::not_found(""))
    }

    pub(crate) fn iterator(&self, options: &ReadOptions, cf: &ColumnFamily) -> Box<dyn KvIterator> {
        if let Err(status) = self.check_column_family(cf) {
            return Box::new(FailedIterator { status });
        }
        let tables = self.tables.read();
        match tables.get(&cf.id()) {
            Some(table) => Box::new(VecIterator::new(
                table.scan(self.read_sequence(options), options),
            )),
            None => Box::new(FailedIterator {
                status: unknown_column_family(cf),
            }),
        }
    }

    /// Validate `tracked` against `read_sequence` and apply `batch`
    ///
    /// Validation and application happen under the same write lock, so a
    /// concurrent commit cannot slip in between.
    pub(crate) fn commit(
        &self,
        batch: &WriteBatch,
        tracked: &[TrackedKey],
        read_sequence: SequenceNumber,
    ) -> EngineResult<SequenceNumber> {
        let mut tables = self.tables.write();

        for (cf, key) in tracked {
            let table = tables.get(&cf.id()).ok_or_else(|| unknown_column_family(cf))?;
            if let Some(latest) = table.latest_sequence(key) {
                if latest > read_sequence {
                    debug!(
                        target: "strata::storage",
                        cf = %cf,
                        latest,
                        read_sequence,
                        "Write-write conflict"
                    );
                    return Err(Status::busy(format!(
                        "write-write conflict in column family {}",
                        cf
                    )));
                }
            }
        }

        if batch.is_empty() {
            return Ok(self.latest());
        }

        for entry in batch.entries() {
            if !self.registry.contains(&entry.column_family)
                || !tables.contains_key(&entry.column_family.id())
            {
                return Err(unknown_column_family(&entry.column_family));
            }
        }

        let sequence = self.latest() + 1;
        for entry in batch.entries() {
            if let Some(table) = tables.get_mut(&entry.column_family.id()) {
                table.apply(&entry.key, sequence, entry.kind.value().cloned());
            }
        }
        self.sequence.store(sequence, Ordering::Release);
        Ok(sequence)
    }
}

/// Cursor returned when the iterator could not be created
///
/// Never valid; reports the failure through `status`.
struct FailedIterator {
    status: Status,
}

impl KvIterator for FailedIterator {
    fn valid(&self) -> bool {
        false
    }

    fn seek_to_first(&mut self) {}

    fn seek(&mut self, _target: &[u8]) {}

    fn next(&mut self) {}

    fn key(&self) -> &[u8] {
        &[]
    }

    fn value(&self) -> &[u8] {
        &[]
    }

    fn status(&self) -> Result<(), Status> {
        Err(self.status.clone())
    }
}

/// In-memory multi-version key-value engine
///
/// Cloning is cheap and yields another handle on the same data.
///
/// # Example
///
/// ```ignore
/// let engine = MemoryEngine::new();
/// let cf = engine.create_column_family("documents");
///
/// let mut batch = WriteBatch::new();
/// batch.put(&cf, b"k1", b"v1");
/// engine.write(&batch)?;
///
/// let value = engine.get(&ReadOptions::default(), &cf, b"k1")?;
/// ```
#[derive(Debug, Clone)]
pub struct MemoryEngine {
    inner: Arc<EngineInner>,
}

impl MemoryEngine {
    /// Create an empty engine with only the default column family
    pub fn new() -> Self {
        Self {
            inner: Arc::new(EngineInner::new()),
        }
    }

    /// Register a column family, returning the existing one if present
    pub fn create_column_family(&self, name: &str) -> ColumnFamily {
        let cf = self.inner.registry.create(name);
        self.inner
            .tables
            .write()
            .entry(cf.id())
            .or_insert_with(MemTable::new);
        cf
    }

    /// Look a column family up by name
    pub fn column_family(&self, name: &str) -> Option<ColumnFamily> {
        self.inner.registry.get(name)
    }

    /// The default column family
    pub fn default_column_family(&self) -> ColumnFamily {
        self.inner.registry.default_family()
    }

    /// All column families in id order
    pub fn column_families(&self) -> Vec<ColumnFamily> {
        self.inner.registry.list()
    }

    /// Number of currently pinned snapshots
    pub fn pinned_snapshots(&self) -> usize {
        self.inner.snapshots.pinned_count()
    }

    #[cfg(test)]
    pub(crate) fn inner(&self) -> &Arc<EngineInner> {
        &self.inner
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl KvEngine for MemoryEngine {
    fn get(&self, options: &ReadOptions, cf: &ColumnFamily, key: &[u8]) -> EngineResult<Bytes> {
        self.inner.get(options, cf, key)
    }

    fn key_may_exist(&self, _options: &ReadOptions, cf: &ColumnFamily, key: &[u8]) -> MayExist {
        let tables = self.inner.tables.read();
        match tables.get(&cf.id()) {
            Some(table) if table.may_contain(key) => MayExist::Maybe,
            Some(_) => MayExist::No,
            // let the authoritative read report the bad column family
            None => MayExist::Maybe,
        }
    }

    fn new_iterator<'a>(
        &'a self,
        options: &ReadOptions,
        cf: &ColumnFamily,
    ) -> Box<dyn KvIterator + 'a> {
        self.inner.iterator(options, cf)
    }

    fn write(&self, batch: &WriteBatch) -> EngineResult<SequenceNumber> {
        self.inner.commit(batch, &[], self.inner.latest())
    }

    fn snapshot(&self) -> Snapshot {
        // Hold the read lock while sampling the sequence so a batch cannot be
        // half-visible relative to the pinned number.
        let _tables = self.inner.tables.read();
        self.inner.snapshots.pin(self.inner.latest())
    }

    fn release_snapshot(&self, snapshot: &Snapshot) {
        self.inner.snapshots.release(snapshot);
    }

    fn latest_sequence_number(&self) -> SequenceNumber {
        self.inner.latest()
    }

    fn begin_transaction(&self, snapshot: Snapshot) -> Box<dyn EngineTransaction> {
        Box::new(MemoryTransaction::new(Arc::clone(&self.inner), snapshot))
    }
}
