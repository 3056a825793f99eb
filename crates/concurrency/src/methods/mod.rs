//! Access strategies
//!
//! Every transaction talks to the engine through exactly one strategy,
//! chosen by its [`AccessMode`](crate::AccessMode) when it begins:
//!
//! - [`ReadOnlyMethods`]: snapshot reads, writes fail with `ReadOnlyViolation`
//! - [`TrxMethods`]: reads and tracked writes through the engine transaction
//! - [`TrxUntrackedMethods`]: like `TrxMethods`, but writes skip conflict
//!   tracking
//! - [`BatchedMethods`]: writes go into an overlay batch, reads merge the
//!   overlay over a fresh engine read
//!
//! All four implement [`KvMethods`]. [`AccessMethods`] is the closed set
//! handed out by [`TransactionState::methods`](crate::TransactionState::methods);
//! it dereferences to `dyn KvMethods`, so call sites never match on the mode.

use std::ops::{Deref, DerefMut};

use bytes::Bytes;
use strata_core::{
    convert_status, ColumnFamily, EngineResult, Key, KeyBounds, KvEngine, KvIterator,
    ReadOptions, Result, SequenceNumber, Snapshot, StatusHint,
};

use crate::config::Hints;
use crate::state::AccessMode;

mod batched;
mod read_only;
mod trx;

pub use batched::BatchedMethods;
pub use read_only::ReadOnlyMethods;
pub use trx::{TrxMethods, TrxUntrackedMethods};

/// Transaction data every strategy reads from
#[derive(Clone, Copy)]
pub struct MethodsBase<'a> {
    engine: &'a dyn KvEngine,
    read_options: &'a ReadOptions,
    read_snapshot: Option<&'a Snapshot>,
    sequence_number: SequenceNumber,
    hints: Hints,
}

impl<'a> MethodsBase<'a> {
    /// Bundle the transaction data a strategy needs
    pub fn new(
        engine: &'a dyn KvEngine,
        read_options: &'a ReadOptions,
        read_snapshot: Option<&'a Snapshot>,
        sequence_number: SequenceNumber,
        hints: Hints,
    ) -> Self {
        Self {
            engine,
            read_options,
            read_snapshot,
            sequence_number,
            hints,
        }
    }

    /// Engine the transaction runs on
    pub fn engine(&self) -> &'a dyn KvEngine {
        self.engine
    }

    /// Read options of the transaction
    pub fn read_options(&self) -> &'a ReadOptions {
        self.read_options
    }

    /// Sequence number the transaction reads at
    pub fn sequence_number(&self) -> SequenceNumber {
        self.sequence_number
    }

    /// Hints of the transaction
    pub fn hints(&self) -> Hints {
        self.hints
    }

    /// Read options for iterators
    ///
    /// With intermediate commits enabled the transaction snapshot moves on
    /// every intermediate commit, so iterators read at the separate read
    /// snapshot pinned when the transaction began.
    pub fn iterator_read_options(&self) -> ReadOptions {
        let mut options = self.read_options.clone();
        if self.hints.contains(Hints::INTERMEDIATE_COMMITS) {
            if let Some(snapshot) = self.read_snapshot {
                options.snapshot = Some(snapshot.clone());
            }
        }
        options
    }
}

/// Fold a point read into an existence answer
///
/// "Not found" is `false`; every other failure is translated.
pub(crate) fn found(result: EngineResult<Bytes>, context: &str) -> Result<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(status) if status.is_not_found() => Ok(false),
        Err(status) => Err(convert_status(status, StatusHint::Document, context)),
    }
}

/// Uniform key-value contract of the access strategies
pub trait KvMethods {
    /// Shared transaction data
    fn base(&self) -> &MethodsBase<'_>;

    /// Mode this strategy implements
    fn mode(&self) -> AccessMode;

    /// Sequence number the transaction reads at
    fn sequence_number(&self) -> SequenceNumber {
        self.base().sequence_number()
    }

    /// Read options to build iterators with
    fn iterator_read_options(&self) -> ReadOptions {
        self.base().iterator_read_options()
    }

    /// Whether a live value is visible for `key`
    fn exists(&self, cf: &ColumnFamily, key: &Key) -> Result<bool>;

    /// Value of `key`, or `NotFound`
    ///
    /// The returned buffer shares memory with the engine or the overlay.
    fn get(&self, cf: &ColumnFamily, key: &Key) -> Result<Bytes>;

    /// Copy the value of `key` into `out`
    fn get_into(&self, cf: &ColumnFamily, key: &Key, out: &mut Vec<u8>) -> Result<()> {
        let value = self.get(cf, key)?;
        out.clear();
        out.extend_from_slice(&value);
        Ok(())
    }

    /// Write or overwrite `key`
    ///
    /// `hint` only shapes the error if the write fails.
    fn put(&mut self, cf: &ColumnFamily, key: &Key, value: &[u8], hint: StatusHint)
        -> Result<()>;

    /// Remove `key`
    fn delete(&mut self, cf: &ColumnFamily, key: &Key) -> Result<()>;

    /// Remove a key that was written at most once
    ///
    /// The caller must know the precondition holds.
    fn single_delete(&mut self, cf: &ColumnFamily, key: &Key) -> Result<()>;

    /// Range cursor over `cf` with this strategy's visibility
    fn new_iterator(&self, options: &ReadOptions, cf: &ColumnFamily) -> Box<dyn KvIterator + '_>;

    /// Push a save point
    fn set_save_point(&mut self) {}

    /// Undo every write since the last save point and pop it
    fn rollback_to_save_point(&mut self) -> Result<()> {
        Ok(())
    }

    /// Pop the last save point without undoing writes
    fn pop_save_point(&mut self) -> Result<()> {
        Ok(())
    }

    /// Stop indexing writes; returns whether the state changed
    fn disable_indexing(&mut self) -> bool {
        false
    }

    /// Resume indexing writes
    fn enable_indexing(&mut self) {}

    /// Count keys in `[start, end)` of `bounds`
    ///
    /// With `is_element_in_range` the scan stops at the first key found, so
    /// the result is 0 or 1.
    fn count_in_bounds(&self, bounds: &KeyBounds, is_element_in_range: bool) -> Result<usize> {
        let options = self.iterator_read_options();
        let mut iter = self.new_iterator(&options, bounds.column_family());
        iter.seek(bounds.start());
        let end = bounds.end();

        let mut count = 0;
        while iter.valid() && iter.key() < end {
            count += 1;
            if is_element_in_range {
                break;
            }
            iter.next();
        }
        iter.status()
            .map_err(|status| convert_status(status, StatusHint::None, "CountInBounds"))?;
        Ok(count)
    }
}

/// The strategy of one transaction
pub enum AccessMethods<'a> {
    /// Snapshot reads only
    ReadOnly(ReadOnlyMethods<'a>),
    /// Tracked transactional access
    Transactional(TrxMethods<'a>),
    /// Transactional access without conflict tracking
    TransactionalUntracked(TrxUntrackedMethods<'a>),
    /// Overlay batch merged over the engine
    BatchedOverlay(BatchedMethods<'a>),
}

impl<'a> Deref for AccessMethods<'a> {
    type Target = dyn KvMethods + 'a;

    fn deref(&self) -> &Self::Target {
        match self {
            AccessMethods::ReadOnly(m) => m,
            AccessMethods::Transactional(m) => m,
            AccessMethods::TransactionalUntracked(m) => m,
            AccessMethods::BatchedOverlay(m) => m,
        }
    }
}

impl<'a> DerefMut for AccessMethods<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            AccessMethods::ReadOnly(m) => m,
            AccessMethods::Transactional(m) => m,
            AccessMethods::TransactionalUntracked(m) => m,
            AccessMethods::BatchedOverlay(m) => m,
        }
    }
}
