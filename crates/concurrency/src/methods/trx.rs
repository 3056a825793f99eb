//! Transactional access through the live engine transaction

use bytes::Bytes;
use strata_core::{
    check, ColumnFamily, EngineTransaction, Key, KvIterator, ReadOptions, Result, StatusHint,
};

use super::{found, KvMethods, MethodsBase};
use crate::state::AccessMode;

/// Reads and tracked writes through the engine transaction
///
/// Reads observe the transaction's own indexed writes layered over its
/// snapshot. Writes are conflict-checked when the transaction commits.
pub struct TrxMethods<'a> {
    base: MethodsBase<'a>,
    trx: &'a mut dyn EngineTransaction,
    /// Lives in the transaction state so the toggle survives across
    /// strategy handles
    indexing_disabled: &'a mut bool,
}

impl<'a> TrxMethods<'a> {
    /// Transactional strategy over `trx`
    pub fn new(
        base: MethodsBase<'a>,
        trx: &'a mut dyn EngineTransaction,
        indexing_disabled: &'a mut bool,
    ) -> Self {
        Self {
            base,
            trx,
            indexing_disabled,
        }
    }

    /// Whether indexing is currently disabled
    pub fn indexing_disabled(&self) -> bool {
        *self.indexing_disabled
    }
}

impl KvMethods for TrxMethods<'_> {
    fn base(&self) -> &MethodsBase<'_> {
        &self.base
    }

    fn mode(&self) -> AccessMode {
        AccessMode::Transactional
    }

    fn exists(&self, cf: &ColumnFamily, key: &Key) -> Result<bool> {
        found(
            self.trx.get(self.base.read_options(), cf, key.as_bytes()),
            "Exists - in TrxMethods",
        )
    }

    fn get(&self, cf: &ColumnFamily, key: &Key) -> Result<Bytes> {
        check(
            self.trx.get(self.base.read_options(), cf, key.as_bytes()),
            StatusHint::Document,
            "Get - in TrxMethods",
        )
    }

    fn put(&mut self, cf: &ColumnFamily, key: &Key, value: &[u8], hint: StatusHint) -> Result<()> {
        check(self.trx.put(cf, key.as_bytes(), value), hint, "Put - in TrxMethods")
    }

    fn delete(&mut self, cf: &ColumnFamily, key: &Key) -> Result<()> {
        check(
            self.trx.delete(cf, key.as_bytes()),
            StatusHint::None,
            "Delete - in TrxMethods",
        )
    }

    fn single_delete(&mut self, cf: &ColumnFamily, key: &Key) -> Result<()> {
        check(
            self.trx.single_delete(cf, key.as_bytes()),
            StatusHint::None,
            "SingleDelete - in TrxMethods",
        )
    }

    fn new_iterator(&self, options: &ReadOptions, cf: &ColumnFamily) -> Box<dyn KvIterator + '_> {
        self.trx.iterator(options, cf)
    }

    fn set_save_point(&mut self) {
        self.trx.set_save_point();
    }

    fn rollback_to_save_point(&mut self) -> Result<()> {
        check(
            self.trx.rollback_to_save_point(),
            StatusHint::None,
            "RollbackToSavePoint - in TrxMethods",
        )
    }

    fn pop_save_point(&mut self) -> Result<()> {
        check(
            self.trx.pop_save_point(),
            StatusHint::None,
            "PopSavePoint - in TrxMethods",
        )
    }

    fn disable_indexing(&mut self) -> bool {
        if *self.indexing_disabled {
            return false;
        }
        self.trx.disable_indexing();
        *self.indexing_disabled = true;
        true
    }

    fn enable_indexing(&mut self) {
        if *self.indexing_disabled {
            self.trx.enable_indexing();
            *self.indexing_disabled = false;
        }
    }
}

/// Transactional access whose writes skip conflict tracking
///
/// Used for internal metadata writes. Reads, iterators, save points and the
/// indexing toggle behave exactly like [`TrxMethods`].
pub struct TrxUntrackedMethods<'a> {
    inner: TrxMethods<'a>,
}

impl<'a> TrxUntrackedMethods<'a> {
    /// Untracked strategy wrapping `inner`
    pub fn new(inner: TrxMethods<'a>) -> Self {
        Self { inner }
    }
}

impl KvMethods for TrxUntrackedMethods<'_> {
    fn base(&self) -> &MethodsBase<'_> {
        self.inner.base()
    }

    fn mode(&self) -> AccessMode {
        AccessMode::TransactionalUntracked
    }

    fn exists(&self, cf: &ColumnFamily, key: &Key) -> Result<bool> {
        self.inner.exists(cf, key)
    }

    fn get(&self, cf: &ColumnFamily, key: &Key) -> Result<Bytes> {
        self.inner.get(cf, key)
    }

    fn put(&mut self, cf: &ColumnFamily, key: &Key, value: &[u8], hint: StatusHint) -> Result<()> {
        check(
            self.inner.trx.put_untracked(cf, key.as_bytes(), value),
            hint,
            "Put - in TrxUntrackedMethods",
        )
    }

    fn delete(&mut self, cf: &ColumnFamily, key: &Key) -> Result<()> {
        check(
            self.inner.trx.delete_untracked(cf, key.as_bytes()),
            StatusHint::None,
            "Delete - in TrxUntrackedMethods",
        )
    }

    fn single_delete(&mut self, cf: &ColumnFamily, key: &Key) -> Result<()> {
        check(
            self.inner.trx.single_delete_untracked(cf, key.as_bytes()),
            StatusHint::None,
            "SingleDelete - in TrxUntrackedMethods",
        )
    }

    fn new_iterator(&self, options: &ReadOptions, cf: &ColumnFamily) -> Box<dyn KvIterator + '_> {
        self.inner.new_iterator(options, cf)
    }

    fn set_save_point(&mut self) {
        self.inner.set_save_point();
    }

    fn rollback_to_save_point(&mut self) -> Result<()> {
        self.inner.rollback_to_save_point()
    }

    fn pop_save_point(&mut self) -> Result<()> {
        self.inner.pop_save_point()
    }

    fn disable_indexing(&mut self) -> bool {
        self.inner.disable_indexing()
    }

    fn enable_indexing(&mut self) {
        self.inner.enable_indexing();
    }
}
