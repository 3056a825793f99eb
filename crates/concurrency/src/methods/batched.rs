//! Batched access: writes into an overlay batch, reads merged with the
//! engine

use bytes::Bytes;
use strata_core::{
    check, ColumnFamily, Key, KvIterator, ReadOptions, Result, StatusHint, WriteBatch,
};

use super::{found, KvMethods, MethodsBase};
use crate::state::AccessMode;

/// Overlay batch merged over fresh engine reads
///
/// Point reads do not use the transaction snapshot: every read goes to the
/// latest committed engine state, with the overlay winning for keys it
/// holds. Nothing reaches the engine until the overlay is applied by
/// [`TransactionState::commit`](crate::TransactionState::commit).
pub struct BatchedMethods<'a> {
    base: MethodsBase<'a>,
    batch: &'a mut WriteBatch,
}

impl<'a> BatchedMethods<'a> {
    /// Batched strategy writing into `batch`
    pub fn new(base: MethodsBase<'a>, batch: &'a mut WriteBatch) -> Self {
        Self { base, batch }
    }

    /// Number of buffered writes
    pub fn pending_writes(&self) -> usize {
        self.batch.count()
    }
}

impl KvMethods for BatchedMethods<'_> {
    fn base(&self) -> &MethodsBase<'_> {
        &self.base
    }

    fn mode(&self) -> AccessMode {
        AccessMode::BatchedOverlay
    }

    fn exists(&self, cf: &ColumnFamily, key: &Key) -> Result<bool> {
        let options = ReadOptions::default();
        found(
            self.batch
                .get_from_batch_and_db(self.base.engine(), &options, cf, key.as_bytes()),
            "Exists - in BatchedMethods",
        )
    }

    fn get(&self, cf: &ColumnFamily, key: &Key) -> Result<Bytes> {
        let options = ReadOptions::default();
        check(
            self.batch
                .get_from_batch_and_db(self.base.engine(), &options, cf, key.as_bytes()),
            StatusHint::Document,
            "Get - in BatchedMethods",
        )
    }

    fn put(&mut self, cf: &ColumnFamily, key: &Key, value: &[u8], _hint: StatusHint) -> Result<()> {
        self.batch.put(cf, key.as_bytes(), value);
        Ok(())
    }

    fn delete(&mut self, cf: &ColumnFamily, key: &Key) -> Result<()> {
        self.batch.delete(cf, key.as_bytes());
        Ok(())
    }

    fn single_delete(&mut self, cf: &ColumnFamily, key: &Key) -> Result<()> {
        self.batch.single_delete(cf, key.as_bytes());
        Ok(())
    }

    fn new_iterator(&self, options: &ReadOptions, cf: &ColumnFamily) -> Box<dyn KvIterator + '_> {
        let base = self.base.engine().new_iterator(options, cf);
        Box::new(self.batch.iterator_with_base(cf, base, options))
    }
}
