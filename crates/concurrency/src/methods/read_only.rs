//! Read-only access: snapshot reads straight from the engine

use bytes::Bytes;
use strata_core::{
    check, ColumnFamily, Error, Key, KvIterator, MayExist, ReadOptions, Result, StatusHint,
};
use tracing::error;

use super::{found, KvMethods, MethodsBase};
use crate::state::AccessMode;

/// Snapshot reads, no writes
///
/// Holds only shared borrows, so one instance can be shared across
/// threads reading the same snapshot.
#[derive(Clone, Copy)]
pub struct ReadOnlyMethods<'a> {
    base: MethodsBase<'a>,
}

impl<'a> ReadOnlyMethods<'a> {
    /// Read-only strategy over `base`
    pub fn new(base: MethodsBase<'a>) -> Self {
        Self { base }
    }

    fn reject(&self, operation: &'static str, cf: &ColumnFamily) -> Error {
        error!(
            target: "strata::methods",
            operation,
            cf = %cf,
            "Write attempted through read-only access methods"
        );
        Error::ReadOnlyViolation
    }
}

impl KvMethods for ReadOnlyMethods<'_> {
    fn base(&self) -> &MethodsBase<'_> {
        &self.base
    }

    fn mode(&self) -> AccessMode {
        AccessMode::ReadOnly
    }

    fn exists(&self, cf: &ColumnFamily, key: &Key) -> Result<bool> {
        let engine = self.base.engine();
        let options = self.base.read_options();
        match engine.key_may_exist(options, cf, key.as_bytes()) {
            MayExist::Found(_) => Ok(true),
            MayExist::No => Ok(false),
            MayExist::Maybe => found(
                engine.get(options, cf, key.as_bytes()),
                "Exists - in ReadOnlyMethods",
            ),
        }
    }

    fn get(&self, cf: &ColumnFamily, key: &Key) -> Result<Bytes> {
        let options = self.base.read_options();
        check(
            self.base.engine().get(options, cf, key.as_bytes()),
            StatusHint::Document,
            "Get - in ReadOnlyMethods",
        )
    }

    fn put(
        &mut self,
        cf: &ColumnFamily,
        _key: &Key,
        _value: &[u8],
        _hint: StatusHint,
    ) -> Result<()> {
        Err(self.reject("put", cf))
    }

    fn delete(&mut self, cf: &ColumnFamily, _key: &Key) -> Result<()> {
        Err(self.reject("delete", cf))
    }

    fn single_delete(&mut self, cf: &ColumnFamily, _key: &Key) -> Result<()> {
        Err(self.reject("single_delete", cf))
    }

    fn new_iterator(&self, options: &ReadOptions, cf: &ColumnFamily) -> Box<dyn KvIterator + '_> {
        self.base.engine().new_iterator(options, cf)
    }
}
