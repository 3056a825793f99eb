//! Per-transaction state
//!
//! `TransactionState` owns everything one logical transaction needs:
//! - the engine handle and the pinned snapshot(s)
//! - the backing of its access strategy (engine transaction or overlay)
//! - operation counters and the buffered size
//! - intermediate commit bookkeeping
//!
//! # Design Notes
//!
//! The strategy handed out by [`TransactionState::methods`] borrows disjoint
//! fields of the state, so callers (and the save point guard) hold one
//! exclusive borrow for the duration of an operation. Snapshots are released
//! exactly once, on commit, abort or drop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use strata_core::{
    check, EngineTransaction, Error, ErrorCode, KvEngine, ReadOptions, Result, SequenceNumber,
    Snapshot, StatusHint, WriteBatch,
};
use tracing::{debug, error, info, warn};

use crate::config::{Hints, TransactionOptions};
use crate::methods::{
    AccessMethods, BatchedMethods, MethodsBase, ReadOnlyMethods, TrxMethods, TrxUntrackedMethods,
};

static NEXT_TRANSACTION_ID: AtomicU64 = AtomicU64::new(1);

/// How a transaction reaches the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Snapshot reads, writes rejected
    ReadOnly,
    /// Engine transaction with conflict-tracked writes
    Transactional,
    /// Engine transaction whose writes skip conflict tracking
    TransactionalUntracked,
    /// Writes buffered in an overlay batch, applied on commit
    BatchedOverlay,
}

/// Kind of a logical operation, for counter bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// New document
    Insert,
    /// Partial modification
    Update,
    /// Full replacement
    Replace,
    /// Removal
    Remove,
}

/// Operation counters of one transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationCounters {
    /// Inserts performed
    pub inserts: u64,
    /// Updates and replaces performed
    pub updates: u64,
    /// Removals performed
    pub removes: u64,
}

impl OperationCounters {
    fn slot(&mut self, kind: OperationKind) -> &mut u64 {
        match kind {
            OperationKind::Insert => &mut self.inserts,
            OperationKind::Update | OperationKind::Replace => &mut self.updates,
            OperationKind::Remove => &mut self.removes,
        }
    }
}

enum Backing {
    ReadOnly,
    Transaction {
        trx: Box<dyn EngineTransaction>,
        indexing_disabled: bool,
        untracked: bool,
    },
    Overlay(WriteBatch),
}

/// State of one logical transaction
pub struct TransactionState {
    id: u64,
    engine: Arc<dyn KvEngine>,
    hints: Hints,
    options: TransactionOptions,
    read_options: ReadOptions,
    snapshot: Option<Snapshot>,
    /// Pinned at begin for iterators when intermediate commits are enabled
    read_snapshot: Option<Snapshot>,
    sequence_number: SequenceNumber,
    backing: Backing,
    counters: OperationCounters,
    transaction_size: u64,
    operations_since_commit: u64,
    /// Successful `add_operation` calls over the whole transaction
    operations_recorded: u64,
    num_intermediate_commits: u64,
    finished: bool,
}

impl TransactionState {
    /// Begin a transaction on `engine`
    ///
    /// Every mode except `BatchedOverlay` pins a snapshot; the batched mode
    /// reads the latest committed state.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `options` fail validation.
    pub fn begin(
        engine: Arc<dyn KvEngine>,
        mode: AccessMode,
        hints: Hints,
        options: TransactionOptions,
    ) -> Result<Self> {
        options.validate()?;

        let id = NEXT_TRANSACTION_ID.fetch_add(1, Ordering::Relaxed);
        let (snapshot, read_options, sequence_number) = match mode {
            AccessMode::BatchedOverlay => {
                (None, ReadOptions::default(), engine.latest_sequence_number())
            }
            _ => {
                let snapshot = engine.snapshot();
                let sequence = snapshot.sequence();
                (
                    Some(snapshot.clone()),
                    ReadOptions::with_snapshot(snapshot),
                    sequence,
                )
            }
        };
        let read_snapshot = if hints.contains(Hints::INTERMEDIATE_COMMITS)
            && mode != AccessMode::BatchedOverlay
        {
            Some(engine.snapshot())
        } else {
            None
        };

        let backing = match (mode, &snapshot) {
            (AccessMode::ReadOnly, _) => Backing::ReadOnly,
            (AccessMode::BatchedOverlay, _) => Backing::Overlay(WriteBatch::new()),
            (AccessMode::Transactional | AccessMode::TransactionalUntracked, Some(snapshot)) => {
                Backing::Transaction {
                    trx: engine.begin_transaction(snapshot.clone()),
                    indexing_disabled: false,
                    untracked: mode == AccessMode::TransactionalUntracked,
                }
            }
            (AccessMode::Transactional | AccessMode::TransactionalUntracked, None) => {
                return Err(Error::storage(
                    ErrorCode::Internal,
                    "transactional mode started without a snapshot",
                ))
            }
        };

        debug!(
            target: "strata::txn",
            txn_id = id,
            ?mode,
            ?hints,
            sequence = sequence_number,
            "Transaction started"
        );

        Ok(Self {
            id,
            engine,
            hints,
            options,
            read_options,
            snapshot,
            read_snapshot,
            sequence_number,
            backing,
            counters: OperationCounters::default(),
            transaction_size: 0,
            operations_since_commit: 0,
            operations_recorded: 0,
            num_intermediate_commits: 0,
            finished: false,
        })
    }

    /// Access strategy of this transaction
    pub fn methods(&mut self) -> AccessMethods<'_> {
        let base = MethodsBase::new(
            self.engine.as_ref(),
            &self.read_options,
            self.read_snapshot.as_ref(),
            self.sequence_number,
            self.hints,
        );
        match &mut self.backing {
            Backing::ReadOnly => AccessMethods::ReadOnly(ReadOnlyMethods::new(base)),
            Backing::Transaction {
                trx,
                indexing_disabled,
                untracked,
            } => {
                let untracked = *untracked;
                let methods = TrxMethods::new(base, trx.as_mut(), indexing_disabled);
                if untracked {
                    AccessMethods::TransactionalUntracked(TrxUntrackedMethods::new(methods))
                } else {
                    AccessMethods::Transactional(methods)
                }
            }
            Backing::Overlay(batch) => {
                AccessMethods::BatchedOverlay(BatchedMethods::new(base, batch))
            }
        }
    }

    /// Read-only view over the transaction snapshot
    ///
    /// Usable from shared references regardless of the mode.
    pub fn read_only_methods(&self) -> ReadOnlyMethods<'_> {
        ReadOnlyMethods::new(MethodsBase::new(
            self.engine.as_ref(),
            &self.read_options,
            self.read_snapshot.as_ref(),
            self.sequence_number,
            self.hints,
        ))
    }

    /// Record a performed operation of `size` buffered bytes
    ///
    /// Returns whether an intermediate commit happened as a result.
    ///
    /// # Errors
    ///
    /// - `ReadOnlyViolation` on a read-only transaction
    /// - `Storage(ResourceLimit)` if the transaction would exceed
    ///   `max_transaction_size`
    /// - any error of the intermediate commit itself
    pub fn add_operation(&mut self, kind: OperationKind, size: u64) -> Result<bool> {
        if matches!(self.backing, Backing::ReadOnly) {
            error!(
                target: "strata::txn",
                txn_id = self.id,
                ?kind,
                "Operation recorded on a read-only transaction"
            );
            return Err(Error::ReadOnlyViolation);
        }

        let new_size = self.transaction_size.saturating_add(size);
        if new_size > self.options.max_transaction_size {
            return Err(Error::storage(
                ErrorCode::ResourceLimit,
                format!(
                    "maximal transaction size limit of {} bytes reached",
                    self.options.max_transaction_size
                ),
            ));
        }

        *self.counters.slot(kind) += 1;
        self.transaction_size = new_size;
        self.operations_since_commit += 1;
        self.operations_recorded += 1;

        if self.needs_intermediate_commit() {
            self.intermediate_commit()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Number of operations counted so far
    ///
    /// Never decreases, not even across intermediate commits or rollbacks.
    pub fn operations_recorded(&self) -> u64 {
        self.operations_recorded
    }

    /// Undo the counter bookkeeping of one operation of `kind`
    pub fn rollback_operation(&mut self, kind: OperationKind) {
        let slot = self.counters.slot(kind);
        *slot = slot.saturating_sub(1);
        self.operations_since_commit = self.operations_since_commit.saturating_sub(1);
    }

    fn needs_intermediate_commit(&self) -> bool {
        if !self.hints.contains(Hints::INTERMEDIATE_COMMITS) {
            return false;
        }
        match &self.backing {
            Backing::Transaction { trx, .. } => {
                trx.data_size() as u64 >= self.options.intermediate_commit_size
                    || self.operations_since_commit >= self.options.intermediate_commit_count
            }
            _ => false,
        }
    }

    fn intermediate_commit(&mut self) -> Result<()> {
        let Backing::Transaction {
            trx,
            indexing_disabled,
            ..
        } = &mut self.backing
        else {
            return Ok(());
        };

        let committed = check(trx.commit(), StatusHint::None, "Intermediate commit")?;

        if let Some(old) = self.snapshot.take() {
            self.engine.release_snapshot(&old);
        }
        let snapshot = self.engine.snapshot();
        *trx = self.engine.begin_transaction(snapshot.clone());
        if *indexing_disabled {
            trx.disable_indexing();
        }

        self.sequence_number = snapshot.sequence();
        self.read_options.snapshot = Some(snapshot.clone());
        self.snapshot = Some(snapshot);
        self.num_intermediate_commits += 1;
        self.transaction_size = 0;
        self.operations_since_commit = 0;

        debug!(
            target: "strata::txn",
            txn_id = self.id,
            sequence = committed,
            count = self.num_intermediate_commits,
            "Intermediate commit"
        );
        Ok(())
    }

    /// Commit the transaction
    ///
    /// Read-only transactions return their snapshot sequence number, batched
    /// ones apply the overlay atomically.
    ///
    /// # Errors
    ///
    /// Any engine failure, translated. The transaction is aborted when the
    /// error is returned.
    pub fn commit(mut self) -> Result<SequenceNumber> {
        let result = match &mut self.backing {
            Backing::ReadOnly => Ok(self.sequence_number),
            Backing::Transaction { trx, .. } => {
                check(trx.commit(), StatusHint::None, "Commit - in TransactionState")
            }
            Backing::Overlay(batch) => check(
                self.engine.write(batch),
                StatusHint::None,
                "Commit - in TransactionState",
            ),
        };

        match result {
            Ok(sequence) => {
                self.finished = true;
                self.release_snapshots();
                info!(
                    target: "strata::txn",
                    txn_id = self.id,
                    sequence,
                    "Transaction committed"
                );
                Ok(sequence)
            }
            Err(e) => {
                warn!(target: "strata::txn", txn_id = self.id, error = %e, "Transaction aborted");
                Err(e)
            }
        }
    }

    /// Discard every buffered write
    pub fn abort(mut self) {
        self.rollback_in_place();
    }

    fn rollback_in_place(&mut self) {
        match &mut self.backing {
            Backing::ReadOnly => {}
            Backing::Transaction { trx, .. } => trx.rollback(),
            Backing::Overlay(batch) => batch.clear(),
        }
        self.finished = true;
        self.release_snapshots();
        debug!(target: "strata::txn", txn_id = self.id, "Transaction rolled back");
    }

    fn release_snapshots(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.engine.release_snapshot(&snapshot);
        }
        if let Some(snapshot) = self.read_snapshot.take() {
            self.engine.release_snapshot(&snapshot);
        }
    }

    /// Process-unique transaction id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Access mode chosen at begin
    pub fn mode(&self) -> AccessMode {
        match &self.backing {
            Backing::ReadOnly => AccessMode::ReadOnly,
            Backing::Transaction { untracked: false, .. } => AccessMode::Transactional,
            Backing::Transaction { untracked: true, .. } => AccessMode::TransactionalUntracked,
            Backing::Overlay(_) => AccessMode::BatchedOverlay,
        }
    }

    /// Hints of the transaction
    pub fn hints(&self) -> Hints {
        self.hints
    }

    /// Size limits of the transaction
    pub fn options(&self) -> &TransactionOptions {
        &self.options
    }

    /// Operation counters
    pub fn counters(&self) -> OperationCounters {
        self.counters
    }

    /// Sequence number the transaction currently reads at
    pub fn sequence_number(&self) -> SequenceNumber {
        self.sequence_number
    }

    /// Intermediate commits performed so far
    pub fn num_intermediate_commits(&self) -> u64 {
        self.num_intermediate_commits
    }

    /// Whether the transaction wraps a single auto-committing operation
    pub fn is_single_operation_transaction(&self) -> bool {
        self.hints.contains(Hints::SINGLE_OPERATION)
    }

    /// Bytes recorded through `add_operation` since the last (intermediate)
    /// commit
    pub fn buffered_size(&self) -> u64 {
        self.transaction_size
    }
}

impl Drop for TransactionState {
    fn drop(&mut self) {
        if !self.finished {
            self.rollback_in_place();
        }
    }
}

impl std::fmt::Debug for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionState")
            .field("id", &self.id)
            .field("mode", &self.mode())
            .field("hints", &self.hints)
            .field("sequence_number", &self.sequence_number)
            .field("counters", &self.counters)
            .field("finished", &self.finished)
            .finish()
    }
}
