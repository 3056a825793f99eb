//! Scoped save point guard
//!
//! A `SavePoint` brackets one logical operation. Creating it pushes a save
//! point on the transaction; the caller then either calls
//! [`SavePoint::finish`] once the operation succeeded or
//! [`SavePoint::rollback`] to undo it. A guard dropped without either rolls
//! back implicitly.
//!
//! ```text
//!   new() ──┬── single operation ──────────────► Handled
//!           └── set_save_point ──► Created ──┬─ finish()   ──► Handled
//!                                            ├─ rollback() ──► Handled
//!                                            └─ drop       ──► rollback, Handled
//! ```
//!
//! # Design Notes
//!
//! The guard holds the transaction state exclusively, so a second unhandled
//! guard on the same transaction cannot exist at the same time and save
//! points stay strictly LIFO.

use std::panic::{catch_unwind, AssertUnwindSafe};

use strata_core::Result;
use tracing::{error, warn};

use crate::methods::AccessMethods;
use crate::state::{OperationKind, TransactionState};

/// Save point covering one operation of a transaction
pub struct SavePoint<'a> {
    state: &'a mut TransactionState,
    operation: OperationKind,
    /// `operations_recorded` of the state when the guard was opened
    recorded_at: u64,
    handled: bool,
}

impl<'a> SavePoint<'a> {
    /// Open a save point for an operation of kind `operation`
    ///
    /// Single-operation transactions need no save point: the whole
    /// transaction is rolled back on failure, so the guard starts out
    /// handled.
    pub fn new(state: &'a mut TransactionState, operation: OperationKind) -> Self {
        let handled = state.is_single_operation_transaction();
        if !handled {
            state.methods().set_save_point();
        }
        let recorded_at = state.operations_recorded();
        Self {
            state,
            operation,
            recorded_at,
            handled,
        }
    }

    /// Strategy of the guarded transaction
    pub fn methods(&mut self) -> AccessMethods<'_> {
        self.state.methods()
    }

    /// The guarded transaction
    pub fn state(&self) -> &TransactionState {
        self.state
    }

    /// The guarded transaction, mutably
    pub fn state_mut(&mut self) -> &mut TransactionState {
        self.state
    }

    /// Operation kind the guard reverts on rollback
    pub fn operation(&self) -> OperationKind {
        self.operation
    }

    /// Whether the guard was finished or rolled back
    pub fn is_handled(&self) -> bool {
        self.handled
    }

    /// Keep the operation's effects
    ///
    /// An intermediate commit already dropped every save point of the
    /// engine transaction, so nothing is popped in that case.
    pub fn finish(&mut self, intermediate_commit: bool) {
        if !self.handled && !intermediate_commit {
            if let Err(e) = self.state.methods().pop_save_point() {
                warn!(
                    target: "strata::savepoint",
                    txn_id = self.state.id(),
                    error = %e,
                    "Failed to pop save point"
                );
            }
        }
        self.handled = true;
    }

    /// Whether the operation reached the counters through `add_operation`
    pub fn is_recorded(&self) -> bool {
        self.state.operations_recorded() > self.recorded_at
    }

    /// Undo the operation's effects and counters
    ///
    /// Counters are only reverted if the operation was recorded, and then
    /// even if the engine rollback fails; the engine error is returned
    /// afterwards.
    pub fn rollback(&mut self) -> Result<()> {
        if self.handled {
            return Ok(());
        }
        self.handled = true;

        let result = self.state.methods().rollback_to_save_point();
        if self.is_recorded() {
            self.state.rollback_operation(self.operation);
        }
        result
    }
}

impl Drop for SavePoint<'_> {
    fn drop(&mut self) {
        if self.handled {
            return;
        }
        match catch_unwind(AssertUnwindSafe(|| self.rollback())) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(
                    target: "strata::savepoint",
                    error = %e,
                    "Caught error during rollback to save point"
                );
            }
            Err(_) => {
                error!(
                    target: "strata::savepoint",
                    "Caught panic during rollback to save point"
                );
            }
        }
    }
}
