//! Pinned snapshot bookkeeping
//!
//! A snapshot pins one sequence number until it is released. The tracker
//! only counts pins, so leaked snapshots show up in tests.
//!
//! # Design Notes
//!
//! - **Ids are unique**: two snapshots at the same sequence are tracked
//!   separately, so releasing one does not unpin the other
//! - **Release is idempotent**: releasing an unknown id is ignored

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use strata_core::{SequenceNumber, Snapshot};

/// Tracks pinned snapshots by id
#[derive(Debug)]
pub struct SnapshotTracker {
    next_id: AtomicU64,
    pinned: Mutex<BTreeMap<u64, SequenceNumber>>,
}

impl SnapshotTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            pinned: Mutex::new(BTreeMap::new()),
        }
    }

    /// Pin `sequence` and hand out a snapshot for it
    pub fn pin(&self, sequence: SequenceNumber) -> Snapshot {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.pinned.lock().insert(id, sequence);
        Snapshot::new(id, sequence)
    }

    /// Unpin a snapshot
    pub fn release(&self, snapshot: &Snapshot) {
        self.pinned.lock().remove(&snapshot.id());
    }

    /// Number of snapshots currently pinned
    pub fn pinned_count(&self) -> usize {
        self.pinned.lock().len()
    }
}

impl Default for SnapshotTracker {
    fn default() -> Self {
        Self::new()
    }
}
