//! Read options and snapshot handles
//!
//! A `Snapshot` pins one engine sequence number. Reads carrying a snapshot
//! observe exactly the batches committed at or before that sequence.

use crate::types::{Key, SequenceNumber};

/// A pinned point-in-time view of committed data
///
/// Snapshots are handed out by [`KvEngine::snapshot`](crate::KvEngine::snapshot)
/// and must be returned with
/// [`KvEngine::release_snapshot`](crate::KvEngine::release_snapshot) once no
/// reader needs them anymore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    id: u64,
    sequence: SequenceNumber,
}

impl Snapshot {
    /// Create a snapshot handle (engine use)
    pub fn new(id: u64, sequence: SequenceNumber) -> Self {
        Self { id, sequence }
    }

    /// Engine-assigned snapshot id
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Sequence number visible through this snapshot
    #[inline]
    pub fn sequence(&self) -> SequenceNumber {
        self.sequence
    }
}

/// Options applied to point reads and iterators
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Snapshot to read at; `None` reads the latest committed state
    pub snapshot: Option<Snapshot>,
    /// Exclusive upper bound for iterators
    pub iterate_upper_bound: Option<Key>,
    /// Whether reads should populate engine caches
    pub fill_cache: bool,
}

impl ReadOptions {
    /// Read options pinned to `snapshot`
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            ..Self::default()
        }
    }

    /// Sequence number reads are bounded by, if pinned
    pub fn sequence(&self) -> Option<SequenceNumber> {
        self.snapshot.as_ref().map(Snapshot::sequence)
    }

    /// Check whether `key` is below the iterate upper bound
    pub fn below_upper_bound(&self, key: &[u8]) -> bool {
        match &self.iterate_upper_bound {
            Some(bound) => key < bound.as_bytes(),
            None => true,
        }
    }
}
