//! Multi-version table for one column family
//!
//! Every key maps to a version chain ordered by ascending sequence number.
//! A reader at sequence `s` sees the newest version with sequence `<= s`;
//! a tombstone version hides the key.
//!
//! # Design Notes
//!
//! - **One version per batch**: repeated writes to a key inside one batch
//!   share a sequence, the last one wins
//! - **Versions are kept**: chains only grow, so every pinned snapshot stays
//!   readable

use std::collections::BTreeMap;

use bytes::Bytes;
use smallvec::SmallVec;
use strata_core::{ReadOptions, SequenceNumber};

use crate::bloom::BloomFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Version {
    sequence: SequenceNumber,
    value: Option<Bytes>,
}

/// Versions of one key, oldest first
#[derive(Debug, Clone, Default)]
struct VersionChain {
    versions: SmallVec<[Version; 2]>,
}

impl VersionChain {
    fn visible(&self, sequence: SequenceNumber) -> Option<&Version> {
        self.versions.iter().rev().find(|v| v.sequence <= sequence)
    }

    fn latest_sequence(&self) -> Option<SequenceNumber> {
        self.versions.last().map(|v| v.sequence)
    }

    fn push(&mut self, sequence: SequenceNumber, value: Option<Bytes>) {
        match self.versions.last_mut() {
            Some(last) if last.sequence == sequence => last.value = value,
            _ => self.versions.push(Version { sequence, value }),
        }
    }
}

/// Versioned key space plus its existence filter
#[derive(Debug, Default)]
pub struct MemTable {
    entries: BTreeMap<Vec<u8>, VersionChain>,
    filter: BloomFilter,
}

impl MemTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `key` visible at `sequence`
    pub fn get(&self, key: &[u8], sequence: SequenceNumber) -> Option<Bytes> {
        self.entries
            .get(key)
            .and_then(|chain| chain.visible(sequence))
            .and_then(|version| version.value.clone())
    }

    /// Sequence of the newest version of `key`, tombstones included
    pub fn latest_sequence(&self, key: &[u8]) -> Option<SequenceNumber> {
        self.entries.get(key).and_then(VersionChain::latest_sequence)
    }

    /// Record a write (`None` is a delete) at `sequence`
    pub fn apply(&mut self, key: &[u8], sequence: SequenceNumber, value: Option<Bytes>) {
        if value.is_some() {
            self.filter.insert(key);
        }
        match self.entries.get_mut(key) {
            Some(chain) => chain.push(sequence, value),
            None => {
                let mut chain = VersionChain::default();
                chain.push(sequence, value);
                self.entries.insert(key.to_vec(), chain);
            }
        }
    }

    /// Bloom probe
    pub fn may_contain(&self, key: &[u8]) -> bool {
        self.filter.may_contain(key)
    }

    /// Live entries visible at `sequence`, in key order, below the
    /// iterate upper bound of `options`
    pub fn scan(&self, sequence: SequenceNumber, options: &ReadOptions) -> Vec<(Vec<u8>, Bytes)> {
        self.entries
            .iter()
            .take_while(|(key, _)| options.below_upper_bound(key))
            .filter_map(|(key, chain)| {
                chain
                    .visible(sequence)
                    .and_then(|version| version.value.clone())
                    .map(|value| (key.clone(), value))
            })
            .collect()
    }
}
