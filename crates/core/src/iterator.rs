//! Range cursors
//!
//! [`KvIterator`] is the cursor contract every engine iterator implements.
//! Two building blocks live here because both the engine and the overlay
//! write batch need them:
//!
//! - [`VecIterator`]: cursor over an already materialized, sorted entry list
//! - [`BaseDeltaIterator`]: layers buffered writes (the delta) over a base
//!   cursor, hiding base entries the delta deletes
//!
//! Cursors move forward only.

use bytes::Bytes;

use crate::status::Status;

/// Forward range cursor over one column family
///
/// A fresh cursor is not positioned; call [`seek_to_first`](Self::seek_to_first)
/// or [`seek`](Self::seek) before reading. `key`/`value` may only be called
/// while [`valid`](Self::valid) returns true.
pub trait KvIterator {
    /// Whether the cursor points at an entry
    fn valid(&self) -> bool;

    /// Position at the first entry
    fn seek_to_first(&mut self);

    /// Position at the first entry with key `>= target`
    fn seek(&mut self, target: &[u8]);

    /// Advance to the next entry
    fn next(&mut self);

    /// Current key
    fn key(&self) -> &[u8];

    /// Current value
    fn value(&self) -> &[u8];

    /// Error encountered while iterating, if any
    fn status(&self) -> Result<(), Status>;
}

/// Cursor over a sorted, materialized list of live entries
#[derive(Debug, Clone)]
pub struct VecIterator {
    entries: Vec<(Vec<u8>, Bytes)>,
    pos: usize,
}

impl VecIterator {
    /// Create a cursor over `entries`, which must be sorted by key and unique
    pub fn new(entries: Vec<(Vec<u8>, Bytes)>) -> Self {
        debug_assert!(entries.windows(2).all(|w| w[0].0 < w[1].0));
        let pos = entries.len();
        Self { entries, pos }
    }

    /// Number of entries behind the cursor
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cursor has no entries at all
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvIterator for VecIterator {
    fn valid(&self) -> bool {
        self.pos < self.entries.len()
    }

    fn seek_to_first(&mut self) {
        self.pos = 0;
    }

    fn seek(&mut self, target: &[u8]) {
        self.pos = self
            .entries
            .partition_point(|(key, _)| key.as_slice() < target);
    }

    fn next(&mut self) {
        if self.valid() {
            self.pos += 1;
        }
    }

    fn key(&self) -> &[u8] {
        &self.entries[self.pos].0
    }

    fn value(&self) -> &[u8] {
        &self.entries[self.pos].1
    }

    fn status(&self) -> Result<(), Status> {
        Ok(())
    }
}

/// Sorted buffered writes; `None` marks a delete
pub type DeltaEntries = Vec<(Vec<u8>, Option<Bytes>)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Current {
    Base,
    Delta,
    None,
}

/// Buffered writes layered over a base cursor
///
/// For equal keys the delta wins; delta deletes hide the base entry.
pub struct BaseDeltaIterator<'a> {
    base: Box<dyn KvIterator + 'a>,
    delta: DeltaEntries,
    delta_pos: usize,
    current: Current,
}

impl<'a> BaseDeltaIterator<'a> {
    /// Layer `delta` (sorted by key, unique) over `base`
    pub fn new(base: Box<dyn KvIterator + 'a>, delta: DeltaEntries) -> Self {
        debug_assert!(delta.windows(2).all(|w| w[0].0 < w[1].0));
        let delta_pos = delta.len();
        Self {
            base,
            delta,
            delta_pos,
            current: Current::None,
        }
    }

    fn delta_valid(&self) -> bool {
        self.delta_pos < self.delta.len()
    }

    fn delta_is_delete(&self) -> bool {
        self.delta[self.delta_pos].1.is_none()
    }

    fn settle(&mut self) {
        loop {
            if !self.delta_valid() {
                self.current = if self.base.valid() {
                    Current::Base
                } else {
                    Current::None
                };
                return;
            }
            if !self.base.valid() {
                if self.delta_is_delete() {
                    self.delta_pos += 1;
                    continue;
                }
                self.current = Current::Delta;
                return;
            }
            match self.base.key().cmp(self.delta[self.delta_pos].0.as_slice()) {
                std::cmp::Ordering::Less => {
                    self.current = Current::Base;
                    return;
                }
                std::cmp::Ordering::Equal => {
                    // shadowed by the delta either way
                    self.base.next();
                    if self.delta_is_delete() {
                        self.delta_pos += 1;
                        continue;
                    }
                    self.current = Current::Delta;
                    return;
                }
                std::cmp::Ordering::Greater => {
                    if self.delta_is_delete() {
                        self.delta_pos += 1;
                        continue;
                    }
                    self.current = Current::Delta;
                    return;
                }
            }
        }
    }
}

impl KvIterator for BaseDeltaIterator<'_> {
    fn valid(&self) -> bool {
        self.current != Current::None
    }

    fn seek_to_first(&mut self) {
        self.base.seek_to_first();
        self.delta_pos = 0;
        self.settle();
    }

    fn seek(&mut self, target: &[u8]) {
        self.base.seek(target);
        self.delta_pos = self
            .delta
            .partition_point(|(key, _)| key.as_slice() < target);
        self.settle();
    }

    fn next(&mut self) {
        match self.current {
            Current::Base => self.base.next(),
            Current::Delta => self.delta_pos += 1,
            Current::None => return,
        }
        self.settle();
    }

    fn key(&self) -> &[u8] {
        match self.current {
            Current::Delta => &self.delta[self.delta_pos].0,
            _ => self.base.key(),
        }
    }

    fn value(&self) -> &[u8] {
        match self.current {
            Current::Delta => self.delta[self.delta_pos].1.as_deref().unwrap_or_default(),
            _ => self.base.value(),
        }
    }

    fn status(&self) -> Result<(), Status> {
        self.base.status()
    }
}

/// Drain a positioned cursor into `(key, value)` pairs
///
/// Convenience for tests and small scans.
pub fn collect_entries(iter: &mut dyn KvIterator) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut out = Vec::new();
    while iter.valid() {
        out.push((iter.key().to_vec(), iter.value().to_vec()));
        iter.next();
    }
    out
}
