//! Core types for the access layer
//!
//! This module defines the foundational types:
//! - ColumnFamily: Identifier of a keyspace partition inside the engine
//! - Key: Opaque, bytewise-ordered key
//! - KeyBounds: Half-open key range bound to one column family
//! - SequenceNumber: Engine commit sequence

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Engine commit sequence number
///
/// Every batch applied to the engine receives exactly one sequence number.
/// Sequence numbers are monotonically increasing; 0 means "nothing committed".
pub type SequenceNumber = u64;

/// Identifier of a logical keyspace partition (column family)
///
/// Column families are created by the engine and live as long as the engine.
/// The handle is cheap to clone and compares by id.
#[derive(Clone)]
pub struct ColumnFamily {
    id: u32,
    name: Arc<str>,
}

impl ColumnFamily {
    /// Create a column family handle
    ///
    /// Engines hand these out; callers obtain them from the engine rather
    /// than constructing them directly.
    pub fn new(id: u32, name: impl Into<Arc<str>>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Numeric id, unique within one engine
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Column family name
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for ColumnFamily {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ColumnFamily {}

impl std::hash::Hash for ColumnFamily {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ColumnFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ColumnFamily({}:{})", self.id, self.name)
    }
}

impl fmt::Display for ColumnFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Opaque engine key
///
/// Keys are produced by the domain key encoder and compared bytewise.
/// Once constructed a key is immutable.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Key(Vec<u8>);

impl Key {
    /// Create a key from its encoded bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Encoded key bytes
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the encoded key in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether the encoded key is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the key and return its bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<&[u8]> for Key {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for Key {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Key {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Borrow<[u8]> for Key {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) if s.chars().all(|c| !c.is_control()) => write!(f, "Key({:?})", s),
            _ => write!(f, "Key({:02x?})", self.0),
        }
    }
}

/// Half-open key range `[start, end)` within one column family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBounds {
    column_family: ColumnFamily,
    start: Key,
    end: Key,
}

impl KeyBounds {
    /// Create bounds over `[start, end)` in `column_family`
    pub fn new(column_family: ColumnFamily, start: impl Into<Key>, end: impl Into<Key>) -> Self {
        Self {
            column_family,
            start: start.into(),
            end: end.into(),
        }
    }

    /// Bounds covering every key that starts with `prefix`
    ///
    /// The end bound is the prefix with its last non-0xff byte incremented.
    /// A prefix made only of 0xff bytes has no finite successor; the end
    /// bound then becomes the prefix followed by 0xff padding long enough to
    /// cover practical key lengths.
    pub fn prefix(column_family: ColumnFamily, prefix: &[u8]) -> Self {
        let mut end = prefix.to_vec();
        while let Some(last) = end.pop() {
            if last < 0xff {
                end.push(last + 1);
                return Self::new(column_family, prefix, end);
            }
        }
        let mut end = prefix.to_vec();
        end.extend(std::iter::repeat(0xff).take(64));
        Self::new(column_family, prefix, end)
    }

    /// Column family the bounds apply to
    pub fn column_family(&self) -> &ColumnFamily {
        &self.column_family
    }

    /// Inclusive start key
    pub fn start(&self) -> &[u8] {
        self.start.as_bytes()
    }

    /// Exclusive end key
    pub fn end(&self) -> &[u8] {
        self.end.as_bytes()
    }

    /// Check whether `key` lies within the bounds
    pub fn contains(&self, key: &[u8]) -> bool {
        key >= self.start() && key < self.end()
    }
}
