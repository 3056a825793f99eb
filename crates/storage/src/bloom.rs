//! Per-column-family bloom filter backing `key_may_exist`
//!
//! The filter only ever grows: deletes do not clear bits, so a deleted key
//! keeps answering "maybe". That matches the probe contract (false
//! positives allowed, false negatives never).
//!
//! Hashing uses xxh3 with double hashing to derive the probe positions.

use xxhash_rust::xxh3::{xxh3_64, xxh3_64_with_seed};

const DEFAULT_BITS: usize = 1 << 16;
const DEFAULT_PROBES: u32 = 4;
const SECOND_SEED: u64 = 0x9e37_79b9_7f4a_7c15;

/// Fixed-size bloom filter over byte keys
#[derive(Debug, Clone)]
pub struct BloomFilter {
    words: Vec<u64>,
    probes: u32,
}

impl BloomFilter {
    /// Create a filter with the default geometry
    pub fn new() -> Self {
        Self::with_geometry(DEFAULT_BITS, DEFAULT_PROBES)
    }

    /// Create a filter with `bits` bits (rounded up to a multiple of 64)
    /// and `probes` hash probes per key
    pub fn with_geometry(bits: usize, probes: u32) -> Self {
        let words = (bits.max(64) + 63) / 64;
        Self {
            words: vec![0; words],
            probes: probes.max(1),
        }
    }

    fn num_bits(&self) -> u64 {
        (self.words.len() * 64) as u64
    }

    fn positions(&self, key: &[u8]) -> impl Iterator<Item = u64> + '_ {
        let h1 = xxh3_64(key);
        let h2 = xxh3_64_with_seed(key, SECOND_SEED) | 1;
        let bits = self.num_bits();
        (0..u64::from(self.probes)).map(move |i| h1.wrapping_add(i.wrapping_mul(h2)) % bits)
    }

    /// Record `key`
    pub fn insert(&mut self, key: &[u8]) {
        let positions: Vec<u64> = self.positions(key).collect();
        for bit in positions {
            self.words[(bit / 64) as usize] |= 1 << (bit % 64);
        }
    }

    /// Whether `key` may have been inserted
    pub fn may_contain(&self, key: &[u8]) -> bool {
        self.positions(key)
            .all(|bit| self.words[(bit / 64) as usize] & (1 << (bit % 64)) != 0)
    }
}

impl Default for BloomFilter {
    fn default() -> Self {
        Self::new()
    }
}
