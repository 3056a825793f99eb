//! Transaction configuration and behavioral hints
//!
//! `TransactionOptions` bounds how much a transaction may buffer and when
//! an intermediate commit kicks in. Options can be loaded from a TOML file
//! or string; every field is optional and falls back to its default.
//!
//! # Example
//!
//! ```toml
//! # Hard cap on buffered bytes (default: unlimited)
//! max_transaction_size = 1073741824
//!
//! # Intermediate commit thresholds (only used with INTERMEDIATE_COMMITS)
//! intermediate_commit_size = 536870912
//! intermediate_commit_count = 1000000
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strata_core::{Error, Result};

/// Default buffered bytes that trigger an intermediate commit (512 MiB)
pub const DEFAULT_INTERMEDIATE_COMMIT_SIZE: u64 = 512 * 1024 * 1024;

/// Default operation count that triggers an intermediate commit
pub const DEFAULT_INTERMEDIATE_COMMIT_COUNT: u64 = 1_000_000;

fn default_max_transaction_size() -> u64 {
    u64::MAX
}

fn default_intermediate_commit_size() -> u64 {
    DEFAULT_INTERMEDIATE_COMMIT_SIZE
}

fn default_intermediate_commit_count() -> u64 {
    DEFAULT_INTERMEDIATE_COMMIT_COUNT
}

/// Size limits of one transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOptions {
    /// Buffered bytes a transaction may hold before operations fail with
    /// `ResourceLimit`
    #[serde(default = "default_max_transaction_size")]
    pub max_transaction_size: u64,
    /// Buffered bytes that trigger an intermediate commit
    #[serde(default = "default_intermediate_commit_size")]
    pub intermediate_commit_size: u64,
    /// Operations that trigger an intermediate commit
    #[serde(default = "default_intermediate_commit_count")]
    pub intermediate_commit_count: u64,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            max_transaction_size: default_max_transaction_size(),
            intermediate_commit_size: default_intermediate_commit_size(),
            intermediate_commit_count: default_intermediate_commit_count(),
        }
    }
}

impl TransactionOptions {
    /// Parse options from TOML text and validate them
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let options: TransactionOptions = toml::from_str(content)
            .map_err(|e| Error::InvalidConfig(format!("Failed to parse options: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Read options from a TOML file and validate them
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the file cannot be read or parsed, or if
    /// the values are inconsistent.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!(
                "Failed to read options file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Check the thresholds are usable
    pub fn validate(&self) -> Result<()> {
        if self.intermediate_commit_size == 0 {
            return Err(Error::InvalidConfig(
                "intermediate_commit_size must be greater than zero".to_string(),
            ));
        }
        if self.intermediate_commit_count == 0 {
            return Err(Error::InvalidConfig(
                "intermediate_commit_count must be greater than zero".to_string(),
            ));
        }
        if self.intermediate_commit_size > self.max_transaction_size {
            return Err(Error::InvalidConfig(format!(
                "intermediate_commit_size ({}) exceeds max_transaction_size ({})",
                self.intermediate_commit_size, self.max_transaction_size
            )));
        }
        Ok(())
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::InvalidConfig(format!("Failed to serialize options: {}", e)))
    }
}

/// Set of behavioral hints attached to a transaction
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hints(u32);

impl Hints {
    /// No hints
    pub const NONE: Hints = Hints(0);
    /// The transaction wraps exactly one auto-committing operation
    pub const SINGLE_OPERATION: Hints = Hints(1 << 0);
    /// The transaction may commit in between to bound its size
    pub const INTERMEDIATE_COMMITS: Hints = Hints(1 << 1);

    /// Whether every hint in `other` is set
    #[inline]
    pub fn contains(self, other: Hints) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set the hints in `other`
    #[inline]
    pub fn insert(&mut self, other: Hints) {
        self.0 |= other.0;
    }

    /// Clear the hints in `other`
    #[inline]
    pub fn remove(&mut self, other: Hints) {
        self.0 &= !other.0;
    }

    /// Whether no hint is set
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for Hints {
    type Output = Hints;

    fn bitor(self, rhs: Hints) -> Hints {
        Hints(self.0 | rhs.0)
    }
}

impl fmt::Debug for Hints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(Hints::SINGLE_OPERATION) {
            names.push("SINGLE_OPERATION");
        }
        if self.contains(Hints::INTERMEDIATE_COMMITS) {
            names.push("INTERMEDIATE_COMMITS");
        }
        write!(f, "Hints({})", names.join(" | "))
    }
}
