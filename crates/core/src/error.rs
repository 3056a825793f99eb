//! Error types for the access layer
//!
//! This module defines the domain error taxonomy returned to callers.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Engine-level outcomes ([`Status`](crate::status::Status)) are converted
//! into these errors by [`convert_status`](crate::status::convert_status).

use std::fmt;
use thiserror::Error;

use crate::status::StatusHint;

/// Result type alias for access layer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Classification of storage failures
///
/// Every non-"not found" engine failure maps onto exactly one code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Write-write conflict with another transaction
    Conflict,
    /// Deadlock detected while acquiring locks
    Deadlock,
    /// Lock could not be acquired in time
    LockTimeout,
    /// Transient failure, operation may be retried by the caller
    TryAgain,
    /// Transaction was aborted by the engine
    TransactionAborted,
    /// Stored data failed integrity checks
    Corruption,
    /// Invalid argument passed to the engine
    BadParameter,
    /// I/O failure inside the engine
    Io,
    /// Operation not supported by the engine
    NotImplemented,
    /// Engine is shutting down
    ShuttingDown,
    /// Read could not be completed
    Incomplete,
    /// Engine resource expired
    Expired,
    /// Merge operation still in progress
    MergeInProgress,
    /// Size or lock limits exceeded
    ResourceLimit,
    /// Anything the engine could not classify
    Internal,
}

impl ErrorCode {
    /// Stable identifier for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Conflict => "conflict",
            ErrorCode::Deadlock => "deadlock",
            ErrorCode::LockTimeout => "lock_timeout",
            ErrorCode::TryAgain => "try_again",
            ErrorCode::TransactionAborted => "transaction_aborted",
            ErrorCode::Corruption => "corruption",
            ErrorCode::BadParameter => "bad_parameter",
            ErrorCode::Io => "io",
            ErrorCode::NotImplemented => "not_implemented",
            ErrorCode::ShuttingDown => "shutting_down",
            ErrorCode::Incomplete => "incomplete",
            ErrorCode::Expired => "expired",
            ErrorCode::MergeInProgress => "merge_in_progress",
            ErrorCode::ResourceLimit => "resource_limit",
            ErrorCode::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error types for the access layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Key is absent under the reader's visibility rules
    ///
    /// Expected and recoverable: `get` returns it as a normal negative
    /// result and `exists` folds it into `false`.
    #[error("{hint} not found{}", fmt_context(.context))]
    NotFound {
        /// What kind of object the caller was looking for
        hint: StatusHint,
        /// Where the lookup happened
        context: String,
    },

    /// Write attempted through a read-only access strategy
    ///
    /// This is a usage error and is never silently ignored.
    #[error("cannot modify data in a read-only transaction")]
    ReadOnlyViolation,

    /// Any other engine-reported failure
    #[error("storage error ({code}): {message}")]
    Storage {
        /// Failure classification
        code: ErrorCode,
        /// Engine message plus call-site context
        message: String,
    },

    /// Configuration could not be parsed or is inconsistent
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

fn fmt_context(context: &str) -> String {
    if context.is_empty() {
        String::new()
    } else {
        format!(" ({})", context)
    }
}

impl Error {
    /// Build a storage error
    pub fn storage(code: ErrorCode, message: impl Into<String>) -> Self {
        Error::Storage {
            code,
            message: message.into(),
        }
    }

    /// Build a document-not-found error
    pub fn not_found(hint: StatusHint, context: impl Into<String>) -> Self {
        Error::NotFound {
            hint,
            context: context.into(),
        }
    }

    /// Check whether this is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Storage error code, if this is a storage error
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Error::Storage { code, .. } => Some(*code),
            _ => None,
        }
    }
}
