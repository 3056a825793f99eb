//! Engine status codes and their translation into domain errors
//!
//! Engines report failures as a [`Status`]. The access layer never inspects
//! raw statuses beyond "not found"; everything else goes through
//! [`convert_status`], which produces the stable [`Error`] taxonomy.
//!
//! # Translation table
//!
//! | Status | Error |
//! |---|---|
//! | `NotFound` | `NotFound { hint }` |
//! | `Busy` + `Deadlock` | `Storage(Deadlock)` |
//! | `Busy` + `LockLimit` | `Storage(ResourceLimit)` |
//! | `Busy` | `Storage(Conflict)` |
//! | `TimedOut` | `Storage(LockTimeout)` |
//! | `TryAgain` | `Storage(TryAgain)` |
//! | `Aborted` | `Storage(TransactionAborted)` |
//! | `Corruption` | `Storage(Corruption)` |
//! | `InvalidArgument` | `Storage(BadParameter)` |
//! | `IoError` | `Storage(Io)` |
//! | `NotSupported` | `Storage(NotImplemented)` |
//! | `ShutdownInProgress` | `Storage(ShuttingDown)` |
//! | `Incomplete` | `Storage(Incomplete)` |
//! | `Expired` | `Storage(Expired)` |
//! | `MergeInProgress` | `Storage(MergeInProgress)` |

use std::fmt;

use crate::error::{Error, ErrorCode};

/// Result type for raw engine calls
pub type EngineResult<T> = std::result::Result<T, Status>;

/// Engine outcome code (success is expressed as `Ok(_)`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// Key or object does not exist
    NotFound,
    /// Stored data is corrupt
    Corruption,
    /// Operation is not supported
    NotSupported,
    /// Caller passed an invalid argument
    InvalidArgument,
    /// I/O failure
    IoError,
    /// Merge still in progress
    MergeInProgress,
    /// Read could not complete
    Incomplete,
    /// Engine is shutting down
    ShutdownInProgress,
    /// Timed out waiting for a lock
    TimedOut,
    /// Operation aborted
    Aborted,
    /// Resource busy (conflicts, lock limits, deadlocks)
    Busy,
    /// Resource expired
    Expired,
    /// Transient failure
    TryAgain,
}

/// Refinement of a [`StatusCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SubCode {
    /// No refinement
    #[default]
    None,
    /// `Busy` caused by a deadlock
    Deadlock,
    /// `Busy` caused by exceeding the lock limit
    LockLimit,
}

/// Engine-level failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    code: StatusCode,
    subcode: SubCode,
    message: String,
}

impl Status {
    /// Create a status with an explicit code
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            subcode: SubCode::None,
            message: message.into(),
        }
    }

    /// Attach a subcode
    pub fn with_subcode(mut self, subcode: SubCode) -> Self {
        self.subcode = subcode;
        self
    }

    /// `NotFound` status
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NotFound, message)
    }

    /// `Busy` status (write-write conflict)
    pub fn busy(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Busy, message)
    }

    /// `InvalidArgument` status
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(StatusCode::InvalidArgument, message)
    }

    /// `NotSupported` status
    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NotSupported, message)
    }

    /// Outcome code
    #[inline]
    pub fn code(&self) -> StatusCode {
        self.code
    }

    /// Outcome refinement
    #[inline]
    pub fn subcode(&self) -> SubCode {
        self.subcode
    }

    /// Engine message
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Check for `NotFound`
    #[inline]
    pub fn is_not_found(&self) -> bool {
        self.code == StatusCode::NotFound
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self.code {
            StatusCode::NotFound => "NotFound",
            StatusCode::Corruption => "Corruption",
            StatusCode::NotSupported => "Not implemented",
            StatusCode::InvalidArgument => "Invalid argument",
            StatusCode::IoError => "IO error",
            StatusCode::MergeInProgress => "Merge in progress",
            StatusCode::Incomplete => "Result incomplete",
            StatusCode::ShutdownInProgress => "Shutdown in progress",
            StatusCode::TimedOut => "Operation timed out",
            StatusCode::Aborted => "Operation aborted",
            StatusCode::Busy => "Resource busy",
            StatusCode::Expired => "Operation expired",
            StatusCode::TryAgain => "Operation failed. Try again.",
        };
        if self.message.is_empty() {
            f.write_str(code)
        } else {
            write!(f, "{}: {}", code, self.message)
        }
    }
}

impl std::error::Error for Status {}

/// Caller-side context for interpreting a "not found" outcome
///
/// The hint only shapes the resulting error; it never changes control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatusHint {
    /// No particular object
    #[default]
    None,
    /// A document
    Document,
    /// A collection
    Collection,
    /// A view
    View,
    /// An index
    Index,
    /// A database
    Database,
}

impl fmt::Display for StatusHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatusHint::None => "key",
            StatusHint::Document => "document",
            StatusHint::Collection => "collection",
            StatusHint::View => "view",
            StatusHint::Index => "index",
            StatusHint::Database => "database",
        })
    }
}

/// Translate an engine status into a domain error
///
/// `context` names the call site (for example `"Get - in TrxMethods"`) and
/// is appended to the message.
pub fn convert_status(status: Status, hint: StatusHint, context: &str) -> Error {
    let code = match (status.code(), status.subcode()) {
        (StatusCode::NotFound, _) => return Error::not_found(hint, context),
        (StatusCode::Busy, SubCode::Deadlock) => ErrorCode::Deadlock,
        (StatusCode::Busy, SubCode::LockLimit) => ErrorCode::ResourceLimit,
        (StatusCode::Busy, SubCode::None) => ErrorCode::Conflict,
        (StatusCode::TimedOut, _) => ErrorCode::LockTimeout,
        (StatusCode::TryAgain, _) => ErrorCode::TryAgain,
        (StatusCode::Aborted, _) => ErrorCode::TransactionAborted,
        (StatusCode::Corruption, _) => ErrorCode::Corruption,
        (StatusCode::InvalidArgument, _) => ErrorCode::BadParameter,
        (StatusCode::IoError, _) => ErrorCode::Io,
        (StatusCode::NotSupported, _) => ErrorCode::NotImplemented,
        (StatusCode::ShutdownInProgress, _) => ErrorCode::ShuttingDown,
        (StatusCode::Incomplete, _) => ErrorCode::Incomplete,
        (StatusCode::Expired, _) => ErrorCode::Expired,
        (StatusCode::MergeInProgress, _) => ErrorCode::MergeInProgress,
    };
    let message = if context.is_empty() {
        status.to_string()
    } else {
        format!("{} - {}", status, context)
    };
    Error::storage(code, message)
}

/// Convert an engine result, translating failures with [`convert_status`]
pub fn check<T>(result: EngineResult<T>, hint: StatusHint, context: &str) -> crate::Result<T> {
    result.map_err(|status| convert_status(status, hint, context))
}
