//! DOM Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A DOM error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for DOM operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The markup is too broken to build a tree from.
    #[display("malformed markup at byte {_0}")]
    Malformed(#[error(not(source))] u64),
    /// A selector string could not be parsed.
    #[display("invalid selector '{selector}': {reason}")]
    InvalidSelector {
        /// The selector as written.
        selector: String,
        /// What the parser choked on.
        reason: String,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Markup and selectors are either valid or they're not.
        false
    }
}
