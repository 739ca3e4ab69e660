//! Processor Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A processor error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for processor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A processor was configured with options it can't work with. Fix the
    /// configuration.
    #[display("invalid options for processor '{_0}'")]
    InvalidOptions(#[error(not(source))] &'static str),
    /// A processor gave up on the document it was handed.
    #[display("processor '{_0}' failed")]
    Failed(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
