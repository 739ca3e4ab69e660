//! Build Error Types
//!
//! Kinds are `Clone` so that a failed sprite build can be handed to every
//! caller waiting on the same computation.

use derive_more::{Display, Error};
use iconsprite_processors::error::{Error as ProcessorError, ErrorKind as ProcessorErrorKind};
use std::path::PathBuf;

/// A build error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for build operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Nothing usable is left of a file name once it's sanitized.
    #[display("cannot derive a symbol id from '{_0}'")]
    EmptyIdentifier(#[error(not(source))] String),
    #[display("SVG file is empty: {}", _0.display())]
    EmptySvg(#[error(not(source))] PathBuf),
    #[display("not an SVG file: {}", _0.display())]
    InvalidSvg(#[error(not(source))] PathBuf),
    #[display("no <svg> element in {}", _0.display())]
    MissingSvgRoot(#[error(not(source))] PathBuf),
    #[display("could not parse {}", _0.display())]
    MalformedSvg(#[error(not(source))] PathBuf),
    /// Reading sources or resolving patterns failed.
    #[display("storage error: {_0}")]
    Storage(#[error(not(source))] String),
    /// A processor failed on a symbol (`target` is the symbol id) or on a
    /// whole sprite (`target` is the sprite name).
    #[display("processing '{target}' failed: {cause}")]
    Processor { target: String, cause: ProcessorErrorKind },
    /// Processors listed for a sprite could not be constructed.
    #[display("invalid processor configuration for sprite '{_0}'")]
    Configuration(#[error(not(source))] String),
    /// A generated module could not be rendered.
    #[display("could not render {_0}")]
    Template(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Wrap a processor failure, keeping the processor crate's `Exn` frame as
    /// a child in this error tree.
    #[track_caller]
    pub fn processor(target: impl Into<String>, err: ProcessorError) -> Error {
        let cause = (*err).clone();
        err.raise(ErrorKind::Processor { target: target.into(), cause })
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
