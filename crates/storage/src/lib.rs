//! Access to icon source files.
//!
//! Everything the build engine needs from the filesystem goes through a
//! [`StorageBackend`]: resolving glob patterns to files, reading them, and
//! writing generated artifacts. Files are identified by absolute, lexically
//! normalised paths so that a path coming from a glob and the same path coming
//! from a watcher event compare equal.

pub mod backend;
pub mod error;
mod path;
mod pattern;

pub use crate::backend::StorageBackend;
pub use crate::path::{normalize as normalize_path, validate as validate_path};
pub use crate::pattern::PatternSet;
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
