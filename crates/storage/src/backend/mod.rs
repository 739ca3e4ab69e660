//! Storage backend trait and implementations.
//!
//! This module defines the `StorageBackend` trait, the one interface the build
//! engine uses for everything on disk: turning glob patterns into files,
//! reading icon sources and writing generated artifacts.

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
use crate::error::Result;
use crate::path::normalize;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Unified interface for storage backends.
///
/// # Path Handling
/// Reads accept absolute paths as well as paths relative to the backend root;
/// either way they are lexically normalised with
/// [`resolve_path()`](Self::resolve_path) first. Writes only accept relative
/// paths that stay inside the root (see [`validate_path`](crate::validate_path)).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use iconsprite_storage::{backend::StorageBackend, error::Result};
///
/// async fn total_icon_bytes(backend: &dyn StorageBackend) -> Result<usize> {
///     let mut total = 0;
///     for path in backend.resolve(&["icons/**/*.svg".to_string()]).await? {
///         total += backend.read(&path).await?.len();
///     }
///     Ok(total)
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend (used for logging only).
    fn name(&self) -> &str;

    /// Absolute directory that relative paths and patterns are anchored to.
    fn root(&self) -> &Path;

    /// Absolute, normalised form of `path`.
    fn resolve_path(&self, path: &Path) -> PathBuf {
        normalize(self.root().join(path))
    }

    /// Resolve glob patterns to the files they match.
    ///
    /// Returns absolute, normalised paths of regular files only, sorted and
    /// without duplicates. Patterns prefixed with `!` remove matches. A
    /// pattern that matches nothing is not an error.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use iconsprite_storage::{backend::StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    /// let patterns = ["./icons/*.svg".to_string(), "!./icons/draft-*.svg".to_string()];
    /// for path in backend.resolve(&patterns).await? {
    ///     println!("{}", path.display());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    async fn resolve(&self, patterns: &[String]) -> Result<Vec<PathBuf>>;

    /// Read file contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write file contents.
    ///
    /// Creates a new file or overwrites an existing file with the provided
    /// data. Parent directories are created as needed.
    ///
    /// ```no_run
    /// use std::path::Path;
    /// # use iconsprite_storage::{backend::StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    /// backend.write(Path::new("symbols/arrow.js"), b"export default 'arrow';").await?;
    /// # Ok(())
    /// # }
    /// ```
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;
}
