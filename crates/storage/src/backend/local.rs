//! Local filesystem storage backend.
//!
//! Files are accessed using `tokio::fs` for async I/O; glob expansion walks
//! directories synchronously and is moved off the runtime with
//! `spawn_blocking`.

use crate::error::{ErrorKind, Result};
use crate::path::{normalize, validate as validate_path};
use crate::pattern::{MATCH_OPTIONS, PatternSet};
use crate::StorageBackend;
use async_trait::async_trait;
use exn::ResultExt;
use std::collections::BTreeSet;
use std::fs::create_dir_all as sync_create_dir;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::instrument;

/// Local filesystem storage backend.
///
/// # Examples
///
/// ```no_run
/// use iconsprite_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let sources = LocalBackend::new("project", "/path/to/project")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalBackend {
    name: String,
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute, or exists but is not a
    /// directory. A missing root is created.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = normalize(root.as_ref());
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        match root.exists() {
            true if !root.is_dir() => exn::bail!(ErrorKind::InvalidPath(root)),
            true => {},
            // Non-async: only happens once at startup.
            false => sync_create_dir(&root).map_err(|e| Self::map_io_error(e, &root))?,
        }
        Ok(Self { name: name.into(), root })
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }
}

/// Blocking half of [`LocalBackend::resolve`].
fn expand(patterns: &PatternSet) -> Result<Vec<PathBuf>> {
    let mut found = BTreeSet::new();
    for pattern in patterns.includes() {
        let entries = glob::glob_with(pattern.as_str(), MATCH_OPTIONS)
            .or_raise(|| ErrorKind::InvalidPattern(pattern.as_str().to_string()))?;
        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => {
                    let path = normalize(&path);
                    if !patterns.is_excluded(&path) {
                        found.insert(path);
                    }
                },
                // Directories and broken symlinks.
                Ok(_) => {},
                Err(err) => {
                    tracing::warn!(path = %err.path().display(), error = %err.error(), "skipping unreadable path")
                },
            }
        }
    }
    Ok(found.into_iter().collect())
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn root(&self) -> &Path {
        &self.root
    }

    #[instrument(level = "debug", skip(self), fields(backend = %self.name))]
    async fn resolve(&self, patterns: &[String]) -> Result<Vec<PathBuf>> {
        let patterns = PatternSet::new(&self.root, patterns)?;
        let files = tokio::task::spawn_blocking(move || expand(&patterns))
            .await
            .or_raise(|| ErrorKind::BackendError("glob expansion was aborted".to_string()))??;
        tracing::debug!(files = files.len(), "resolved patterns");
        Ok(files)
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = self.resolve_path(path);
        Ok(fs::read(&path).await.map_err(|e| Self::map_io_error(e, &path))?)
    }

    #[instrument(level = "debug", skip(self, data), fields(backend = %self.name, size = data.len()))]
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = self.root.join(validate_path(path)?);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| Self::map_io_error(e, parent))?;
        }
        fs::write(&path, data).await.map_err(|e| Self::map_io_error(e, &path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn project() -> (TempDir, LocalBackend) {
        let dir = TempDir::new().unwrap();
        for path in ["icons/a.svg", "icons/b.svg", "icons/skip.svg", "icons/nested/c.svg", "icons/notes.txt"] {
            let path = dir.path().join(path);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "<svg/>").unwrap();
        }
        std::fs::create_dir_all(dir.path().join("icons/dir.svg")).unwrap();
        let backend = LocalBackend::new("test", dir.path()).unwrap();
        (dir, backend)
    }

    fn names(backend: &LocalBackend, paths: Vec<PathBuf>) -> Vec<String> {
        paths
            .into_iter()
            .map(|p| p.strip_prefix(backend.root()).unwrap().display().to_string())
            .collect()
    }

    #[rstest]
    #[case(&["icons/*.svg"], &["icons/a.svg", "icons/b.svg", "icons/skip.svg"])]
    #[case(&["./icons/*.svg", "!./icons/skip.svg"], &["icons/a.svg", "icons/b.svg"])]
    #[case(&["icons/**/*.svg"], &["icons/a.svg", "icons/b.svg", "icons/nested/c.svg", "icons/skip.svg"])]
    #[case(&["icons/a.svg", "icons/*.svg", "!**/skip.svg"], &["icons/a.svg", "icons/b.svg"])]
    #[case(&["missing/*.svg"], &[])]
    #[tokio::test]
    async fn test_resolve(#[case] patterns: &[&str], #[case] expected: &[&str]) {
        let (_dir, backend) = project();
        let patterns: Vec<String> = patterns.iter().map(ToString::to_string).collect();
        let resolved = backend.resolve(&patterns).await.unwrap();
        assert!(resolved.iter().all(|p| p.is_absolute()));
        assert_eq!(names(&backend, resolved), expected);
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let (_dir, backend) = project();
        backend.write(Path::new("out/symbols/a.js"), b"export {}").await.unwrap();
        assert_eq!(backend.read(Path::new("out/symbols/a.js")).await.unwrap(), b"export {}");
        let absolute = backend.root().join("out/./symbols/a.js");
        assert_eq!(backend.read(&absolute).await.unwrap(), b"export {}");
    }

    #[tokio::test]
    async fn test_read_not_found() {
        let (_dir, backend) = project();
        let err = backend.read(Path::new("icons/none.svg")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let (_dir, backend) = project();
        let err = backend.write(Path::new("../escape.js"), b"").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[test]
    fn test_root_must_be_absolute() {
        let err = LocalBackend::new("test", "relative/root").unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[test]
    fn test_root_must_be_a_directory() {
        let (_dir, backend) = project();
        let err = LocalBackend::new("test", backend.root().join("icons/a.svg")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }
}
