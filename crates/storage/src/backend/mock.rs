//! In-memory storage backend for testing.

use crate::error::{ErrorKind, Result};
use crate::path::{normalize, validate as validate_path};
use crate::pattern::PatternSet;
use crate::StorageBackend;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

const DEFAULT_ROOT: &str = "/mock";

/// In-memory storage backend for testing.
///
/// Files are stored in a map behind a [`RwLock`], so all trait methods can
/// operate on `&self` without external synchronisation. Every call to
/// [`read()`](StorageBackend::read) is counted per path, which lets tests
/// assert how often a source file was actually loaded.
///
/// # Examples
///
/// ```
/// use iconsprite_storage::backend::{MockBackend, StorageBackend};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files([
///     ("icons/arrow.svg", "<svg/>"),
/// ]);
/// assert_eq!(backend.read(Path::new("/mock/icons/arrow.svg")).await?, b"<svg/>");
/// assert_eq!(backend.read_count(Path::new("icons/arrow.svg")).await, 1);
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    root: PathBuf,
    storage: RwLock<BTreeMap<PathBuf, Vec<u8>>>,
    reads: RwLock<HashMap<PathBuf, usize>>,
}

impl MockBackend {
    /// Create a mock backend rooted at `/mock`, pre-populated with files.
    ///
    /// Relative paths are placed under the root. Panics if a relative path
    /// fails validation (e.g. path traversal). If test setup is wrong, then
    /// test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let root = PathBuf::from(DEFAULT_ROOT);
        let mut map = BTreeMap::new();
        for (path, data) in files {
            let path = path.into();
            let absolute = match path.is_absolute() {
                true => normalize(&path),
                false => {
                    let Ok(validated) = validate_path(&path) else {
                        panic!("MockBackend::with_files: invalid path {}", path.display());
                    };
                    root.join(validated)
                },
            };
            map.insert(absolute, data.into());
        }
        Self {
            name: "mock".to_string(),
            root,
            storage: RwLock::new(map),
            reads: RwLock::new(HashMap::new()),
        }
    }

    /// Add or replace a file, as if it had been written by someone else.
    pub async fn insert(&self, path: impl AsRef<Path>, data: impl Into<Vec<u8>>) {
        let path = self.resolve_path(path.as_ref());
        self.storage.write().await.insert(path, data.into());
    }

    /// Remove a file; returns whether it existed.
    pub async fn remove(&self, path: impl AsRef<Path>) -> bool {
        let path = self.resolve_path(path.as_ref());
        self.storage.write().await.remove(&path).is_some()
    }

    /// How many times `path` has been read, including failed reads.
    pub async fn read_count(&self, path: impl AsRef<Path>) -> usize {
        let path = self.resolve_path(path.as_ref());
        self.reads.read().await.get(&path).copied().unwrap_or(0)
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let files: [(&str, &str); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn root(&self) -> &Path {
        &self.root
    }

    async fn resolve(&self, patterns: &[String]) -> Result<Vec<PathBuf>> {
        let patterns = PatternSet::new(&self.root, patterns)?;
        let storage = self.storage.read().await;
        Ok(storage.keys().filter(|path| patterns.matches(path)).cloned().collect())
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = self.resolve_path(path);
        *self.reads.write().await.entry(path.clone()).or_default() += 1;
        match self.storage.read().await.get(&path) {
            Some(data) => Ok(data.clone()),
            None => exn::bail!(ErrorKind::NotFound(path)),
        }
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = self.root.join(validate_path(path)?);
        self.storage.write().await.insert(path, data.to_vec());
        Ok(())
    }
}
