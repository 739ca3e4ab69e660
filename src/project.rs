use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use iconsprite_build::Collector;
use iconsprite_config::Settings;
use iconsprite_storage::backend::LocalBackend;
use iconsprite_storage::{BackendHandle, StorageBackend, normalize_path};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;

/// A configured collector together with the directories it reads from and
/// writes to.
pub struct Project {
    src_dir: PathBuf,
    out_dir: PathBuf,
    collector: Collector,
    output: LocalBackend,
}

impl Project {
    /// Relative `src_dir` and `out_dir` are taken relative to `base`.
    pub fn open(settings: &Settings, base: &Path) -> Result<Self> {
        let src_dir = normalize_path(base.join(&settings.src_dir));
        let out_dir = normalize_path(base.join(&settings.out_dir));
        let sources: BackendHandle = Arc::new(
            LocalBackend::new("sources", &src_dir).or_raise(|| ErrorKind::Directory(src_dir.clone()))?,
        );
        let output = LocalBackend::new("output", &out_dir).or_raise(|| ErrorKind::Directory(out_dir.clone()))?;
        let collector = Collector::from_settings(settings, sources).or_raise(|| ErrorKind::Build)?;
        Ok(Self { src_dir, out_dir, collector, output })
    }

    pub fn src_dir(&self) -> &Path {
        &self.src_dir
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn collector(&self) -> &Collector {
        &self.collector
    }

    /// Initialises every sprite and writes all outputs.
    #[instrument(skip(self), fields(src = %self.src_dir.display()))]
    pub async fn build(&self) -> Result<usize> {
        self.collector.init().await.or_raise(|| ErrorKind::Build)?;
        self.write().await
    }

    /// Writes the current sprites and modules, returning how many files were
    /// written.
    #[instrument(level = "debug", skip(self), fields(out = %self.out_dir.display()))]
    pub async fn write(&self) -> Result<usize> {
        let files = self.collector.artifacts().await.or_raise(|| ErrorKind::Build)?;
        for file in &files {
            self.output
                .write(&file.path, file.contents.as_bytes())
                .await
                .or_raise(|| ErrorKind::Write(self.out_dir.join(&file.path)))?;
        }
        tracing::info!(files = files.len(), out = %self.out_dir.display(), "outputs written");
        Ok(files.len())
    }
}
