use std::path::{Path, PathBuf};
use std::sync::Arc;

use exn::{OptionExt, ResultExt};
use iconsprite_asyncutils::Memo;
use iconsprite_dom::{Attributes, Element, find, parse};
use iconsprite_processors::{Pipeline, ProcessorContext};
use iconsprite_storage::BackendHandle;
use serde::Serialize;
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::identifier::sanitize;

/// An icon after processing, ready to become a `<symbol>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedSymbol {
    /// Attributes of the icon's `<svg>` root, with `id` forced to the
    /// symbol's id.
    pub attributes: Attributes,
    /// Everything inside the `<svg>` root.
    pub content: String,
}

/// One source SVG file.
///
/// Processing is lazy and cached until [`reset()`](Self::reset). A file that
/// can't be read, parsed or processed yields `None` (with a warning) instead
/// of an error, so one broken icon never takes down its sprite.
pub struct Symbol {
    id: String,
    file_path: PathBuf,
    pipeline: Pipeline,
    backend: BackendHandle,
    processed: Memo<Option<Arc<ProcessedSymbol>>>,
}

impl Symbol {
    /// Fails only if no id can be derived from the file name.
    pub fn new(file_path: impl Into<PathBuf>, pipeline: Pipeline, backend: BackendHandle) -> Result<Self> {
        let file_path = file_path.into();
        let stem = file_path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
        let id = sanitize(&stem)?;
        Ok(Self { id, file_path, pipeline, backend, processed: Memo::new() })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Forget the processed result; the next call to
    /// [`processed()`](Self::processed) reads the file again.
    pub fn reset(&self) {
        self.processed.reset();
    }

    /// The processed icon, or `None` if processing failed.
    ///
    /// Concurrent callers share one read of the file.
    pub async fn processed(&self) -> Option<Arc<ProcessedSymbol>> {
        let id = self.id.clone();
        let file_path = self.file_path.clone();
        let pipeline = self.pipeline.clone();
        let backend = self.backend.clone();
        self.processed
            .get_or_init(|| async move {
                match process(&id, &file_path, &pipeline, &backend).await {
                    Ok(processed) => Some(Arc::new(processed)),
                    Err(err) => {
                        tracing::warn!(path = %file_path.display(), error = ?err, "failed to process SVG");
                        None
                    },
                }
            })
            .await
    }
}

impl std::fmt::Debug for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Symbol").field("id", &self.id).field("file_path", &self.file_path).finish()
    }
}

#[instrument(level = "debug", skip(pipeline, backend), fields(path = %file_path.display()))]
async fn process(id: &str, file_path: &Path, pipeline: &Pipeline, backend: &BackendHandle) -> Result<ProcessedSymbol> {
    let bytes = backend
        .read(file_path)
        .await
        .or_raise(|| ErrorKind::Storage(format!("cannot read {}", file_path.display())))?;
    let text = String::from_utf8_lossy(&bytes);
    let text = text.trim();
    if text.is_empty() {
        exn::bail!(ErrorKind::EmptySvg(file_path.to_path_buf()));
    }
    if !text.contains("<svg") {
        exn::bail!(ErrorKind::InvalidSvg(file_path.to_path_buf()));
    }
    let nodes = parse(text).or_raise(|| ErrorKind::MalformedSvg(file_path.to_path_buf()))?;
    let mut svg: Element = find(&nodes, "svg")
        .cloned()
        .ok_or_raise(|| ErrorKind::MissingSvgRoot(file_path.to_path_buf()))?;
    pipeline
        .run(&mut svg, &ProcessorContext::symbol(id, file_path))
        .await
        .map_err(|err| ErrorKind::processor(id, err))?;
    let mut attributes = svg.attributes.clone();
    attributes.set("id", id);
    Ok(ProcessedSymbol { attributes, content: svg.inner_markup() })
}
