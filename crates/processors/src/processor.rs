use std::borrow::Cow;
use std::fmt::{self, Debug, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use exn::ResultExt;
use futures::FutureExt;
use futures::future::BoxFuture;
use iconsprite_dom::Element;
use tracing::instrument;

use crate::error::{ErrorKind, Result};

/// What a processor is currently working on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorContext {
    /// Symbol id for per-symbol processing, sprite name for per-sprite
    /// processing.
    pub id: String,
    /// Source file, only present for per-symbol processing.
    pub file_path: Option<PathBuf>,
}

impl ProcessorContext {
    pub fn symbol(id: impl Into<String>, file_path: impl AsRef<Path>) -> Self {
        Self { id: id.into(), file_path: Some(file_path.as_ref().to_path_buf()) }
    }

    pub fn sprite(name: impl Into<String>) -> Self {
        Self { id: name.into(), file_path: None }
    }
}

type ProcessorFn =
    dyn for<'a> Fn(&'a mut Element, &'a ProcessorContext) -> BoxFuture<'a, Result<()>> + Send + Sync;

/// A single transform over a parsed `<svg>` element.
///
/// Cheap to clone; the underlying closure is shared.
#[derive(Clone)]
pub struct Processor {
    name: Cow<'static, str>,
    run: Arc<ProcessorFn>,
}

impl Processor {
    /// Wraps an asynchronous transform.
    ///
    /// ```
    /// use futures::FutureExt;
    /// use iconsprite_processors::Processor;
    ///
    /// let processor = Processor::new("add-title", |svg, context| {
    ///     async move {
    ///         svg.attributes.set("aria-label", context.id.clone());
    ///         Ok(())
    ///     }
    ///     .boxed()
    /// });
    /// assert_eq!(processor.name(), "add-title");
    /// ```
    pub fn new<F>(name: impl Into<Cow<'static, str>>, run: F) -> Self
    where
        F: for<'a> Fn(&'a mut Element, &'a ProcessorContext) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
    {
        Self { name: name.into(), run: Arc::new(run) }
    }

    /// Wraps a synchronous transform.
    pub fn from_fn<F>(name: impl Into<Cow<'static, str>>, run: F) -> Self
    where
        F: Fn(&mut Element, &ProcessorContext) -> Result<()> + Send + Sync + 'static,
    {
        Self::new(name, move |svg, context| futures::future::ready(run(svg, context)).boxed())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn run(&self, svg: &mut Element, context: &ProcessorContext) -> Result<()> {
        (self.run)(svg, context).await
    }
}

impl Debug for Processor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Processor").field(&self.name).finish()
    }
}

/// An ordered list of processors, run one after another.
///
/// There is no reordering: if a step depends on the output of another (a
/// prefixing step after one that removes `<style>` tags, say) it's up to
/// whoever builds the pipeline to put them in the right order.
#[derive(Debug, Clone, Default)]
pub struct Pipeline(Vec<Processor>);

impl Pipeline {
    pub fn new(processors: Vec<Processor>) -> Self {
        Self(processors)
    }

    pub fn push(&mut self, processor: Processor) {
        self.0.push(processor);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Processor> {
        self.0.iter()
    }

    /// Runs every processor in order, stopping at the first failure.
    #[instrument(level = "debug", skip_all, fields(id = %context.id, processors = self.0.len()))]
    pub async fn run(&self, svg: &mut Element, context: &ProcessorContext) -> Result<()> {
        for processor in &self.0 {
            tracing::trace!(processor = processor.name(), "running processor");
            processor
                .run(svg, context)
                .await
                .or_raise(|| ErrorKind::Failed(processor.name().to_string()))?;
        }
        Ok(())
    }
}

impl From<Vec<Processor>> for Pipeline {
    fn from(processors: Vec<Processor>) -> Self {
        Self(processors)
    }
}

impl FromIterator<Processor> for Pipeline {
    fn from_iter<I: IntoIterator<Item = Processor>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
