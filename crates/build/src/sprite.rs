use std::path::{Path, PathBuf};
use std::sync::Arc;

use exn::{Exn, ResultExt};
use futures::future::join_all;
use iconsprite_asyncutils::Memo;
use iconsprite_config::{DEFAULT_SPRITE, SpriteSettings};
use iconsprite_dom::{Element, Node, parse};
use iconsprite_processors::{Pipeline, ProcessorContext};
use iconsprite_storage::BackendHandle;
use tokio::sync::Mutex;
use tracing::instrument;

use crate::consts::SVG_NAMESPACE;
use crate::error::{Error, ErrorKind, Result};
use crate::symbol::{ProcessedSymbol, Symbol};

/// How a sprite finds its icons and what it does to them.
#[derive(Debug, Clone, Default)]
pub struct SpriteOptions {
    /// Globs relative to the storage root; `!` excludes.
    pub import_patterns: Vec<String>,
    /// Files added after the pattern matches, in order.
    pub symbol_files: Vec<PathBuf>,
    /// Run on each icon's `<svg>` root.
    pub symbol_pipeline: Pipeline,
    /// Run on the assembled sprite.
    pub sprite_pipeline: Pipeline,
}

impl SpriteOptions {
    /// Builds options from configuration. Fails if a processor can't be
    /// constructed from its description.
    pub fn from_settings(name: &str, settings: &SpriteSettings) -> Result<Self> {
        let configuration = || ErrorKind::Configuration(name.to_string());
        Ok(Self {
            import_patterns: settings.import_patterns.clone(),
            symbol_files: settings.symbol_files.values().cloned().collect(),
            symbol_pipeline: Pipeline::from_specs(&settings.process_sprite_symbol).or_raise(configuration)?,
            sprite_pipeline: Pipeline::from_specs(&settings.process_sprite).or_raise(configuration)?,
        })
    }
}

/// The assembled sprite document and its content hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteContent {
    /// First 16 hex characters of the BLAKE3 hash of `content`.
    pub hash: String,
    pub content: String,
}

/// A symbol that processed successfully, together with its result.
#[derive(Debug, Clone)]
pub struct ProcessedEntry {
    pub symbol: Arc<Symbol>,
    pub processed: Arc<ProcessedSymbol>,
}

type CachedContent = std::result::Result<Arc<SpriteContent>, Arc<Error>>;

/// A named collection of symbols that becomes one SVG file.
///
/// The symbol list is only changed by [`init()`](Self::init) and the event
/// handlers, which are serialized with each other and with the assembly in
/// [`content()`](Self::content). Each handler returns whether the sprite's
/// content may have changed. A handler that fails leaves the symbol list as
/// it was.
pub struct Sprite {
    name: String,
    options: SpriteOptions,
    dev: bool,
    backend: BackendHandle,
    symbols: Mutex<Vec<Arc<Symbol>>>,
    content: Memo<CachedContent>,
}

impl Sprite {
    pub fn new(name: impl Into<String>, options: SpriteOptions, dev: bool, backend: BackendHandle) -> Self {
        Self {
            name: name.into(),
            options,
            dev,
            backend,
            symbols: Mutex::new(Vec::new()),
            content: Memo::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Prepended to symbol ids to form the names the runtime knows them by.
    pub fn prefix(&self) -> String {
        match self.name == DEFAULT_SPRITE {
            true => String::new(),
            false => format!("{}/", self.name),
        }
    }

    /// Number of symbols currently owned, processed or not.
    pub async fn len(&self) -> usize {
        self.symbols.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.symbols.lock().await.is_empty()
    }

    /// Forget the assembled sprite. Symbols keep their own caches.
    pub fn reset(&self) {
        self.content.reset();
    }

    /// Creates a symbol for every pattern match, then for every explicitly
    /// listed file.
    #[instrument(skip(self), fields(sprite = %self.name))]
    pub async fn init(&self) -> Result<()> {
        let mut symbols = self.symbols.lock().await;
        let mut found = Vec::new();
        for path in self.resolve_patterns().await? {
            found.push(self.symbol(path)?);
        }
        for path in &self.options.symbol_files {
            found.push(self.symbol(self.backend.resolve_path(path))?);
        }
        symbols.extend(found);
        match symbols.is_empty() {
            true => tracing::error!(sprite = %self.name, "no SVG files found in import patterns"),
            false => tracing::debug!(symbols = symbols.len(), "sprite initialised"),
        }
        self.reset();
        Ok(())
    }

    /// Every symbol that processed successfully, ordered by id.
    pub async fn processed_symbols(&self) -> Vec<ProcessedEntry> {
        let symbols = self.symbols.lock().await.clone();
        processed_entries(symbols).await
    }

    /// The assembled sprite, built on first use and cached until reset.
    ///
    /// Unlike symbol failures, a failing sprite processor is an error.
    ///
    /// The symbol list stays locked until the result is in, so an event can't
    /// slip in between the snapshot and the cached value.
    pub async fn content(&self) -> Result<Arc<SpriteContent>> {
        let symbols = self.symbols.lock().await;
        let snapshot = symbols.clone();
        let name = self.name.clone();
        let pipeline = self.options.sprite_pipeline.clone();
        let dev = self.dev;
        let result = self
            .content
            .try_get_or_init(|| async move {
                assemble(&name, snapshot, &pipeline, dev).await.map(Arc::new).map_err(Arc::new)
            })
            .await;
        drop(symbols);
        result.map_err(|err| {
            // Callers that shared the failed build get its kind and a fresh
            // location; the one that ran it gets the whole tree.
            Arc::try_unwrap(err).unwrap_or_else(|shared| {
                tracing::debug!(sprite = %self.name, error = ?shared, "sprite build failed");
                Exn::from((**shared).clone())
            })
        })
    }

    /// `sprite-<name>.<hash>.svg`, or `sprite.<name>.<hash>.svg` in dev mode
    /// where it is the last segment of the sprite's URL.
    pub async fn file_name(&self) -> Result<String> {
        let content = self.content().await?;
        Ok(sprite_file_name(&self.name, &content.hash, self.dev))
    }

    /// A file appeared. It's adopted if the import patterns match it.
    #[instrument(level = "debug", skip(self), fields(sprite = %self.name))]
    pub async fn handle_add(&self, path: &Path) -> Result<bool> {
        if self.options.import_patterns.is_empty() {
            return Ok(false);
        }
        let path = self.backend.resolve_path(path);
        let mut symbols = self.symbols.lock().await;
        if symbols.iter().any(|symbol| symbol.file_path() == path) {
            return Ok(false);
        }
        if !self.resolve_patterns().await?.contains(&path) {
            return Ok(false);
        }
        let symbol = self.symbol(path)?;
        symbols.push(symbol);
        self.reset();
        Ok(true)
    }

    /// A file changed. Only the matching symbol is reprocessed.
    #[instrument(level = "debug", skip(self), fields(sprite = %self.name))]
    pub async fn handle_change(&self, path: &Path) -> Result<bool> {
        let path = self.backend.resolve_path(path);
        let symbols = self.symbols.lock().await;
        let mut found = false;
        for symbol in symbols.iter().filter(|symbol| symbol.file_path() == path) {
            symbol.reset();
            found = true;
        }
        Ok(self.changed(found))
    }

    /// A file was removed.
    #[instrument(level = "debug", skip(self), fields(sprite = %self.name))]
    pub async fn handle_unlink(&self, path: &Path) -> Result<bool> {
        let path = self.backend.resolve_path(path);
        let mut symbols = self.symbols.lock().await;
        let before = symbols.len();
        symbols.retain(|symbol| symbol.file_path() != path);
        Ok(self.changed(before != symbols.len()))
    }

    /// A directory appeared: pick up every pattern match not owned yet.
    #[instrument(level = "debug", skip(self), fields(sprite = %self.name))]
    pub async fn handle_add_dir(&self) -> Result<bool> {
        let mut symbols = self.symbols.lock().await;
        let added = self
            .resolve_patterns()
            .await?
            .into_iter()
            .filter(|path| symbols.iter().all(|symbol| symbol.file_path() != path.as_path()))
            .map(|path| self.symbol(path))
            .collect::<Result<Vec<_>>>()?;
        let changed = !added.is_empty();
        symbols.extend(added);
        Ok(self.changed(changed))
    }

    /// A directory was removed: drop every symbol inside it.
    #[instrument(level = "debug", skip(self), fields(sprite = %self.name))]
    pub async fn handle_unlink_dir(&self, folder: &Path) -> Result<bool> {
        let folder = self.backend.resolve_path(folder);
        let mut symbols = self.symbols.lock().await;
        let before = symbols.len();
        symbols.retain(|symbol| !symbol.file_path().starts_with(&folder));
        Ok(self.changed(before != symbols.len()))
    }

    fn changed(&self, changed: bool) -> bool {
        if changed {
            self.reset();
        }
        changed
    }

    fn symbol(&self, path: PathBuf) -> Result<Arc<Symbol>> {
        let symbol = Symbol::new(path, self.options.symbol_pipeline.clone(), self.backend.clone())?;
        Ok(Arc::new(symbol))
    }

    async fn resolve_patterns(&self) -> Result<Vec<PathBuf>> {
        if self.options.import_patterns.is_empty() {
            return Ok(Vec::new());
        }
        self.backend
            .resolve(&self.options.import_patterns)
            .await
            .or_raise(|| ErrorKind::Storage(format!("cannot resolve import patterns of sprite '{}'", self.name)))
    }
}

impl std::fmt::Debug for Sprite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sprite").field("name", &self.name).field("dev", &self.dev).finish_non_exhaustive()
    }
}

async fn processed_entries(symbols: Vec<Arc<Symbol>>) -> Vec<ProcessedEntry> {
    let results = join_all(symbols.iter().map(|symbol| symbol.processed())).await;
    let mut entries: Vec<ProcessedEntry> = symbols
        .into_iter()
        .zip(results)
        .filter_map(|(symbol, processed)| processed.map(|processed| ProcessedEntry { symbol, processed }))
        .collect();
    entries.sort_by(|a, b| a.symbol.id().cmp(b.symbol.id()));
    entries
}

pub(crate) fn sprite_file_name(name: &str, hash: &str, dev: bool) -> String {
    match dev {
        true => format!("sprite.{name}.{hash}.svg"),
        false => format!("sprite-{name}.{hash}.svg"),
    }
}

pub(crate) fn content_hash(content: &str) -> String {
    let hash = blake3::hash(content.as_bytes()).to_hex();
    hash.as_str()[..16].to_string()
}

#[instrument(level = "debug", skip(symbols, pipeline))]
async fn assemble(name: &str, symbols: Vec<Arc<Symbol>>, pipeline: &Pipeline, dev: bool) -> Result<SpriteContent> {
    let mut defs = Element::new("defs");
    for entry in processed_entries(symbols).await {
        let path = entry.symbol.file_path();
        if dev {
            defs.children.push(Node::Text("\n\n".to_string()));
            defs.children.push(Node::Comment(format!(" File: {} ", path.display())));
            defs.children.push(Node::Text("\n".to_string()));
        }
        let mut symbol = Element::new("symbol");
        symbol.attributes = entry.processed.attributes.clone();
        symbol.attributes.set("id", entry.symbol.id());
        symbol.children = parse(&entry.processed.content).or_raise(|| ErrorKind::MalformedSvg(path.to_path_buf()))?;
        defs.children.push(symbol.into());
    }
    let mut svg = Element::new("svg")
        .with_attribute("xmlns", SVG_NAMESPACE)
        .with_attribute("version", "1.1")
        .with_child(defs);
    pipeline
        .run(&mut svg, &ProcessorContext::sprite(name))
        .await
        .map_err(|err| ErrorKind::processor(name, err))?;
    let content = svg.to_string();
    Ok(SpriteContent { hash: content_hash(&content), content })
}
