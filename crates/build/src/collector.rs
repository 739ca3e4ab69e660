use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use futures::future::{join_all, try_join_all};
use iconsprite_config::Settings;
use iconsprite_storage::BackendHandle;
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;

use crate::consts::{DEV_SPRITE_ROUTE, EMPTY_SPRITE};
use crate::error::Result;
use crate::event::{EventKind, WatchEvent};
use crate::exports::{Exports, GeneratedFile, RuntimeOptions, loader_module};
use crate::sprite::{Sprite, SpriteOptions, sprite_file_name};
use crate::symbol::ProcessedSymbol;

/// Collector-wide settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorOptions {
    pub dev: bool,
    /// Public URL directory built sprites are served from, with a trailing
    /// slash.
    pub assets_dir: String,
    pub runtime_options: RuntimeOptions,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self { dev: false, assets_dir: "/".to_string(), runtime_options: RuntimeOptions::default() }
    }
}

impl CollectorOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            dev: settings.dev,
            assets_dir: settings.public_assets_dir(),
            runtime_options: RuntimeOptions { aria_hidden: settings.aria_hidden },
        }
    }
}

/// Owns every sprite and the export tables derived from them.
///
/// Filesystem events go through [`dispatch()`](Self::dispatch) one at a time.
/// Readers of [`exports()`](Self::exports) always get a complete snapshot:
/// either the one before an event or the one after it.
pub struct Collector {
    sprites: Vec<Sprite>,
    options: CollectorOptions,
    exports: RwLock<Arc<Exports>>,
    events: Mutex<()>,
}

impl Collector {
    /// Sprites are kept in name order; a repeated name replaces the earlier
    /// one.
    pub fn new(
        sprites: impl IntoIterator<Item = (String, SpriteOptions)>,
        options: CollectorOptions,
        backend: BackendHandle,
    ) -> Self {
        let sprites: BTreeMap<String, SpriteOptions> = sprites.into_iter().collect();
        let sprites = sprites
            .into_iter()
            .map(|(name, sprite_options)| Sprite::new(name, sprite_options, options.dev, backend.clone()))
            .collect();
        Self { sprites, options, exports: RwLock::new(Arc::new(Exports::default())), events: Mutex::new(()) }
    }

    /// Builds a collector for every configured sprite. The `default` sprite
    /// exists even when the settings don't mention it.
    pub fn from_settings(settings: &Settings, backend: BackendHandle) -> Result<Self> {
        let mut settings = settings.clone();
        settings.ensure_default_sprite();
        let sprites = settings
            .sprites
            .iter()
            .map(|(name, sprite)| Ok((name.clone(), SpriteOptions::from_settings(name, sprite)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(sprites, CollectorOptions::from_settings(&settings), backend))
    }

    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites
    }

    pub fn sprite(&self, name: &str) -> Option<&Sprite> {
        self.sprites.iter().find(|sprite| sprite.name() == name)
    }

    pub fn options(&self) -> &CollectorOptions {
        &self.options
    }

    /// Initialises every sprite concurrently, then builds the exports.
    #[instrument(skip(self), fields(sprites = self.sprites.len()))]
    pub async fn init(&self) -> Result<()> {
        try_join_all(self.sprites.iter().map(Sprite::init)).await?;
        self.regenerate_exports().await?;
        Ok(())
    }

    /// The last committed export tables.
    pub async fn exports(&self) -> Arc<Exports> {
        self.exports.read().await.clone()
    }

    /// Rebuilds the export tables from scratch and publishes them.
    ///
    /// A symbol name produced twice keeps its first symbol, in sprite name
    /// then id order.
    #[instrument(level = "debug", skip(self))]
    pub async fn regenerate_exports(&self) -> Result<Arc<Exports>> {
        let built = try_join_all(self.sprites.iter().map(|sprite| async move {
            let content = sprite.content().await?;
            let symbols = sprite.processed_symbols().await;
            Ok::<_, crate::error::Error>((sprite, content, symbols))
        }))
        .await?;

        let mut sprite_paths = BTreeMap::new();
        let mut inline: BTreeMap<String, Arc<ProcessedSymbol>> = BTreeMap::new();
        for (sprite, content, symbols) in built {
            let file_name = sprite_file_name(sprite.name(), &content.hash, self.options.dev);
            let path = match self.options.dev {
                true => format!("{DEV_SPRITE_ROUTE}{file_name}"),
                false => format!("{}{file_name}", self.options.assets_dir),
            };
            sprite_paths.insert(sprite.name().to_string(), path);

            let prefix = sprite.prefix();
            for entry in symbols {
                match inline.entry(format!("{prefix}{}", entry.symbol.id())) {
                    Entry::Vacant(vacant) => {
                        vacant.insert(entry.processed);
                    },
                    Entry::Occupied(occupied) => tracing::warn!(
                        symbol = %occupied.key(),
                        path = %entry.symbol.file_path().display(),
                        "duplicate symbol name, keeping the first"
                    ),
                }
            }
        }

        let loaders = match self.options.dev {
            true => BTreeMap::new(),
            false => inline.keys().map(|name| (name.clone(), loader_module(name))).collect(),
        };
        let exports = Arc::new(Exports {
            dev: self.options.dev,
            runtime_options: self.options.runtime_options,
            sprite_paths,
            symbol_names: inline.keys().cloned().collect(),
            inline,
            loaders,
        });
        *self.exports.write().await = exports.clone();
        tracing::debug!(symbols = exports.symbol_names.len(), "exports regenerated");
        Ok(exports)
    }

    /// Hands an event to every sprite and regenerates the exports once if
    /// any of them changed. Returns whether anything changed.
    ///
    /// A failing sprite doesn't stop the others; the first error is returned
    /// after the exports are brought up to date.
    #[instrument(skip(self), fields(kind = %event.kind, path = %event.path.display()))]
    pub async fn dispatch(&self, event: &WatchEvent) -> Result<bool> {
        let _guard = self.events.lock().await;
        let results = join_all(self.sprites.iter().map(|sprite| async move {
            match event.kind {
                EventKind::Add => sprite.handle_add(&event.path).await,
                EventKind::Change => sprite.handle_change(&event.path).await,
                EventKind::Unlink => sprite.handle_unlink(&event.path).await,
                EventKind::AddDir => sprite.handle_add_dir().await,
                EventKind::UnlinkDir => sprite.handle_unlink_dir(&event.path).await,
            }
        }))
        .await;
        let changed = results.iter().any(|result| matches!(result, Ok(true)));
        if changed {
            self.regenerate_exports().await?;
        }
        for result in results {
            result?;
        }
        Ok(changed)
    }

    /// Sprite markup for a dev server request. The sprite name is the second
    /// dot-separated part of the last path segment
    /// (`/__iconsprite/sprite.<name>.<hash>.svg`); unknown names get an empty
    /// SVG.
    #[instrument(level = "debug", skip(self))]
    pub async fn serve(&self, url: &str) -> Result<String> {
        let file_name = url.rsplit('/').next().unwrap_or(url);
        match file_name.split('.').nth(1).and_then(|name| self.sprite(name)) {
            Some(sprite) => Ok(sprite.content().await?.content.clone()),
            None => Ok(EMPTY_SPRITE.to_string()),
        }
    }

    /// Every file to write into the output directory: one SVG per sprite plus
    /// the generated modules, all from the current exports.
    ///
    /// Sprites are named after the last segment of their URL, so in dev mode
    /// serving the output directory under the dev route is an alternative to
    /// [`serve()`](Self::serve).
    pub async fn artifacts(&self) -> Result<Vec<GeneratedFile>> {
        let mut files = Vec::with_capacity(self.sprites.len());
        for sprite in &self.sprites {
            let content = sprite.content().await?;
            files.push(GeneratedFile::new(sprite.file_name().await?, content.content.clone()));
        }
        files.extend(self.exports().await.render()?);
        Ok(files)
    }
}

impl std::fmt::Debug for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector").field("sprites", &self.sprites).field("options", &self.options).finish_non_exhaustive()
    }
}
