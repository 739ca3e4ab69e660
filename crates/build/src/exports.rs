use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::error::Result;
use crate::symbol::ProcessedSymbol;
use crate::template;

/// Options handed through to the runtime untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeOptions {
    pub aria_hidden: bool,
}

/// Everything the runtime needs to know about the current sprites.
///
/// Always rebuilt from scratch; symbol names are `<prefix><id>`, where the
/// prefix is empty for the default sprite and `<sprite>/` otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exports {
    pub dev: bool,
    pub runtime_options: RuntimeOptions,
    /// Sprite name to public URL.
    pub sprite_paths: BTreeMap<String, String>,
    /// Sorted, without duplicates.
    pub symbol_names: Vec<String>,
    /// Symbol name to processed symbol, for inlining.
    pub inline: BTreeMap<String, Arc<ProcessedSymbol>>,
    /// Symbol name to the module that loads it on demand. Empty in dev,
    /// where everything is inlined.
    pub loaders: BTreeMap<String, String>,
}

/// A file to write into the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Relative to the output directory.
    pub path: PathBuf,
    pub contents: String,
}

impl GeneratedFile {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self { path: path.into(), contents: contents.into() }
    }
}

/// Module path of the on-demand loader for `name`.
pub(crate) fn loader_module(name: &str) -> String {
    format!("symbols/{name}.js")
}

impl Exports {
    /// Renders `runtime.js`, `runtime.d.ts`, `symbol-import.js`,
    /// `symbol-import.d.ts` and, outside dev, one module per symbol.
    pub fn render(&self) -> Result<Vec<GeneratedFile>> {
        template::render_modules(self)
    }
}
