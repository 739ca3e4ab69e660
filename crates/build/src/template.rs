//! Runtime modules generated from [`Exports`].
//!
//! Templates are [upon] templates. Anything that ends up as a JavaScript
//! literal goes through the `json` formatter or is serialized up front, so
//! names and markup are always quoted correctly.
//!
//! | File                 | Contents                                          |
//! |----------------------|---------------------------------------------------|
//! | `runtime.js`         | `spritePaths`, `runtimeOptions`, `allSymbolNames` |
//! | `runtime.d.ts`       | the symbol name union and the declarations above  |
//! | `symbol-import.js`   | `SYMBOL_IMPORTS`, inline or lazily loaded         |
//! | `symbol-import.d.ts` | types for `SYMBOL_IMPORTS`                        |
//! | `symbols/<name>.js`  | one module per symbol, outside dev only           |

use exn::ResultExt;
use iconsprite_dom::Attributes;
use serde::Serialize;
use tracing::instrument;
use upon::Engine;

use crate::error::{ErrorKind, Result};
use crate::exports::{Exports, GeneratedFile};
use crate::symbol::ProcessedSymbol;

const RUNTIME: &str = "export const spritePaths = Object.freeze({{ sprite_paths }})
export const runtimeOptions = Object.freeze({{ runtime_options }})
export const allSymbolNames = Object.freeze({{ symbol_names }})
";

const RUNTIME_TYPES: &str = "declare module '#iconsprite/runtime' {
  /**
   * Keys of all generated SVG sprite symbols.
   */
  export type SpriteSymbolName =
    | {% for name in symbol_names %}{{ name|json }}{% if not loop.last %}
    | {% endif %}{% endfor %}{% if not has_symbols %}string{% endif %}

  /**
   * Runtime options of the module.
   */
  export type RuntimeOptions = {
    ariaHidden: boolean
  }

  /**
   * The public URL of every sprite.
   */
  export const spritePaths: Readonly<Record<string, string>>;

  /**
   * Runtime options of the module.
   */
  export const runtimeOptions: Readonly<RuntimeOptions>;

  /**
   * Every symbol name, sorted.
   */
  export const allSymbolNames: Readonly<SpriteSymbolName[]>;
}
";

const SYMBOL_IMPORT: &str = "export const SYMBOL_IMPORTS = {
{%- for entry in entries %}
  {{ entry.name|json }}: {% if dev %}{{ entry.inline }}{% else %}import.meta.client ? () => import('./{{ entry.module }}').then(v => v.default) : {{ entry.inline }}{% endif %}{% if not loop.last %},{% endif %}
{%- endfor %}
}
";

const SYMBOL_IMPORT_TYPES: &str = "declare module '#iconsprite/symbol-import' {
  import type { SpriteSymbolName } from './runtime'

  type SymbolImport = {
    content: string
    attributes: Record<string, string>
  }

  type SymbolImportDynamic = () => Promise<SymbolImport>

  export const SYMBOL_IMPORTS: Record<SpriteSymbolName, SymbolImport | SymbolImportDynamic>
}
";

const SYMBOL_MODULE: &str = "export default {{ inline }}\n";

#[derive(Serialize)]
struct InlineSymbol<'a> {
    content: &'a str,
    attributes: &'a Attributes,
}

#[derive(Serialize)]
struct ImportEntry<'a> {
    name: &'a str,
    inline: String,
    module: &'a str,
}

#[derive(Serialize)]
struct RuntimeContext {
    sprite_paths: String,
    runtime_options: String,
    symbol_names: String,
}

#[derive(Serialize)]
struct TypesContext<'a> {
    symbol_names: &'a [String],
    has_symbols: bool,
}

#[derive(Serialize)]
struct ImportContext<'a> {
    dev: bool,
    entries: Vec<ImportEntry<'a>>,
}

#[derive(Serialize)]
struct ModuleContext {
    inline: String,
}

fn inline(processed: &ProcessedSymbol) -> Result<String> {
    let inline = InlineSymbol { content: &processed.content, attributes: &processed.attributes };
    serde_json::to_string(&inline).or_raise(|| ErrorKind::Template("symbol"))
}

fn pretty(value: &impl Serialize, file: &'static str) -> Result<String> {
    serde_json::to_string_pretty(value).or_raise(|| ErrorKind::Template(file))
}

struct Modules {
    engine: Engine<'static>,
}

impl Modules {
    fn new() -> Self {
        let mut engine = Engine::new();
        addons::configure(&mut engine);
        Self { engine }
    }

    fn render(&self, file: &'static str, source: &'static str, context: impl Serialize) -> Result<GeneratedFile> {
        let template = self.engine.compile(source).or_raise(|| ErrorKind::Template(file))?;
        let contents = template.render(&self.engine, context).to_string().or_raise(|| ErrorKind::Template(file))?;
        Ok(GeneratedFile::new(file, contents))
    }
}

#[instrument(level = "debug", skip_all, fields(dev = exports.dev, symbols = exports.symbol_names.len()))]
pub(crate) fn render_modules(exports: &Exports) -> Result<Vec<GeneratedFile>> {
    let modules = Modules::new();
    let mut files = Vec::with_capacity(4 + exports.loaders.len());

    files.push(modules.render(
        "runtime.js",
        RUNTIME,
        RuntimeContext {
            sprite_paths: pretty(&exports.sprite_paths, "runtime.js")?,
            runtime_options: serde_json::to_string(&exports.runtime_options)
                .or_raise(|| ErrorKind::Template("runtime.js"))?,
            symbol_names: pretty(&exports.symbol_names, "runtime.js")?,
        },
    )?);
    files.push(modules.render(
        "runtime.d.ts",
        RUNTIME_TYPES,
        TypesContext { symbol_names: &exports.symbol_names, has_symbols: !exports.symbol_names.is_empty() },
    )?);

    let mut entries = Vec::with_capacity(exports.inline.len());
    for (name, processed) in &exports.inline {
        let module = exports.loaders.get(name).map(String::as_str).unwrap_or_default();
        entries.push(ImportEntry { name, inline: inline(processed)?, module });
    }
    files.push(modules.render(
        "symbol-import.js",
        SYMBOL_IMPORT,
        ImportContext { dev: exports.dev, entries },
    )?);
    files.push(GeneratedFile::new("symbol-import.d.ts", SYMBOL_IMPORT_TYPES));

    if !exports.dev {
        for (name, module) in &exports.loaders {
            let Some(processed) = exports.inline.get(name) else { continue };
            let rendered = modules.render("symbols/<name>.js", SYMBOL_MODULE, ModuleContext { inline: inline(processed)? })?;
            files.push(GeneratedFile::new(module, rendered.contents));
        }
    }
    Ok(files)
}

mod addons {
    use std::fmt::Write;
    use upon::{Engine, Value, fmt as upon_fmt};

    /// Writes strings as quoted JSON string literals.
    fn json_formatter(f: &mut upon_fmt::Formatter<'_>, value: &Value) -> upon_fmt::Result {
        match value {
            Value::String(s) => {
                let quoted = serde_json::to_string(s).map_err(|err| err.to_string())?;
                write!(f, "{quoted}")?
            },
            v => upon_fmt::default(f, v)?,
        };
        Ok(())
    }

    pub(crate) fn configure(engine: &mut Engine<'_>) {
        engine.add_formatter("json", json_formatter);
    }
}
