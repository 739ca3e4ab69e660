//! Turns directories of SVG icons into sprites and the runtime modules that
//! describe them.
//!
//! A [`Collector`] owns one [`Sprite`] per configured name. Each sprite owns a
//! [`Symbol`] per matched file; symbols are processed lazily and cached, and
//! sprites assemble their symbols into a single `<svg>` on demand. Filesystem
//! events ([`WatchEvent`]) invalidate only what they touch.

mod collector;
mod consts;
pub mod error;
mod event;
mod exports;
mod identifier;
mod sprite;
mod symbol;
mod template;

pub use crate::collector::{Collector, CollectorOptions};
pub use crate::consts::{DEV_SPRITE_ROUTE, EMPTY_SPRITE};
pub use crate::event::{EventKind, WatchEvent};
pub use crate::exports::{Exports, GeneratedFile, RuntimeOptions};
pub use crate::identifier::sanitize;
pub use crate::sprite::{ProcessedEntry, Sprite, SpriteContent, SpriteOptions};
pub use crate::symbol::{ProcessedSymbol, Symbol};
