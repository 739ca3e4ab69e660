//! Processors transform a parsed `<svg>` element in place.
//!
//! A [`Processor`] is a named closure, optionally asynchronous, that receives
//! the root element and a [`ProcessorContext`]. Processors are chained into a
//! [`Pipeline`] and run strictly one after the other. Each sprite has two
//! pipelines: one applied to every icon before it becomes a `<symbol>`, and one
//! applied to the finished sprite document.
//!
//! The built-ins can be created directly or described in configuration as a
//! [`ProcessorSpec`].

mod builtin;
mod consts;
pub mod error;
mod processor;
mod spec;

pub use crate::builtin::{
    DEFAULT_KEEP_COLOR_ATTRIBUTE, css_prefix, force_current_color, remove_sizes, remove_tags,
};
pub use crate::processor::{Pipeline, Processor, ProcessorContext};
pub use crate::spec::ProcessorSpec;
