//! A deliberately small, mutable element tree for SVG documents.
//!
//! Parsing is done by `quick-xml`; everything after that (traversal,
//! mutation, selector matching, serialization) works on plain owned structs so
//! processors can freely rewrite the tree in place.
//!
//! Serialization is not byte-for-byte faithful: elements are always written
//! with an explicit end tag, attribute values are re-escaped, and the XML
//! declaration, processing instructions and doctypes are dropped.

pub mod error;
mod node;
mod parse;
mod selector;

pub use crate::node::{Attributes, Element, Node, find, find_mut};
pub use crate::parse::parse;
pub use crate::selector::Selector;
