//! Small async building blocks shared between the other crates.
//!
//! Currently only [`Memo`]: a lazily computed, invalidatable value whose
//! in-flight computation is shared between concurrent callers.

mod memo;

pub use crate::memo::Memo;
