//! Highlight storage and the style-ID registry.
//!
//! Language-aware tokenizing is left to callers; they feed the results in as
//! highlights referencing registered style IDs.

mod index;
mod syntax;

pub use index::{Highlight, HighlightIndex};
pub use syntax::{SyntaxStyle, SyntaxStyleRegistry};
