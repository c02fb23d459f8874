//! `opentui_text` - Unicode-correct text core for terminal UIs
//!
//! Rope-backed text storage with a per-line cell ledger, width-aware wrapped
//! layout, and an editing layer with grapheme-aware cursor movement and
//! grouped undo/redo. Multi-byte clusters are interned in a reference-counted
//! [`GraphemePool`] shared by every buffer of a session.
//!
//! ```
//! use opentui_text::{EditorView, WrapMode};
//!
//! let mut editor = EditorView::empty();
//! editor.set_wrap_mode(WrapMode::Word);
//! editor.set_viewport(0, 0, 10, 4, false).unwrap();
//! editor.insert_text("the quick brown fox").unwrap();
//!
//! let cursor = editor.get_visual_cursor().unwrap();
//! assert_eq!((cursor.visual_row, cursor.visual_col), (1, 9));
//! assert_eq!((cursor.logical_row, cursor.logical_col), (0, 19));
//! ```

// Crate-level lint configuration
#![forbid(unsafe_code)]
#![allow(clippy::cast_possible_truncation)] // Intentional coordinate casts
#![allow(clippy::cast_sign_loss)] // Intentional coordinate conversions
#![allow(clippy::cast_precision_loss)] // Intentional for color math
#![allow(clippy::module_name_repetitions)] // Allow TextBuffer in text etc
#![allow(clippy::missing_const_for_fn)] // Many functions could be const, not critical
#![allow(clippy::doc_markdown)] // Allow technical names without backticks
#![allow(clippy::use_self)] // Allow explicit type names in impl blocks
#![allow(clippy::suboptimal_flops)] // Standard math notation is clearer than mul_add
#![allow(clippy::collapsible_if)] // Sometimes nested ifs are clearer
#![allow(clippy::cast_lossless)] // as casts are fine for primitive widening
#![allow(clippy::items_after_statements)] // Common pattern in tests
#![allow(clippy::redundant_clone)] // Clones in tests for clarity are fine
#![allow(clippy::needless_collect)] // Collect for assertions is clear

pub mod cell;
pub mod color;
pub mod error;
pub mod grapheme_pool;
pub mod highlight;
pub mod link;
pub mod options;
pub mod style;
pub mod text;
pub mod unicode;

// Re-export core types at crate root
pub use cell::{CellCode, GraphemeHandle};
pub use color::Rgba;
pub use error::{Error, Result};
pub use grapheme_pool::{GraphemePool, PoolStats, SharedGraphemePool};
pub use highlight::{Highlight, SyntaxStyleRegistry};
pub use link::LinkPool;
pub use options::TextOptions;
pub use style::{Style, TextAttributes};
pub use text::{
    BufferArena, BufferHandle, BufferId, Cursor, EditBuffer, EditorView, HistoryChange, LineInfo,
    MemId, MemSource, StyledChunk, StyledSpan, TextBuffer, TextBufferView, TextMeasure,
    VisualCursor, WrapMode,
};
pub use unicode::WidthMethod;
