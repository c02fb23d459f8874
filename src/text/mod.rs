//! Text storage, wrapped layout and editing.
//!
//! Key types:
//!
//! - [`TextBuffer`]: rope-backed text with a per-line cell ledger, highlights
//!   and a memory registry
//! - [`TextBufferView`]: wrap, viewport and selection over a buffer
//! - [`EditBuffer`]: editable buffer with cursor movement and undo/redo
//! - [`EditorView`]: visual (wrapped) cursor, scroll-follow and placeholder
//! - [`BufferArena`]: generation-checked ownership of buffers sharing a pool
//!
//! Offsets are UTF-8 byte offsets; `(row, col)` columns count scalars; wrap
//! widths and visual columns are terminal cells.
//!
//! # Examples
//!
//! ## Basic Text Buffer
//!
//! ```
//! use opentui_text::TextBuffer;
//!
//! let buffer = TextBuffer::from_text("Hello, world!\nsecond").unwrap();
//! assert_eq!(buffer.len_chars(), 20);
//! assert_eq!(buffer.line_count(), 2);
//! ```
//!
//! ## Wrapped Layout
//!
//! ```
//! use opentui_text::{TextBuffer, TextBufferView, WrapMode};
//!
//! let buffer = TextBuffer::from_text("the quick brown fox").unwrap();
//! let view = TextBufferView::new(&buffer)
//!     .viewport(0, 0, 10, 5)
//!     .wrap_mode(WrapMode::Word);
//! let info = view.line_info(&buffer).unwrap();
//! assert_eq!(info.starts, vec![0, 10]);
//! assert_eq!(info.wraps, vec![false, true]);
//! ```
//!
//! ## Editable Buffer with Undo
//!
//! ```
//! use opentui_text::EditBuffer;
//!
//! let mut editor = EditBuffer::new();
//! editor.insert_text("Hello").unwrap();
//! editor.commit(); // Create undo checkpoint
//! editor.insert_text(" World").unwrap();
//! editor.commit();
//! assert_eq!(editor.text(), "Hello World");
//!
//! // Undo the last insert
//! editor.undo().unwrap();
//! assert_eq!(editor.text(), "Hello");
//!
//! // Redo brings it back
//! editor.redo().unwrap();
//! assert_eq!(editor.text(), "Hello World");
//! ```

mod arena;
mod buffer;
mod edit;
mod editor;
mod history;
mod lines;
mod mem;
mod rope;
mod segment;
mod view;

pub use arena::{BufferArena, BufferHandle};
pub use buffer::{BufferId, STYLED_CHUNK_REF, TextBuffer};
pub use edit::{CharClass, Cursor, EditBuffer};
pub use editor::{EditorView, VisualCursor};
pub use history::{EditOp, History, HistoryChange, UndoGroup};
pub use lines::CellMetric;
pub use mem::{MemId, MemRegistry, MemSource};
pub use rope::TextRope;
pub use segment::{LineHighlight, StyledChunk, StyledSpan};
pub use view::{
    LineInfo, LocalSelection, Selection, TextBufferView, TextMeasure, Viewport, VisibleRow,
    WrapMode,
};
