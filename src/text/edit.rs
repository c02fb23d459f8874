//! Editable text buffer with cursor and undo/redo.
//!
//! This module provides [`EditBuffer`], which wraps a [`TextBuffer`] with
//! editing capabilities including cursor movement, text insertion/deletion,
//! and undo/redo history.
//!
//! # Examples
//!
//! ```
//! use opentui_text::EditBuffer;
//!
//! let mut buf = EditBuffer::with_text("Hello World").unwrap();
//!
//! // Move cursor to end of line and delete backward
//! buf.move_to_line_end();
//! buf.backspace().unwrap(); // Removes 'd'
//! buf.commit(); // Create undo checkpoint
//! assert_eq!(buf.text(), "Hello Worl");
//!
//! // Undo restores deleted text
//! buf.undo().unwrap();
//! assert_eq!(buf.text(), "Hello World");
//! ```

// if-let-else is clearer than map_or for complex logic
#![allow(clippy::option_if_let_else)]

use crate::error::Result;
use crate::grapheme_pool::SharedGraphemePool;
use crate::options::TextOptions;
use crate::text::buffer::TextBuffer;
use crate::text::history::{EditOp, History, HistoryChange, TouchedRange, UndoGroup};
use crate::unicode::{next_grapheme_boundary, prev_grapheme_boundary, tab_stop_width};
use std::path::Path;
use tracing::warn;

/// Cursor position in the buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    /// Byte offset in the buffer.
    pub offset: usize,
    /// Line number (0-indexed).
    pub row: usize,
    /// Column in scalars (0-indexed).
    pub col: usize,
}

impl Cursor {
    /// Create a new cursor at position.
    #[must_use]
    pub const fn new(offset: usize, row: usize, col: usize) -> Self {
        Self { offset, row, col }
    }

    /// Create a cursor at the beginning.
    #[must_use]
    pub fn start() -> Self {
        Self::default()
    }
}

/// Character class used for word-boundary scanning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharClass {
    Word,
    Space,
    Punct,
}

impl CharClass {
    /// Classify a character.
    #[must_use]
    pub fn of(ch: char) -> Self {
        if ch.is_alphanumeric() || ch == '_' {
            Self::Word
        } else if ch.is_whitespace() {
            Self::Space
        } else {
            Self::Punct
        }
    }
}

/// Text buffer with editing operations, cursor, and undo/redo.
///
/// `EditBuffer` is the primary type for text editing. It tracks cursor
/// position, maintains undo/redo history, and provides operations for:
///
/// - **Cursor movement**: Lines, words, grapheme clusters, document bounds
/// - **Text editing**: Insert, delete, backspace with cursor tracking
/// - **Line operations**: New line, delete line
/// - **History**: Grouped undo/redo with configurable depth limit
///
/// Every mutation either applies fully (text, cursor and history) or returns
/// an error with all three unchanged.
///
/// # History Management
///
/// Edit operations are grouped until [`commit`](Self::commit) forces a group
/// boundary (e.g., after a pause in typing). The history depth is bounded
/// (default 1000 groups) to limit memory usage.
#[derive(Debug)]
pub struct EditBuffer {
    buffer: TextBuffer,
    cursor: Cursor,
    /// Display column kept across vertical moves.
    desired_col: Option<usize>,
    history: History,
}

impl Default for EditBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl EditBuffer {
    /// Create a new empty edit buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(TextOptions::default())
    }

    /// Create an edit buffer with its own grapheme pool.
    #[must_use]
    pub fn with_options(options: TextOptions) -> Self {
        Self::from_buffer(TextBuffer::with_options(options), options.max_history_depth)
    }

    /// Create an edit buffer interning into a shared pool.
    #[must_use]
    pub fn with_pool(pool: SharedGraphemePool, options: TextOptions) -> Self {
        Self::from_buffer(
            TextBuffer::with_pool(pool, options),
            options.max_history_depth,
        )
    }

    fn from_buffer(buffer: TextBuffer, max_history_depth: usize) -> Self {
        Self {
            buffer,
            cursor: Cursor::start(),
            desired_col: None,
            history: History::with_max_depth(max_history_depth),
        }
    }

    /// Create an edit buffer with initial text and no history.
    ///
    /// # Errors
    ///
    /// Propagates grapheme pool errors.
    pub fn with_text(text: &str) -> Result<Self> {
        let mut buf = Self::new();
        buf.set_text(text)?;
        Ok(buf)
    }

    /// Set the maximum undo history depth, pruning immediately.
    pub fn set_max_history_depth(&mut self, max_depth: usize) {
        self.history.set_max_depth(max_depth);
    }

    /// Get the current maximum undo history depth.
    #[must_use]
    pub fn max_history_depth(&self) -> usize {
        self.history.max_depth()
    }

    /// Get the underlying text buffer.
    #[must_use]
    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    /// Get mutable access to the text buffer, for highlights and settings.
    ///
    /// Text changed through it bypasses the history; the cursor is clamped
    /// back into the text by the next cursor operation.
    pub fn buffer_mut(&mut self) -> &mut TextBuffer {
        &mut self.buffer
    }

    /// Get the full text content.
    #[must_use]
    pub fn text(&self) -> String {
        self.buffer.plain_text()
    }

    /// The undo history.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Replace the entire text, resetting cursor and history.
    ///
    /// # Errors
    ///
    /// Propagates grapheme pool errors; nothing changes on error.
    pub fn set_text(&mut self, text: &str) -> Result<()> {
        self.buffer.set_text(text)?;
        self.history.clear();
        self.place_cursor(0);
        Ok(())
    }

    /// Replace the entire text as one undoable edit.
    ///
    /// # Errors
    ///
    /// Propagates grapheme pool errors; nothing changes on error.
    pub fn replace_text(&mut self, text: &str) -> Result<()> {
        self.history.commit();
        let len = self.buffer.len_bytes();
        self.edit(0, len, text, 0)?;
        self.history.commit();
        Ok(())
    }

    /// Load a file, resetting cursor and history.
    ///
    /// # Errors
    ///
    /// I/O, encoding or grapheme pool errors, with nothing changed.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.buffer.load_file(path)?;
        self.history.clear();
        self.place_cursor(0);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Cursor
    // ------------------------------------------------------------------

    /// Get the current cursor position.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    fn offset(&self) -> usize {
        self.buffer.rope().clamp_offset(self.cursor.offset)
    }

    fn place_cursor(&mut self, offset: usize) {
        let offset = self.buffer.rope().clamp_offset(offset);
        let (row, col) = self.buffer.rope().offset_to_coords_clamped(offset);
        self.cursor = Cursor::new(offset, row, col);
    }

    fn jump(&mut self, offset: usize) {
        self.place_cursor(offset);
        self.desired_col = None;
    }

    /// Set the cursor by row and scalar column, clamped to the text.
    pub fn set_cursor(&mut self, row: usize, col: usize) {
        let offset = self.buffer.rope().coords_to_offset_clamped(row, col);
        self.jump(offset);
    }

    /// Set the cursor by byte offset, clamped to the text and snapped back to
    /// a char boundary.
    pub fn set_cursor_by_offset(&mut self, offset: usize) {
        self.jump(offset);
    }

    /// Byte offset after the grapheme cluster at `offset`; a line break
    /// always counts as its own step.
    fn next_cluster_end(&self, offset: usize) -> Option<usize> {
        let rope = self.buffer.rope();
        if offset >= rope.len_bytes() {
            return None;
        }
        let row = rope.line_of_offset(offset);
        let (start, end) = rope.line_range(row)?;
        if offset >= end {
            return Some(end + 1);
        }
        let line = rope.line_text(row)?;
        next_grapheme_boundary(&line, offset - start).map(|b| start + b)
    }

    fn prev_cluster_start(&self, offset: usize) -> Option<usize> {
        let rope = self.buffer.rope();
        if offset == 0 {
            return None;
        }
        let row = rope.line_of_offset(offset);
        let (start, _) = rope.line_range(row)?;
        if offset == start {
            return Some(start - 1);
        }
        let line = rope.line_text(row)?;
        prev_grapheme_boundary(&line, offset - start).map(|b| start + b)
    }

    /// Move cursor left by one grapheme cluster. Returns whether it moved.
    pub fn move_left(&mut self) -> bool {
        match self.prev_cluster_start(self.offset()) {
            Some(offset) => {
                self.jump(offset);
                true
            }
            None => false,
        }
    }

    /// Move cursor right by one grapheme cluster. Returns whether it moved.
    pub fn move_right(&mut self) -> bool {
        match self.next_cluster_end(self.offset()) {
            Some(offset) => {
                self.jump(offset);
                true
            }
            None => false,
        }
    }

    fn move_vertical(&mut self, row: usize) {
        let desired = self
            .desired_col
            .unwrap_or_else(|| self.display_col(self.offset()));
        let offset = self.offset_at_display_col(row, desired);
        self.place_cursor(offset);
        self.desired_col = Some(desired);
    }

    /// Move cursor up one logical line, keeping the display column sticky.
    pub fn move_up(&mut self) -> bool {
        self.place_cursor(self.cursor.offset);
        if self.cursor.row == 0 {
            return false;
        }
        self.move_vertical(self.cursor.row - 1);
        true
    }

    /// Move cursor down one logical line, keeping the display column sticky.
    pub fn move_down(&mut self) -> bool {
        self.place_cursor(self.cursor.offset);
        if self.cursor.row + 1 >= self.buffer.line_count() {
            return false;
        }
        self.move_vertical(self.cursor.row + 1);
        true
    }

    /// Move cursor to start of line.
    pub fn move_to_line_start(&mut self) {
        self.jump(self.get_sol());
    }

    /// Move cursor to end of line.
    pub fn move_to_line_end(&mut self) {
        self.jump(self.get_eol());
    }

    /// Jump to the start of a line (clamped).
    pub fn goto_line(&mut self, row: usize) {
        self.set_cursor(row, 0);
    }

    /// Byte offset of the start of the cursor's logical line.
    #[must_use]
    pub fn get_sol(&self) -> usize {
        let rope = self.buffer.rope();
        let row = rope.line_of_offset(self.offset());
        rope.line_range(row).map_or(0, |(start, _)| start)
    }

    /// Byte offset of the end of the cursor's logical line, before its `\n`.
    #[must_use]
    pub fn get_eol(&self) -> usize {
        let rope = self.buffer.rope();
        let row = rope.line_of_offset(self.offset());
        rope.line_range(row).map_or(self.offset(), |(_, end)| end)
    }

    /// Display column of `offset` within its logical line, tabs expanded.
    #[must_use]
    pub fn display_col(&self, offset: usize) -> usize {
        let rope = self.buffer.rope();
        let row = rope.line_of_offset(offset);
        let Some((start, _)) = rope.line_range(row) else {
            return 0;
        };
        let tab_width = usize::from(self.buffer.tab_width().max(1));
        let mut pos = start;
        let mut col = 0;
        for m in self.buffer.line_metrics(row) {
            if pos + m.len > offset {
                break;
            }
            pos += m.len;
            col += if m.is_tab {
                tab_stop_width(col, tab_width)
            } else {
                m.width
            };
        }
        col
    }

    /// Byte offset on `row` at display column `target`, snapped to the start
    /// of the cluster covering it, or the line end if the line is shorter.
    #[must_use]
    pub fn offset_at_display_col(&self, row: usize, target: usize) -> usize {
        let rope = self.buffer.rope();
        let Some((start, end)) = rope.line_range(row) else {
            return rope.len_bytes();
        };
        let tab_width = usize::from(self.buffer.tab_width().max(1));
        let mut pos = start;
        let mut col = 0;
        for m in self.buffer.line_metrics(row) {
            let width = if m.is_tab {
                tab_stop_width(col, tab_width)
            } else {
                m.width
            };
            if col + width > target {
                return pos;
            }
            col += width;
            pos += m.len;
        }
        end
    }

    // ------------------------------------------------------------------
    // Words
    // ------------------------------------------------------------------

    /// First class boundary strictly after the cursor, or `None` at the end.
    #[must_use]
    pub fn next_word_boundary(&self) -> Option<usize> {
        self.boundary_after(self.offset())
    }

    /// First class boundary strictly before the cursor, or `None` at the start.
    #[must_use]
    pub fn prev_word_boundary(&self) -> Option<usize> {
        self.boundary_before(self.offset())
    }

    fn boundary_after(&self, offset: usize) -> Option<usize> {
        let rope = self.buffer.rope().inner();
        if offset >= rope.len_bytes() {
            return None;
        }
        let mut chars = rope.chars_at(rope.byte_to_char(offset));
        let first = chars.next()?;
        let class = CharClass::of(first);
        let mut pos = offset + first.len_utf8();
        for ch in chars {
            if CharClass::of(ch) != class {
                break;
            }
            pos += ch.len_utf8();
        }
        Some(pos)
    }

    fn boundary_before(&self, offset: usize) -> Option<usize> {
        let rope = self.buffer.rope().inner();
        if offset == 0 {
            return None;
        }
        let mut chars = rope.chars_at(rope.byte_to_char(offset));
        let first = chars.prev()?;
        let class = CharClass::of(first);
        let mut pos = offset - first.len_utf8();
        while let Some(ch) = chars.prev() {
            if CharClass::of(ch) != class {
                break;
            }
            pos -= ch.len_utf8();
        }
        Some(pos)
    }

    fn class_at(&self, offset: usize) -> Option<CharClass> {
        let rope = self.buffer.rope().inner();
        (offset < rope.len_bytes()).then(|| CharClass::of(rope.char(rope.byte_to_char(offset))))
    }

    /// End of the next word, skipping whitespace runs.
    fn word_end_after(&self, offset: usize) -> Option<usize> {
        let mut pos = offset;
        loop {
            let class = self.class_at(pos);
            pos = self.boundary_after(pos)?;
            if class != Some(CharClass::Space) {
                return Some(pos);
            }
        }
    }

    /// Start of the previous word, skipping whitespace runs.
    fn word_start_before(&self, offset: usize) -> Option<usize> {
        let mut pos = offset;
        loop {
            let next = self.boundary_before(pos)?;
            let class = self.class_at(next);
            pos = next;
            if class != Some(CharClass::Space) {
                return Some(pos);
            }
        }
    }

    /// Move cursor to the end of the next word.
    pub fn move_word_right(&mut self) -> bool {
        match self.word_end_after(self.offset()) {
            Some(offset) => {
                self.jump(offset);
                true
            }
            None => false,
        }
    }

    /// Move cursor to the start of the previous word.
    pub fn move_word_left(&mut self) -> bool {
        match self.word_start_before(self.offset()) {
            Some(offset) => {
                self.jump(offset);
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    /// Splice and record, leaving the cursor at `cursor_after`.
    fn edit(&mut self, start: usize, end: usize, text: &str, cursor_after: usize) -> Result<()> {
        let removed = self.buffer.get_text_range(start, end);
        let cursor_before = self.offset();
        self.buffer.splice(start, end, text)?;
        if !removed.is_empty() {
            self.history.push(
                EditOp::Delete {
                    offset: start,
                    text: removed,
                },
                cursor_before,
                cursor_after,
            );
        }
        if !text.is_empty() {
            self.history.push(
                EditOp::Insert {
                    offset: start,
                    text: text.to_owned(),
                },
                cursor_before,
                cursor_after,
            );
        }
        self.jump(cursor_after);
        Ok(())
    }

    /// Insert text at the cursor, leaving the cursor after it.
    ///
    /// # Errors
    ///
    /// Propagates grapheme pool errors; nothing changes on error.
    pub fn insert_text(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let offset = self.offset();
        self.edit(offset, offset, text, offset + text.len())
    }

    /// Insert a line break at the cursor.
    ///
    /// # Errors
    ///
    /// Propagates grapheme pool errors.
    pub fn new_line(&mut self) -> Result<()> {
        self.insert_text("\n")
    }

    /// Delete the bytes between two offsets (in either order), leaving the
    /// cursor at the start. Returns `Ok(false)` for an empty range.
    ///
    /// # Errors
    ///
    /// Range errors for offsets outside the text or inside a codepoint, and
    /// grapheme pool errors. Nothing changes on error.
    pub fn delete_range_offsets(&mut self, a: usize, b: usize) -> Result<bool> {
        let (start, end) = (a.min(b), a.max(b));
        self.buffer.rope().check_range(start, end)?;
        if start == end {
            return Ok(false);
        }
        self.edit(start, end, "", start)?;
        Ok(true)
    }

    /// Delete between two `(row, col)` positions.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCoords`](crate::Error::InvalidCoords) for positions
    /// outside the text, and grapheme pool errors.
    pub fn delete_range(
        &mut self,
        start_row: usize,
        start_col: usize,
        end_row: usize,
        end_col: usize,
    ) -> Result<bool> {
        let rope = self.buffer.rope();
        let start = rope.coords_to_offset(start_row, start_col)?;
        let end = rope.coords_to_offset(end_row, end_col)?;
        self.delete_range_offsets(start, end)
    }

    /// Delete the grapheme cluster before the cursor. Returns `Ok(false)`,
    /// changing nothing, at the start of the text.
    ///
    /// # Errors
    ///
    /// Propagates grapheme pool errors.
    pub fn backspace(&mut self) -> Result<bool> {
        let end = self.offset();
        let Some(start) = self.prev_cluster_start(end) else {
            return Ok(false);
        };
        self.edit(start, end, "", start)?;
        Ok(true)
    }

    /// Delete the grapheme cluster after the cursor. Returns `Ok(false)`,
    /// changing nothing, at the end of the text.
    ///
    /// # Errors
    ///
    /// Propagates grapheme pool errors.
    pub fn delete_forward(&mut self) -> Result<bool> {
        let start = self.offset();
        let Some(end) = self.next_cluster_end(start) else {
            return Ok(false);
        };
        self.edit(start, end, "", start)?;
        Ok(true)
    }

    /// Delete from the cursor to the end of the next word.
    ///
    /// # Errors
    ///
    /// Propagates grapheme pool errors.
    pub fn delete_word_forward(&mut self) -> Result<bool> {
        let start = self.offset();
        match self.word_end_after(start) {
            Some(end) => self.delete_range_offsets(start, end),
            None => Ok(false),
        }
    }

    /// Delete from the start of the previous word to the cursor.
    ///
    /// # Errors
    ///
    /// Propagates grapheme pool errors.
    pub fn delete_word_backward(&mut self) -> Result<bool> {
        let end = self.offset();
        match self.word_start_before(end) {
            Some(start) => self.delete_range_offsets(start, end),
            None => Ok(false),
        }
    }

    /// Delete the cursor's line with its line break, leaving the cursor at the
    /// start of the line that takes its place. On a single-line buffer the
    /// line is emptied. Returns `Ok(false)` if there was nothing to delete.
    ///
    /// # Errors
    ///
    /// Propagates grapheme pool errors.
    pub fn delete_line(&mut self) -> Result<bool> {
        let rope = self.buffer.rope();
        let row = rope.line_of_offset(self.offset());
        let Some((start, end)) = rope.line_range(row) else {
            return Ok(false);
        };
        let (start, end, cursor) = if end < rope.len_bytes() {
            (start, end + 1, start)
        } else if row > 0 {
            let prev_start = rope.line_start(row - 1).unwrap_or(0);
            (start - 1, end, prev_start)
        } else {
            (start, end, start)
        };
        if start == end {
            return Ok(false);
        }
        self.edit(start, end, "", cursor)?;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// Apply ops, rolling back the applied prefix if one fails.
    fn apply_ops<'a>(&mut self, ops: impl Iterator<Item = &'a EditOp>) -> Result<TouchedRange> {
        let mut touched = TouchedRange::default();
        let mut applied: Vec<&EditOp> = Vec::new();
        for op in ops {
            let (start, removed, text) = op.as_splice();
            if let Err(err) = self.buffer.splice(start, start + removed, text) {
                for done in applied.iter().rev() {
                    let inverse = done.invert();
                    let (start, removed, text) = inverse.as_splice();
                    if let Err(rollback) = self.buffer.splice(start, start + removed, text) {
                        warn!(%rollback, "history rollback failed");
                    }
                }
                return Err(err);
            }
            touched.record(start, removed, text.len());
            applied.push(op);
        }
        Ok(touched)
    }

    /// Undo the newest group. Returns `Ok(None)`, changing nothing, when
    /// there is nothing to undo.
    ///
    /// # Errors
    ///
    /// Propagates grapheme pool errors; the text and both stacks are left as
    /// they were.
    pub fn undo(&mut self) -> Result<Option<HistoryChange>> {
        let Some(group) = self.history.pop_undo() else {
            return Ok(None);
        };
        let inverted: Vec<EditOp> = group.ops().iter().rev().map(EditOp::invert).collect();
        match self.apply_ops(inverted.iter()) {
            Ok(touched) => {
                self.jump(group.cursor_before());
                let change = change_of(touched, group.cursor_before(), &group);
                self.history.push_redo(group);
                Ok(Some(change))
            }
            Err(err) => {
                self.history.push_undo(group);
                Err(err)
            }
        }
    }

    /// Redo the newest undone group. Returns `Ok(None)` when there is nothing
    /// to redo.
    ///
    /// # Errors
    ///
    /// Propagates grapheme pool errors; the text and both stacks are left as
    /// they were.
    pub fn redo(&mut self) -> Result<Option<HistoryChange>> {
        let Some(group) = self.history.pop_redo() else {
            return Ok(None);
        };
        match self.apply_ops(group.ops().iter()) {
            Ok(touched) => {
                self.jump(group.cursor_after());
                let change = change_of(touched, group.cursor_after(), &group);
                self.history.push_undo(group);
                Ok(Some(change))
            }
            Err(err) => {
                self.history.push_redo(group);
                Err(err)
            }
        }
    }

    /// Check if undo is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Check if redo is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Commit current edits as an undo group.
    pub fn commit(&mut self) {
        self.history.commit();
    }

    /// Commit current edits with a payload returned by undo and redo.
    pub fn commit_with_meta(&mut self, meta: impl Into<Vec<u8>>) {
        self.history.commit_with_meta(meta.into());
    }

    /// Clear the undo/redo history.
    ///
    /// This removes all undo and redo entries. Useful when loading new content
    /// where previous history is no longer relevant.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

fn change_of(touched: TouchedRange, cursor: usize, group: &UndoGroup) -> HistoryChange {
    let (start, end) = touched.bounds();
    HistoryChange {
        start,
        end,
        cursor,
        meta: group.meta().to_vec(),
    }
}
