//! Byte-addressed rope storage using the ropey crate.
//!
//! All offsets are UTF-8 byte offsets. Rows are separated by `\n` only; columns
//! count Unicode scalar values from the start of a row.

use crate::error::{Error, Result};
use ropey::{Rope, RopeSlice};
use std::fmt;

/// Text storage with strict, byte-addressed editing.
///
/// Strict methods reject offsets past the end ([`Error::OutOfRange`]) or inside
/// a codepoint ([`Error::NotCharBoundary`]). The `*_clamped` variants snap to the
/// nearest valid position instead.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextRope {
    rope: Rope,
}

impl TextRope {
    /// Create an empty rope.
    #[must_use]
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// Create a rope from a string.
    #[must_use]
    pub fn from_text(s: &str) -> Self {
        Self {
            rope: Rope::from_str(s),
        }
    }

    /// Number of bytes.
    #[must_use]
    pub fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    /// Number of Unicode scalar values.
    #[must_use]
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Number of rows: one more than the number of `\n`.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rope.len_bytes() == 0
    }

    /// Whether `offset` is a valid insertion point.
    #[must_use]
    pub fn is_char_boundary(&self, offset: usize) -> bool {
        if offset > self.len_bytes() {
            return false;
        }
        self.rope.char_to_byte(self.rope.byte_to_char(offset)) == offset
    }

    pub(crate) fn check_offset(&self, offset: usize) -> Result<()> {
        let len = self.len_bytes();
        if offset > len {
            return Err(Error::OutOfRange { offset, len });
        }
        if !self.is_char_boundary(offset) {
            return Err(Error::NotCharBoundary { offset });
        }
        Ok(())
    }

    pub(crate) fn check_range(&self, start: usize, end: usize) -> Result<()> {
        self.check_offset(start)?;
        self.check_offset(end)?;
        if start > end {
            return Err(Error::OutOfRange {
                offset: start,
                len: end,
            });
        }
        Ok(())
    }

    /// Clamp to the text length and snap back to a char boundary.
    #[must_use]
    pub fn clamp_offset(&self, offset: usize) -> usize {
        let offset = offset.min(self.len_bytes());
        self.rope.char_to_byte(self.rope.byte_to_char(offset))
    }

    /// Insert text at a byte offset.
    ///
    /// # Errors
    ///
    /// Fails without modifying the rope if `offset` is out of range or not on
    /// a char boundary.
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<()> {
        self.check_offset(offset)?;
        let char_idx = self.rope.byte_to_char(offset);
        self.rope.insert(char_idx, text);
        Ok(())
    }

    /// Insert raw bytes, validating them as UTF-8 first.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidEncoding`] for non-UTF-8 input, plus the errors of
    /// [`insert`](Self::insert).
    pub fn insert_bytes(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        let text = std::str::from_utf8(bytes)?;
        self.insert(offset, text)
    }

    /// Delete the byte range `start..end`.
    ///
    /// # Errors
    ///
    /// Fails without modifying the rope if either end is invalid or
    /// `start > end`.
    pub fn delete(&mut self, start: usize, end: usize) -> Result<()> {
        self.check_range(start, end)?;
        let start_char = self.rope.byte_to_char(start);
        let end_char = self.rope.byte_to_char(end);
        self.rope.remove(start_char..end_char);
        Ok(())
    }

    /// Append text to the end.
    pub fn append(&mut self, text: &str) {
        let len = self.len_chars();
        self.rope.insert(len, text);
    }

    /// Replace the entire contents.
    pub fn replace_all(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
    }

    /// Clear all content.
    pub fn clear(&mut self) {
        self.rope = Rope::new();
    }

    fn byte_slice(&self, start: usize, end: usize) -> RopeSlice<'_> {
        self.rope.byte_slice(start..end)
    }

    /// Copy out the byte range `start..end`.
    ///
    /// # Errors
    ///
    /// Fails if either end is invalid or `start > end`.
    pub fn slice(&self, start: usize, end: usize) -> Result<String> {
        self.check_range(start, end)?;
        Ok(self.byte_slice(start, end).to_string())
    }

    /// Copy out a range after clamping both ends into the text.
    #[must_use]
    pub fn slice_clamped(&self, start: usize, end: usize) -> String {
        let start = self.clamp_offset(start);
        let end = self.clamp_offset(end).max(start);
        self.byte_slice(start, end).to_string()
    }

    /// Row and scalar column of a byte offset.
    ///
    /// # Errors
    ///
    /// Fails if `offset` is out of range or not on a char boundary.
    pub fn offset_to_coords(&self, offset: usize) -> Result<(usize, usize)> {
        self.check_offset(offset)?;
        Ok(self.coords_of(offset))
    }

    fn coords_of(&self, offset: usize) -> (usize, usize) {
        let char_idx = self.rope.byte_to_char(offset);
        let row = self.rope.char_to_line(char_idx);
        (row, char_idx - self.rope.line_to_char(row))
    }

    /// Coordinates of an offset after clamping it.
    #[must_use]
    pub fn offset_to_coords_clamped(&self, offset: usize) -> (usize, usize) {
        self.coords_of(self.clamp_offset(offset))
    }

    /// Byte offset of a row and scalar column.
    ///
    /// The column may equal the row's length (the position before its `\n`).
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCoords`] if the row does not exist or the column is past
    /// the end of the row.
    pub fn coords_to_offset(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.line_count() || col > self.line_len_chars(row) {
            return Err(Error::InvalidCoords { row, col });
        }
        let line_start = self.rope.line_to_char(row);
        Ok(self.rope.char_to_byte(line_start + col))
    }

    /// Offset of a row and column after clamping both to the text.
    #[must_use]
    pub fn coords_to_offset_clamped(&self, row: usize, col: usize) -> usize {
        let row = row.min(self.line_count() - 1);
        let col = col.min(self.line_len_chars(row));
        let line_start = self.rope.line_to_char(row);
        self.rope.char_to_byte(line_start + col)
    }

    /// Number of scalars on a row, excluding its `\n`.
    #[must_use]
    pub fn line_len_chars(&self, row: usize) -> usize {
        if row >= self.line_count() {
            return 0;
        }
        let line = self.rope.line(row);
        let len = line.len_chars();
        if len > 0 && line.char(len - 1) == '\n' {
            len - 1
        } else {
            len
        }
    }

    /// Byte offset where a row starts.
    #[must_use]
    pub fn line_start(&self, row: usize) -> Option<usize> {
        (row < self.line_count()).then(|| self.rope.line_to_byte(row))
    }

    /// Byte range of a row, excluding its `\n`.
    #[must_use]
    pub fn line_range(&self, row: usize) -> Option<(usize, usize)> {
        let start = self.line_start(row)?;
        let line = self.rope.line(row);
        let mut end = start + line.len_bytes();
        if line.len_chars() > 0 && line.char(line.len_chars() - 1) == '\n' {
            end -= 1;
        }
        Some((start, end))
    }

    /// Text of a row without its `\n`.
    #[must_use]
    pub fn line_text(&self, row: usize) -> Option<String> {
        let (start, end) = self.line_range(row)?;
        Some(self.byte_slice(start, end).to_string())
    }

    /// Row containing a byte offset (clamped).
    #[must_use]
    pub fn line_of_offset(&self, offset: usize) -> usize {
        self.rope.byte_to_line(offset.min(self.len_bytes()))
    }

    /// Iterate over the rope's string chunks in order.
    pub fn chunks(&self) -> impl Iterator<Item = &str> {
        self.rope.chunks()
    }

    /// Heap bytes held by the rope's text.
    #[must_use]
    pub fn arena_bytes(&self) -> usize {
        self.rope.capacity()
    }

    /// Access the underlying rope.
    #[must_use]
    pub fn inner(&self) -> &Rope {
        &self.rope
    }
}

impl fmt::Display for TextRope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in self.rope.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

impl From<&str> for TextRope {
    fn from(s: &str) -> Self {
        Self::from_text(s)
    }
}
