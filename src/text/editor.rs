//! Editor view with visual cursor, scroll-follow and placeholder text.
//!
//! [`EditorView`] owns an [`EditBuffer`] and a [`TextBufferView`] over its
//! text. Cursor motion through the editor view keeps the cursor inside the
//! viewport, and the `*_visual` operations move by wrapped rows instead of
//! logical lines.

use crate::color::Rgba;
use crate::error::Result;
use crate::options::TextOptions;
use crate::style::{Style, TextAttributes};
use crate::text::edit::EditBuffer;
use crate::text::history::HistoryChange;
use crate::text::view::{LineInfo, Selection, TextBufferView, Viewport, VisibleRow, WrapMode};

/// Cursor position in both logical and wrapped coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VisualCursor {
    /// Virtual (wrapped) row.
    pub visual_row: usize,
    /// Display column within the virtual row.
    pub visual_col: usize,
    pub logical_row: usize,
    /// Scalar column within the logical line.
    pub logical_col: usize,
    /// Byte offset.
    pub offset: usize,
}

/// Editor view wrapping an [`EditBuffer`] with wrapped-layout navigation.
#[derive(Debug)]
pub struct EditorView {
    edit_buffer: EditBuffer,
    view: TextBufferView,
    selection_style: Style,
    scroll_margin: f32,
    selection_follow_cursor: bool,
    placeholder: Option<String>,
    placeholder_style: Style,
    /// Display column kept across visual vertical moves.
    desired_visual_col: Option<usize>,
}

impl Default for EditorView {
    fn default() -> Self {
        Self::empty()
    }
}

impl EditorView {
    /// Create a new editor view.
    #[must_use]
    pub fn new(edit_buffer: EditBuffer) -> Self {
        let view = TextBufferView::new(edit_buffer.buffer());
        Self {
            edit_buffer,
            view,
            selection_style: Style::bg(Rgba::from_rgb_u8(60, 60, 120)),
            scroll_margin: 0.1,
            selection_follow_cursor: false,
            placeholder: None,
            placeholder_style: Style::NONE.with_attributes(TextAttributes::DIM),
            desired_visual_col: None,
        }
    }

    /// Create an empty editor view.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(EditBuffer::new())
    }

    /// Create an empty editor view with custom options.
    #[must_use]
    pub fn with_options(options: TextOptions) -> Self {
        Self::new(EditBuffer::with_options(options))
    }

    /// Get the edit buffer.
    #[must_use]
    pub fn edit_buffer(&self) -> &EditBuffer {
        &self.edit_buffer
    }

    /// Get mutable access to the edit buffer.
    ///
    /// Cursor changes made through it do not scroll the viewport; call
    /// [`ensure_cursor_visible`](Self::ensure_cursor_visible) afterwards.
    pub fn edit_buffer_mut(&mut self) -> &mut EditBuffer {
        &mut self.edit_buffer
    }

    /// The layout view over the edit buffer's text.
    #[must_use]
    pub fn view(&self) -> &TextBufferView {
        &self.view
    }

    /// Mutable access to the layout view, for tab indicator and truncation.
    pub fn view_mut(&mut self) -> &mut TextBufferView {
        &mut self.view
    }

    /// Get the full text content.
    #[must_use]
    pub fn text(&self) -> String {
        self.edit_buffer.text()
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    /// Set wrap mode.
    pub fn set_wrap_mode(&mut self, mode: WrapMode) {
        self.view.set_wrap_mode(mode);
    }

    /// Set or clear the explicit wrap width.
    pub fn set_wrap_width(&mut self, width: Option<u32>) {
        self.view.set_wrap_width(width);
    }

    /// Set selection style.
    pub fn set_selection_style(&mut self, style: Style) {
        self.selection_style = style;
    }

    /// Set scroll margin (0.0-0.5 of viewport).
    pub fn set_scroll_margin(&mut self, margin: f32) {
        self.scroll_margin = margin.clamp(0.0, 0.5);
    }

    /// Current scroll margin fraction.
    #[must_use]
    pub fn scroll_margin(&self) -> f32 {
        self.scroll_margin
    }

    /// Enable or disable selection following the cursor.
    pub fn set_selection_follow_cursor(&mut self, enabled: bool) {
        self.selection_follow_cursor = enabled;
    }

    /// Set or clear the text shown while the buffer is empty.
    pub fn set_placeholder(&mut self, text: Option<&str>) {
        self.placeholder = text.map(str::to_owned);
    }

    /// Placeholder text, if set.
    #[must_use]
    pub fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    /// Set the style the placeholder is drawn with.
    pub fn set_placeholder_style(&mut self, style: Style) {
        self.placeholder_style = style;
    }

    /// Style the placeholder is drawn with.
    #[must_use]
    pub fn placeholder_style(&self) -> Style {
        self.placeholder_style
    }

    /// Whether the placeholder is what should be displayed.
    #[must_use]
    pub fn is_showing_placeholder(&self) -> bool {
        self.placeholder.is_some() && self.edit_buffer.buffer().is_empty()
    }

    /// Text to display: the placeholder while the buffer is empty, otherwise
    /// the buffer text.
    #[must_use]
    pub fn display_text(&self) -> String {
        match &self.placeholder {
            Some(placeholder) if self.edit_buffer.buffer().is_empty() => placeholder.clone(),
            _ => self.edit_buffer.text(),
        }
    }

    // ------------------------------------------------------------------
    // Viewport
    // ------------------------------------------------------------------

    /// Current viewport.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.view.current_viewport()
    }

    /// Replace the viewport. With `move_cursor`, a cursor left outside the new
    /// viewport (less the scroll margin) is moved to the nearest row inside
    /// it, keeping its display column.
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`](crate::Error::BufferMismatch) if the edit
    /// buffer's text buffer was replaced.
    pub fn set_viewport(
        &mut self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        move_cursor: bool,
    ) -> Result<()> {
        self.view.set_viewport(x, y, width, height);
        if move_cursor && height > 0 {
            self.clamp_cursor_to_viewport()?;
        }
        Ok(())
    }

    fn clamp_cursor_to_viewport(&mut self) -> Result<()> {
        let buffer = self.edit_buffer.buffer();
        let total = self.view.virtual_line_count(buffer)?;
        let vp = self.view.current_viewport();
        let (row, col) = self
            .view
            .visual_position_for_offset(buffer, self.edit_buffer.cursor().offset)?;

        let top = vp.y as usize;
        let height = vp.height as usize;
        let margin = self.margin_for(height);
        let lo = if top == 0 { 0 } else { top + margin };
        let hi = if top + height >= total {
            total.saturating_sub(1)
        } else {
            (top + height).saturating_sub(margin + 1)
        };
        let target = row.clamp(lo.min(hi), hi);
        if target == row {
            return Ok(());
        }
        let col = self.desired_visual_col.unwrap_or(col);
        if let Some(offset) = self.view.offset_at_visual(buffer, target, col)? {
            self.edit_buffer.set_cursor_by_offset(offset);
            self.desired_visual_col = Some(col);
        }
        Ok(())
    }

    /// Slack rows or columns kept between the cursor and the viewport edge,
    /// always leaving at least one usable cell.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn margin_for(&self, extent: usize) -> usize {
        let margin = (extent as f32 * self.scroll_margin).ceil() as usize;
        margin.min(extent.saturating_sub(1) / 2)
    }

    /// Scroll so the cursor sits inside the viewport, honoring the scroll
    /// margin. Returns whether the scroll position changed.
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`](crate::Error::BufferMismatch) if the edit
    /// buffer's text buffer was replaced.
    pub fn ensure_cursor_visible(&mut self) -> Result<bool> {
        let buffer = self.edit_buffer.buffer();
        let vp = self.view.current_viewport();
        let (row, col) = self
            .view
            .visual_position_for_offset(buffer, self.edit_buffer.cursor().offset)?;

        let mut y = vp.y as usize;
        if vp.height > 0 {
            let height = vp.height as usize;
            let margin = self.margin_for(height);
            if row < y + margin {
                y = row.saturating_sub(margin);
            } else if row + margin >= y + height {
                y = row + margin + 1 - height;
            }
            let total = self.view.virtual_line_count(buffer)?;
            y = y.min(total.saturating_sub(height));
        }

        let mut x = vp.x as usize;
        if self.view.current_wrap_mode() == WrapMode::None && vp.width > 0 {
            let width = vp.width as usize;
            let margin = self.margin_for(width);
            if col < x + margin {
                x = col.saturating_sub(margin);
            } else if col + margin >= x + width {
                x = col + margin + 1 - width;
            }
        }

        let (x, y) = (
            u32::try_from(x).unwrap_or(u32::MAX),
            u32::try_from(y).unwrap_or(u32::MAX),
        );
        if (x, y) == (vp.x, vp.y) {
            return Ok(false);
        }
        self.view.set_scroll(x, y);
        Ok(true)
    }

    /// Rows inside the viewport, ready to paint.
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`](crate::Error::BufferMismatch) if the edit
    /// buffer's text buffer was replaced.
    pub fn visible_rows(&self) -> Result<Vec<VisibleRow>> {
        self.view.visible_rows(self.edit_buffer.buffer())
    }

    /// Layout of the whole text under the current wrap settings.
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`](crate::Error::BufferMismatch) if the edit
    /// buffer's text buffer was replaced.
    pub fn line_info(&self) -> Result<LineInfo> {
        self.view.line_info(self.edit_buffer.buffer())
    }

    /// Number of virtual lines under the current wrap settings.
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`](crate::Error::BufferMismatch) if the edit
    /// buffer's text buffer was replaced.
    pub fn virtual_line_count(&self) -> Result<usize> {
        self.view.virtual_line_count(self.edit_buffer.buffer())
    }

    // ------------------------------------------------------------------
    // Visual cursor
    // ------------------------------------------------------------------

    /// Cursor position in wrapped and logical coordinates.
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`](crate::Error::BufferMismatch) if the edit
    /// buffer's text buffer was replaced.
    pub fn get_visual_cursor(&self) -> Result<VisualCursor> {
        let cursor = self.edit_buffer.cursor();
        let (visual_row, visual_col) = self
            .view
            .visual_position_for_offset(self.edit_buffer.buffer(), cursor.offset)?;
        Ok(VisualCursor {
            visual_row,
            visual_col,
            logical_row: cursor.row,
            logical_col: cursor.col,
            offset: cursor.offset,
        })
    }

    fn move_visual(&mut self, down: bool) -> Result<bool> {
        let buffer = self.edit_buffer.buffer();
        let (row, col) = self
            .view
            .visual_position_for_offset(buffer, self.edit_buffer.cursor().offset)?;
        let target = if down {
            row + 1
        } else if let Some(row) = row.checked_sub(1) {
            row
        } else {
            return Ok(false);
        };
        let col = self.desired_visual_col.unwrap_or(col);
        let Some(offset) = self.view.offset_at_visual(buffer, target, col)? else {
            return Ok(false);
        };
        self.edit_buffer.set_cursor_by_offset(offset);
        self.desired_visual_col = Some(col);
        self.after_move()?;
        Ok(true)
    }

    /// Move cursor up one wrapped row, keeping the display column sticky.
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`](crate::Error::BufferMismatch) if the edit
    /// buffer's text buffer was replaced.
    pub fn move_up_visual(&mut self) -> Result<bool> {
        self.move_visual(false)
    }

    /// Move cursor down one wrapped row, keeping the display column sticky.
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`](crate::Error::BufferMismatch) if the edit
    /// buffer's text buffer was replaced.
    pub fn move_down_visual(&mut self) -> Result<bool> {
        self.move_visual(true)
    }

    fn current_visual_row(&self) -> Result<usize> {
        let (row, _) = self
            .view
            .visual_position_for_offset(self.edit_buffer.buffer(), self.edit_buffer.cursor().offset)?;
        Ok(row)
    }

    /// Byte offset where the cursor's wrapped row starts.
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`](crate::Error::BufferMismatch) if the edit
    /// buffer's text buffer was replaced.
    pub fn get_visual_sol(&self) -> Result<usize> {
        let row = self.current_visual_row()?;
        Ok(self
            .view
            .offset_at_visual(self.edit_buffer.buffer(), row, 0)?
            .unwrap_or_else(|| self.edit_buffer.get_sol()))
    }

    /// Last cursor position on the cursor's wrapped row. For a row followed by
    /// a continuation of the same logical line this is before its last
    /// cluster, since the row's end offset is drawn on the next row.
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`](crate::Error::BufferMismatch) if the edit
    /// buffer's text buffer was replaced.
    pub fn get_visual_eol(&self) -> Result<usize> {
        let row = self.current_visual_row()?;
        Ok(self
            .view
            .offset_at_visual(self.edit_buffer.buffer(), row, usize::MAX)?
            .unwrap_or_else(|| self.edit_buffer.get_eol()))
    }

    /// Move cursor to the start of its wrapped row.
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`](crate::Error::BufferMismatch) if the edit
    /// buffer's text buffer was replaced.
    pub fn move_to_visual_sol(&mut self) -> Result<()> {
        let sol = self.get_visual_sol()?;
        self.edit_buffer.set_cursor_by_offset(sol);
        self.after_jump()
    }

    /// Move cursor to the end of its wrapped row.
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`](crate::Error::BufferMismatch) if the edit
    /// buffer's text buffer was replaced.
    pub fn move_to_visual_eol(&mut self) -> Result<()> {
        let eol = self.get_visual_eol()?;
        self.edit_buffer.set_cursor_by_offset(eol);
        self.after_jump()
    }

    // ------------------------------------------------------------------
    // Cursor motion and editing with scroll-follow
    // ------------------------------------------------------------------

    fn after_move(&mut self) -> Result<()> {
        if self.selection_follow_cursor {
            if let Some(sel) = self.view.selection() {
                let end = self.edit_buffer.cursor().offset;
                self.view.set_selection(sel.start, end, sel.style);
            }
        }
        self.ensure_cursor_visible()?;
        Ok(())
    }

    fn after_jump(&mut self) -> Result<()> {
        self.desired_visual_col = None;
        self.after_move()
    }

    /// Move cursor left by one grapheme cluster.
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`](crate::Error::BufferMismatch) if the edit
    /// buffer's text buffer was replaced.
    pub fn move_left(&mut self) -> Result<bool> {
        let moved = self.edit_buffer.move_left();
        self.after_jump()?;
        Ok(moved)
    }

    /// Move cursor right by one grapheme cluster.
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`](crate::Error::BufferMismatch) if the edit
    /// buffer's text buffer was replaced.
    pub fn move_right(&mut self) -> Result<bool> {
        let moved = self.edit_buffer.move_right();
        self.after_jump()?;
        Ok(moved)
    }

    /// Move cursor up one logical line.
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`](crate::Error::BufferMismatch) if the edit
    /// buffer's text buffer was replaced.
    pub fn move_up(&mut self) -> Result<bool> {
        let moved = self.edit_buffer.move_up();
        self.after_jump()?;
        Ok(moved)
    }

    /// Move cursor down one logical line.
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`](crate::Error::BufferMismatch) if the edit
    /// buffer's text buffer was replaced.
    pub fn move_down(&mut self) -> Result<bool> {
        let moved = self.edit_buffer.move_down();
        self.after_jump()?;
        Ok(moved)
    }

    /// Move cursor to the end of the next word.
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`](crate::Error::BufferMismatch) if the edit
    /// buffer's text buffer was replaced.
    pub fn move_word_right(&mut self) -> Result<bool> {
        let moved = self.edit_buffer.move_word_right();
        self.after_jump()?;
        Ok(moved)
    }

    /// Move cursor to the start of the previous word.
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`](crate::Error::BufferMismatch) if the edit
    /// buffer's text buffer was replaced.
    pub fn move_word_left(&mut self) -> Result<bool> {
        let moved = self.edit_buffer.move_word_left();
        self.after_jump()?;
        Ok(moved)
    }

    /// Move cursor to the start of its logical line.
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`](crate::Error::BufferMismatch) if the edit
    /// buffer's text buffer was replaced.
    pub fn move_to_line_start(&mut self) -> Result<()> {
        self.edit_buffer.move_to_line_start();
        self.after_jump()
    }

    /// Move cursor to the end of its logical line.
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`](crate::Error::BufferMismatch) if the edit
    /// buffer's text buffer was replaced.
    pub fn move_to_line_end(&mut self) -> Result<()> {
        self.edit_buffer.move_to_line_end();
        self.after_jump()
    }

    /// Set the cursor by row and scalar column (clamped).
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`](crate::Error::BufferMismatch) if the edit
    /// buffer's text buffer was replaced.
    pub fn set_cursor(&mut self, row: usize, col: usize) -> Result<()> {
        self.edit_buffer.set_cursor(row, col);
        self.after_jump()
    }

    /// Insert text at the cursor.
    ///
    /// # Errors
    ///
    /// Grapheme pool errors, with nothing changed.
    pub fn insert_text(&mut self, text: &str) -> Result<()> {
        self.edit_buffer.insert_text(text)?;
        self.after_jump()
    }

    /// Insert a line break at the cursor.
    ///
    /// # Errors
    ///
    /// Grapheme pool errors, with nothing changed.
    pub fn new_line(&mut self) -> Result<()> {
        self.insert_text("\n")
    }

    /// Delete the grapheme cluster before the cursor.
    ///
    /// # Errors
    ///
    /// Grapheme pool errors, with nothing changed.
    pub fn backspace(&mut self) -> Result<bool> {
        let deleted = self.edit_buffer.backspace()?;
        self.after_jump()?;
        Ok(deleted)
    }

    /// Delete the grapheme cluster after the cursor.
    ///
    /// # Errors
    ///
    /// Grapheme pool errors, with nothing changed.
    pub fn delete_forward(&mut self) -> Result<bool> {
        let deleted = self.edit_buffer.delete_forward()?;
        self.after_jump()?;
        Ok(deleted)
    }

    /// Undo the newest edit group.
    ///
    /// # Errors
    ///
    /// Grapheme pool errors, with nothing changed.
    pub fn undo(&mut self) -> Result<Option<HistoryChange>> {
        let change = self.edit_buffer.undo()?;
        self.after_jump()?;
        Ok(change)
    }

    /// Redo the newest undone edit group.
    ///
    /// # Errors
    ///
    /// Grapheme pool errors, with nothing changed.
    pub fn redo(&mut self) -> Result<Option<HistoryChange>> {
        let change = self.edit_buffer.redo()?;
        self.after_jump()?;
        Ok(change)
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Set selection range by byte offsets.
    pub fn set_selection(&mut self, start: usize, end: usize) {
        self.view.set_selection(start, end, self.selection_style);
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) {
        self.view.clear_selection();
    }

    /// Current selection.
    #[must_use]
    pub fn selection(&self) -> Option<Selection> {
        self.view.selection()
    }

    /// Start a selection at the cursor.
    pub fn start_selection(&mut self) {
        let offset = self.edit_buffer.cursor().offset;
        self.set_selection(offset, offset);
    }

    /// Select between two viewport positions.
    ///
    /// With `update_cursor` the cursor moves to the focus point now; with
    /// `follow_cursor` the selection end also tracks every later cursor move.
    /// Returns whether the selection changed; points outside any row leave
    /// everything unchanged and return `Ok(false)`.
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`](crate::Error::BufferMismatch) if the edit
    /// buffer's text buffer was replaced.
    pub fn set_local_selection(
        &mut self,
        anchor: (u32, u32),
        focus: (u32, u32),
        update_cursor: bool,
        follow_cursor: bool,
    ) -> Result<bool> {
        let buffer = self.edit_buffer.buffer();
        let (Some(_), Some(focus_offset)) = (
            self.view.screen_to_offset(buffer, anchor.0, anchor.1),
            self.view.screen_to_offset(buffer, focus.0, focus.1),
        ) else {
            return Ok(false);
        };
        let changed = self
            .view
            .set_local_selection(buffer, anchor, focus, self.selection_style)?;
        self.selection_follow_cursor = follow_cursor;
        if update_cursor || follow_cursor {
            self.edit_buffer.set_cursor_by_offset(focus_offset);
            self.desired_visual_col = None;
            self.ensure_cursor_visible()?;
        }
        Ok(changed)
    }

    /// Get the selected text, if any.
    ///
    /// Returns `None` if there is no selection or if the selection is empty.
    #[must_use]
    pub fn selected_text(&self) -> Option<String> {
        self.view
            .selected_text(self.edit_buffer.buffer())
            .ok()
            .flatten()
    }

    /// Delete the selected text as one undo group and clear the selection.
    /// Returns `Ok(false)` when nothing was selected.
    ///
    /// # Errors
    ///
    /// Grapheme pool errors, with nothing changed.
    pub fn delete_selected_text(&mut self) -> Result<bool> {
        let Some(sel) = self.view.selection().map(|s| s.normalized()) else {
            return Ok(false);
        };
        let rope = self.edit_buffer.buffer().rope();
        let (start, end) = (rope.clamp_offset(sel.start), rope.clamp_offset(sel.end));
        self.edit_buffer.commit();
        let deleted = self.edit_buffer.delete_range_offsets(start, end)?;
        self.edit_buffer.commit();
        self.view.clear_selection();
        self.after_jump()?;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor(text: &str, width: u32, height: u32, mode: WrapMode) -> EditorView {
        let mut editor = EditorView::new(EditBuffer::with_text(text).unwrap());
        editor.set_wrap_mode(mode);
        editor.set_viewport(0, 0, width, height, false).unwrap();
        editor
    }

    #[test]
    fn test_visual_cursor_on_wrapped_line() {
        let mut ed = editor("the quick brown fox", 10, 5, WrapMode::Word);
        ed.set_cursor(0, 12).unwrap();
        let vc = ed.get_visual_cursor().unwrap();
        assert_eq!(
            vc,
            VisualCursor {
                visual_row: 1,
                visual_col: 2,
                logical_row: 0,
                logical_col: 12,
                offset: 12,
            }
        );
    }

    #[test]
    fn test_visual_vs_logical_vertical_motion() {
        let mut ed = editor("the quick brown fox\nend", 10, 5, WrapMode::Word);
        ed.set_cursor(0, 12).unwrap();

        assert!(ed.move_up_visual().unwrap());
        assert_eq!(ed.edit_buffer().cursor().offset, 2);
        assert!(!ed.move_up_visual().unwrap());

        assert!(ed.move_down_visual().unwrap());
        assert_eq!(ed.edit_buffer().cursor().offset, 12);
        assert!(ed.move_down_visual().unwrap());
        assert_eq!(ed.edit_buffer().cursor().row, 1);

        // Logical motion skips the wrapped row.
        ed.set_cursor(0, 2).unwrap();
        assert!(ed.move_down().unwrap());
        assert_eq!(ed.edit_buffer().cursor().row, 1);
    }

    #[test]
    fn test_visual_sol_eol() {
        let mut ed = editor("the quick brown fox", 10, 5, WrapMode::Word);
        ed.set_cursor(0, 12).unwrap();
        assert_eq!(ed.get_visual_sol().unwrap(), 10);
        assert_eq!(ed.get_visual_eol().unwrap(), 19);
        assert_eq!(ed.edit_buffer().get_sol(), 0);
        assert_eq!(ed.edit_buffer().get_eol(), 19);

        ed.set_cursor(0, 2).unwrap();
        // The row's end offset belongs to the next row.
        assert_eq!(ed.get_visual_eol().unwrap(), 9);
        ed.move_to_visual_eol().unwrap();
        assert_eq!(ed.get_visual_cursor().unwrap().visual_row, 0);
        ed.move_to_visual_sol().unwrap();
        assert_eq!(ed.edit_buffer().cursor().offset, 0);
    }

    #[test]
    fn test_scroll_follows_cursor() {
        let text = (0..20).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let mut ed = editor(&text, 20, 5, WrapMode::None);
        ed.set_scroll_margin(0.0);
        for _ in 0..6 {
            ed.move_down().unwrap();
        }
        assert_eq!(ed.viewport().y, 2);
        ed.set_cursor(0, 0).unwrap();
        assert_eq!(ed.viewport().y, 0);
    }

    #[test]
    fn test_scroll_margin_keeps_slack() {
        let text = (0..20).map(|i| format!("{i}")).collect::<Vec<_>>().join("\n");
        let mut ed = editor(&text, 20, 10, WrapMode::None);
        ed.set_scroll_margin(0.25);
        ed.set_cursor(8, 0).unwrap();
        // Three rows of slack stay below the cursor.
        assert_eq!(ed.viewport().y, 2);
        ed.set_cursor(19, 0).unwrap();
        assert_eq!(ed.viewport().y, 10);
    }

    #[test]
    fn test_horizontal_scroll_without_wrap() {
        let mut ed = editor(&"x".repeat(50), 10, 3, WrapMode::None);
        ed.set_scroll_margin(0.0);
        ed.move_to_line_end().unwrap();
        assert_eq!(ed.viewport().x, 41);
        ed.move_to_line_start().unwrap();
        assert_eq!(ed.viewport().x, 0);
    }

    #[test]
    fn test_set_viewport_moves_cursor() {
        let text = (0..20).map(|i| format!("{i}")).collect::<Vec<_>>().join("\n");
        let mut ed = editor(&text, 10, 5, WrapMode::None);
        ed.set_scroll_margin(0.0);
        ed.set_viewport(0, 10, 10, 5, true).unwrap();
        assert_eq!(ed.edit_buffer().cursor().row, 10);

        ed.set_viewport(0, 2, 10, 5, false).unwrap();
        assert_eq!(ed.edit_buffer().cursor().row, 10);
    }

    #[test]
    fn test_placeholder() {
        let mut ed = EditorView::empty();
        ed.set_placeholder(Some("Type here"));
        assert!(ed.is_showing_placeholder());
        assert_eq!(ed.display_text(), "Type here");
        ed.insert_text("a").unwrap();
        assert!(!ed.is_showing_placeholder());
        assert_eq!(ed.display_text(), "a");
    }

    #[test]
    fn test_local_selection_moves_cursor() {
        let mut ed = editor("hello world\nsecond", 20, 5, WrapMode::None);
        assert!(ed.set_local_selection((0, 0), (5, 0), true, false).unwrap());
        assert_eq!(ed.selected_text().as_deref(), Some("hello"));
        assert_eq!(ed.edit_buffer().cursor().offset, 5);

        // Same points again: nothing changes.
        assert!(!ed.set_local_selection((0, 0), (5, 0), true, false).unwrap());
        // Outside any row.
        assert!(!ed.set_local_selection((0, 0), (1, 9), true, false).unwrap());
        assert_eq!(ed.selected_text().as_deref(), Some("hello"));
    }

    #[test]
    fn test_selection_follows_cursor() {
        let mut ed = editor("hello world", 20, 5, WrapMode::None);
        ed.set_local_selection((0, 0), (2, 0), false, true).unwrap();
        assert_eq!(ed.edit_buffer().cursor().offset, 2);
        ed.move_word_right().unwrap();
        assert_eq!(ed.selected_text().as_deref(), Some("hello"));
    }

    #[test]
    fn test_delete_selected_text_is_one_undo_step() {
        let mut ed = editor("hello world", 20, 5, WrapMode::None);
        ed.set_selection(11, 5);
        assert!(ed.delete_selected_text().unwrap());
        assert_eq!(ed.text(), "hello");
        assert!(ed.selection().is_none());
        assert!(!ed.delete_selected_text().unwrap());

        ed.undo().unwrap();
        assert_eq!(ed.text(), "hello world");
    }
}
