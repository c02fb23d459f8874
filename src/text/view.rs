//! Text buffer view with viewport and wrapping.
//!
//! A [`TextBufferView`] projects a [`TextBuffer`]'s logical lines onto
//! virtual (wrapped) lines for a viewport. The view does not borrow its
//! buffer; every query takes the buffer explicitly and fails with
//! [`Error::BufferMismatch`] if it is not the buffer the view was created for.
//! The wrapped layout is cached and rebuilt whenever the wrap settings, the
//! viewport width, or the buffer's revision change.

// Layout routines naturally have long functions
#![allow(clippy::too_many_lines)]

use crate::color::Rgba;
use crate::error::{Error, Result};
use crate::style::Style;
use crate::text::buffer::{BufferId, TextBuffer};
use crate::unicode::{WidthMethod, tab_stop_width};
use std::cell::{Ref, RefCell};
use tracing::debug;

/// Text wrapping mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WrapMode {
    /// No wrapping - lines extend beyond viewport.
    #[default]
    None,
    /// Wrap at character boundaries.
    Char,
    /// Wrap at word boundaries, falling back to a character break for words
    /// longer than the wrap width.
    Word,
}

/// Viewport configuration.
///
/// `y` is the first visible virtual line. `x` scrolls horizontally and only
/// applies when wrapping is off.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Create a new viewport.
    #[must_use]
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Selection range in byte offsets, kept in anchor/focus order.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
    pub style: Style,
}

impl Selection {
    /// Create a new selection.
    #[must_use]
    pub fn new(start: usize, end: usize, style: Style) -> Self {
        Self { start, end, style }
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Get normalized (start <= end) selection.
    #[must_use]
    pub fn normalized(&self) -> Self {
        if self.start <= self.end {
            *self
        } else {
            Self {
                start: self.end,
                end: self.start,
                style: self.style,
            }
        }
    }

    /// Check if position is within selection.
    #[must_use]
    pub fn contains(&self, pos: usize) -> bool {
        let norm = self.normalized();
        pos >= norm.start && pos < norm.end
    }
}

/// Local (viewport) selection based on screen coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LocalSelection {
    pub anchor_x: u32,
    pub anchor_y: u32,
    pub focus_x: u32,
    pub focus_y: u32,
    pub style: Style,
}

impl LocalSelection {
    /// Create a new local selection.
    #[must_use]
    pub fn new(anchor_x: u32, anchor_y: u32, focus_x: u32, focus_y: u32, style: Style) -> Self {
        Self {
            anchor_x,
            anchor_y,
            focus_x,
            focus_y,
            style,
        }
    }

    /// Normalize selection rectangle.
    #[must_use]
    pub fn normalized(&self) -> (u32, u32, u32, u32) {
        let min_x = self.anchor_x.min(self.focus_x);
        let max_x = self.anchor_x.max(self.focus_x);
        let min_y = self.anchor_y.min(self.focus_y);
        let max_y = self.anchor_y.max(self.focus_y);
        (min_x, min_y, max_x, max_y)
    }
}

#[derive(Clone, Copy, Debug)]
struct VirtualLine {
    source_line: usize,
    byte_start: usize,
    byte_end: usize,
    width: usize,
    is_wrap: bool,
}

/// Cached line layout information for wrapped text.
///
/// All vectors are indexed by virtual line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LineInfo {
    /// Byte offset where each virtual line starts.
    pub starts: Vec<usize>,
    /// Byte offset where each virtual line ends (exclusive).
    pub ends: Vec<usize>,
    /// Display width of each virtual line.
    pub widths: Vec<usize>,
    /// Source line index for each virtual line.
    pub sources: Vec<usize>,
    /// Whether the line is a wrapped continuation.
    pub wraps: Vec<bool>,
    /// Maximum line width across all virtual lines.
    pub max_width: usize,
}

impl LineInfo {
    /// Get the number of virtual lines.
    #[must_use]
    pub fn virtual_line_count(&self) -> usize {
        self.starts.len()
    }

    /// Map a source (logical) line to its first virtual line index.
    #[must_use]
    pub fn source_to_virtual(&self, source_line: usize) -> Option<usize> {
        let idx = self.sources.partition_point(|&s| s < source_line);
        (self.sources.get(idx) == Some(&source_line)).then_some(idx)
    }

    /// Map a virtual line index to its source (logical) line.
    #[must_use]
    pub fn virtual_to_source(&self, virtual_line: usize) -> Option<usize> {
        self.sources.get(virtual_line).copied()
    }

    /// Get the byte range for a virtual line.
    #[must_use]
    pub fn virtual_line_byte_range(&self, virtual_line: usize) -> Option<(usize, usize)> {
        let start = *self.starts.get(virtual_line)?;
        let end = *self.ends.get(virtual_line)?;
        Some((start, end))
    }

    /// Get the display width of a virtual line.
    #[must_use]
    pub fn virtual_line_width(&self, virtual_line: usize) -> Option<usize> {
        self.widths.get(virtual_line).copied()
    }

    /// Check if a virtual line is a wrapped continuation.
    #[must_use]
    pub fn is_continuation(&self, virtual_line: usize) -> Option<bool> {
        self.wraps.get(virtual_line).copied()
    }

    /// Count virtual lines for a given source line.
    #[must_use]
    pub fn virtual_lines_for_source(&self, source_line: usize) -> usize {
        self.sources.iter().filter(|&&s| s == source_line).count()
    }

    /// Virtual line containing a byte offset.
    ///
    /// Offsets in whitespace swallowed by a word wrap belong to the line
    /// before the wrap.
    #[must_use]
    pub fn virtual_line_at(&self, offset: usize) -> Option<usize> {
        self.starts
            .partition_point(|&s| s <= offset)
            .checked_sub(1)
    }
}

/// Measurement result for a given viewport size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextMeasure {
    pub line_count: usize,
    pub max_width: usize,
}

/// One screen row of the viewport, ready to paint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisibleRow {
    /// Virtual line index.
    pub virtual_line: usize,
    /// Logical line index.
    pub source_line: usize,
    /// Byte range of the virtual line.
    pub start: usize,
    pub end: usize,
    /// Visible text with tabs expanded and horizontal scroll applied.
    pub text: String,
    /// Whether content continues past the right edge.
    pub clipped: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct LineCacheKey {
    wrap_mode: WrapMode,
    wrap_width_override: Option<u32>,
    viewport_width: u32,
    tab_width: u8,
    width_method: WidthMethod,
    buffer_revision: u64,
}

#[derive(Clone, Debug, Default)]
struct LineCache {
    key: Option<LineCacheKey>,
    virtual_lines: Vec<VirtualLine>,
    info: LineInfo,
}

/// One stored cell of a logical line, positioned relative to the line start.
#[derive(Clone, Copy, Debug)]
struct LayoutCell {
    start: usize,
    len: usize,
    width: usize,
    is_tab: bool,
    is_space: bool,
}

impl LayoutCell {
    fn end(&self) -> usize {
        self.start + self.len
    }

    fn width_at(&self, col: usize, tab_width: usize) -> usize {
        if self.is_tab {
            tab_stop_width(col, tab_width)
        } else {
            self.width
        }
    }
}

fn layout_cells(buffer: &TextBuffer, row: usize) -> (String, Vec<LayoutCell>) {
    let text = buffer.line_text(row).unwrap_or_default();
    let mut pos = 0;
    let cells = buffer
        .line_metrics(row)
        .into_iter()
        .map(|m| {
            let is_space = m.is_tab
                || text
                    .get(pos..pos + m.len)
                    .is_some_and(|s| !s.is_empty() && s.chars().all(char::is_whitespace));
            let cell = LayoutCell {
                start: pos,
                len: m.len,
                width: m.width,
                is_tab: m.is_tab,
                is_space,
            };
            pos += m.len;
            cell
        })
        .collect();
    (text, cells)
}

fn wrap_line(
    out: &mut Vec<VirtualLine>,
    row: usize,
    (line_start, line_end): (usize, usize),
    cells: &[LayoutCell],
    mode: WrapMode,
    wrap_width: Option<usize>,
    tab_width: usize,
) {
    let Some(wrap_width) = wrap_width.filter(|_| !cells.is_empty()) else {
        let width = cells
            .iter()
            .fold(0, |col, c| col + c.width_at(col, tab_width));
        out.push(VirtualLine {
            source_line: row,
            byte_start: line_start,
            byte_end: line_end,
            width,
            is_wrap: false,
        });
        return;
    };

    let cell_start = |idx: usize| {
        line_start + cells.get(idx).map_or(line_end - line_start, |c| c.start)
    };
    let mut seg_start = 0usize;
    let mut col = 0usize;
    // (cell index after the break, width up to the break)
    let mut last_break: Option<(usize, usize)> = None;
    let mut first = true;
    let mut i = 0usize;

    while i < cells.len() {
        let cell = &cells[i];
        let width = cell.width_at(col, tab_width);
        if col + width > wrap_width && col > 0 {
            // Whitespace that overflows is itself the boundary.
            let (brk, brk_width) = match (mode, last_break) {
                (WrapMode::Word, _) if cell.is_space => (i, col),
                (WrapMode::Word, Some(b)) => b,
                _ => (i, col),
            };
            out.push(VirtualLine {
                source_line: row,
                byte_start: cell_start(seg_start),
                byte_end: cell_start(brk),
                width: brk_width,
                is_wrap: !first,
            });
            first = false;
            i = brk;
            if mode == WrapMode::Word {
                while cells.get(i).is_some_and(|c| c.is_space) {
                    i += 1;
                }
            }
            seg_start = i;
            col = 0;
            last_break = None;
            continue;
        }
        col += width;
        if mode == WrapMode::Word && cell.is_space {
            last_break = Some((i + 1, col));
        }
        i += 1;
    }

    if first || seg_start < cells.len() {
        out.push(VirtualLine {
            source_line: row,
            byte_start: cell_start(seg_start),
            byte_end: line_end,
            width: col,
            is_wrap: !first,
        });
    }
}

fn build_virtual_lines(
    buffer: &TextBuffer,
    mode: WrapMode,
    wrap_width: Option<usize>,
) -> Vec<VirtualLine> {
    let tab_width = usize::from(buffer.tab_width().max(1));
    let mut lines = Vec::with_capacity(buffer.line_count());
    for row in 0..buffer.line_count() {
        let Some(range) = buffer.rope().line_range(row) else {
            continue;
        };
        let (_, cells) = layout_cells(buffer, row);
        wrap_line(&mut lines, row, range, &cells, mode, wrap_width, tab_width);
    }
    lines
}

fn line_info_from_virtual_lines(virtual_lines: &[VirtualLine]) -> LineInfo {
    let mut info = LineInfo::default();
    for line in virtual_lines {
        info.starts.push(line.byte_start);
        info.ends.push(line.byte_end);
        info.widths.push(line.width);
        info.sources.push(line.source_line);
        info.wraps.push(line.is_wrap);
        info.max_width = info.max_width.max(line.width);
    }
    info
}

/// View into a text buffer with viewport and wrapping options.
#[derive(Debug)]
pub struct TextBufferView {
    buffer_id: BufferId,
    viewport: Viewport,
    wrap_mode: WrapMode,
    wrap_width: Option<u32>,
    selection: Option<Selection>,
    local_selection: Option<LocalSelection>,
    tab_indicator: Option<char>,
    tab_indicator_color: Rgba,
    truncate: bool,
    line_cache: RefCell<LineCache>,
}

impl TextBufferView {
    /// Create a new view of a text buffer.
    #[must_use]
    pub fn new(buffer: &TextBuffer) -> Self {
        Self {
            buffer_id: buffer.id(),
            viewport: Viewport::default(),
            wrap_mode: WrapMode::None,
            wrap_width: None,
            selection: None,
            local_selection: None,
            tab_indicator: None,
            tab_indicator_color: Rgba::WHITE,
            truncate: false,
            line_cache: RefCell::new(LineCache::default()),
        }
    }

    /// Set the viewport.
    #[must_use]
    pub fn viewport(mut self, x: u32, y: u32, width: u32, height: u32) -> Self {
        self.set_viewport(x, y, width, height);
        self
    }

    /// Set the wrap mode.
    #[must_use]
    pub fn wrap_mode(mut self, mode: WrapMode) -> Self {
        self.set_wrap_mode(mode);
        self
    }

    /// Set explicit wrap width (overrides viewport width when wrapping).
    #[must_use]
    pub fn wrap_width(mut self, width: u32) -> Self {
        self.set_wrap_width(Some(width));
        self
    }

    /// Set tab indicator character and color.
    #[must_use]
    pub fn tab_indicator(mut self, ch: char, color: Rgba) -> Self {
        self.set_tab_indicator(Some(ch), color);
        self
    }

    /// Enable or disable truncation.
    #[must_use]
    pub fn truncate(mut self, enabled: bool) -> Self {
        self.truncate = enabled;
        self
    }

    /// The buffer this view belongs to.
    #[must_use]
    pub fn buffer_id(&self) -> BufferId {
        self.buffer_id
    }

    fn check(&self, buffer: &TextBuffer) -> Result<()> {
        if buffer.id() == self.buffer_id {
            Ok(())
        } else {
            Err(Error::BufferMismatch)
        }
    }

    /// Replace the viewport.
    pub fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.viewport = Viewport::new(x, y, width, height);
    }

    /// Scroll without resizing.
    pub fn set_scroll(&mut self, x: u32, y: u32) {
        self.viewport.x = x;
        self.viewport.y = y;
    }

    /// Current viewport.
    #[must_use]
    pub fn current_viewport(&self) -> Viewport {
        self.viewport
    }

    /// Change the wrap mode.
    pub fn set_wrap_mode(&mut self, mode: WrapMode) {
        self.wrap_mode = mode;
    }

    /// Current wrap mode.
    #[must_use]
    pub fn current_wrap_mode(&self) -> WrapMode {
        self.wrap_mode
    }

    /// Set or clear the explicit wrap width.
    pub fn set_wrap_width(&mut self, width: Option<u32>) {
        self.wrap_width = width;
    }

    /// Set or clear the glyph drawn in the first cell of each tab.
    pub fn set_tab_indicator(&mut self, ch: Option<char>, color: Rgba) {
        self.tab_indicator = ch;
        self.tab_indicator_color = color;
    }

    /// Color for the tab indicator glyph.
    #[must_use]
    pub fn tab_indicator_color(&self) -> Rgba {
        self.tab_indicator_color
    }

    /// Enable or disable the trailing ellipsis on clipped rows.
    pub fn set_truncate(&mut self, enabled: bool) {
        self.truncate = enabled;
    }

    /// Set selection by byte offsets.
    pub fn set_selection(&mut self, start: usize, end: usize, style: Style) {
        self.selection = Some(Selection::new(start, end, style));
    }

    /// Clear selection.
    pub fn clear_selection(&mut self) {
        self.selection = None;
        self.local_selection = None;
    }

    /// Current selection.
    #[must_use]
    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Last screen-space selection that resolved successfully.
    #[must_use]
    pub fn local_selection(&self) -> Option<LocalSelection> {
        self.local_selection
    }

    /// Select between two viewport positions.
    ///
    /// Both points are resolved through the current layout, rebuilt first if
    /// stale. Returns `Ok(false)`, leaving the selection alone, when either
    /// point is below the last virtual line; otherwise returns whether the
    /// selection changed.
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`] if `buffer` is not this view's buffer.
    pub fn set_local_selection(
        &mut self,
        buffer: &TextBuffer,
        anchor: (u32, u32),
        focus: (u32, u32),
        style: Style,
    ) -> Result<bool> {
        self.check(buffer)?;
        let (Some(start), Some(end)) = (
            self.screen_to_offset(buffer, anchor.0, anchor.1),
            self.screen_to_offset(buffer, focus.0, focus.1),
        ) else {
            return Ok(false);
        };
        self.local_selection = Some(LocalSelection::new(
            anchor.0, anchor.1, focus.0, focus.1, style,
        ));
        let selection = Some(Selection::new(start, end, style));
        let changed = self.selection != selection;
        self.selection = selection;
        Ok(changed)
    }

    /// Clear local selection.
    pub fn clear_local_selection(&mut self) {
        self.local_selection = None;
    }

    /// Byte offset under a viewport position, if it falls on a virtual line.
    #[must_use]
    pub fn screen_to_offset(&self, buffer: &TextBuffer, x: u32, y: u32) -> Option<usize> {
        if self.check(buffer).is_err() {
            return None;
        }
        let row = self.viewport.y as usize + y as usize;
        let col = self.scroll_x() + x as usize;
        self.offset_at(buffer, row, col)
    }

    /// Get selected text if any.
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`] if `buffer` is not this view's buffer.
    pub fn selected_text(&self, buffer: &TextBuffer) -> Result<Option<String>> {
        self.check(buffer)?;
        let Some(sel) = self.selection.map(|s| s.normalized()) else {
            return Ok(None);
        };
        let text = buffer.get_text_range(sel.start, sel.end);
        Ok((!text.is_empty()).then_some(text))
    }

    /// Plain text of the buffer, truncated to `max_len` bytes.
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`] if `buffer` is not this view's buffer.
    pub fn get_plain_text(&self, buffer: &TextBuffer, max_len: usize) -> Result<Option<String>> {
        self.check(buffer)?;
        Ok(buffer.get_plain_text(max_len))
    }

    fn scroll_x(&self) -> usize {
        if self.wrap_mode == WrapMode::None {
            self.viewport.x as usize
        } else {
            0
        }
    }

    fn effective_wrap_width_for(&self, width: u32) -> Option<usize> {
        if self.wrap_mode == WrapMode::None || width == 0 {
            return None;
        }
        let width = self.wrap_width.unwrap_or(width).max(1);
        Some(width as usize)
    }

    fn line_cache_key(&self, buffer: &TextBuffer) -> LineCacheKey {
        LineCacheKey {
            wrap_mode: self.wrap_mode,
            wrap_width_override: self.wrap_width,
            viewport_width: self.viewport.width,
            tab_width: buffer.tab_width(),
            width_method: buffer.width_method(),
            buffer_revision: buffer.revision(),
        }
    }

    fn line_cache(&self, buffer: &TextBuffer) -> Ref<'_, LineCache> {
        let key = self.line_cache_key(buffer);
        if self.line_cache.borrow().key != Some(key) {
            let wrap_width = self.effective_wrap_width_for(self.viewport.width);
            let virtual_lines = build_virtual_lines(buffer, self.wrap_mode, wrap_width);
            let info = line_info_from_virtual_lines(&virtual_lines);
            debug!(
                buffer = %self.buffer_id,
                virtual_lines = virtual_lines.len(),
                wrap_width,
                "line cache rebuilt"
            );
            *self.line_cache.borrow_mut() = LineCache {
                key: Some(key),
                virtual_lines,
                info,
            };
        }
        self.line_cache.borrow()
    }

    /// Calculate the number of virtual lines (accounting for wrapping).
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`] if `buffer` is not this view's buffer.
    pub fn virtual_line_count(&self, buffer: &TextBuffer) -> Result<usize> {
        self.check(buffer)?;
        Ok(self.line_cache(buffer).virtual_lines.len())
    }

    /// Get line layout information for the current view.
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`] if `buffer` is not this view's buffer.
    pub fn line_info(&self, buffer: &TextBuffer) -> Result<LineInfo> {
        self.check(buffer)?;
        Ok(self.line_cache(buffer).info.clone())
    }

    /// Measure line count and max width for a given viewport size, without
    /// touching the cached layout.
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`] if `buffer` is not this view's buffer.
    pub fn measure_for_dimensions(
        &self,
        buffer: &TextBuffer,
        width: u32,
        _height: u32,
    ) -> Result<TextMeasure> {
        self.check(buffer)?;
        let wrap_width = self.effective_wrap_width_for(width.max(1));
        let virtual_lines = build_virtual_lines(buffer, self.wrap_mode, wrap_width);
        let info = line_info_from_virtual_lines(&virtual_lines);
        Ok(TextMeasure {
            line_count: virtual_lines.len(),
            max_width: info.max_width,
        })
    }

    /// Virtual row and display column of a byte offset (clamped).
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`] if `buffer` is not this view's buffer.
    pub fn visual_position_for_offset(
        &self,
        buffer: &TextBuffer,
        offset: usize,
    ) -> Result<(usize, usize)> {
        self.check(buffer)?;
        let offset = buffer.rope().clamp_offset(offset);
        let cache = self.line_cache(buffer);
        let Some(row) = cache.info.virtual_line_at(offset) else {
            return Ok((0, 0));
        };
        let vline = cache.virtual_lines[row];
        drop(cache);
        Ok((row, Self::column_in(buffer, &vline, offset)))
    }

    fn column_in(buffer: &TextBuffer, vline: &VirtualLine, offset: usize) -> usize {
        if offset >= vline.byte_end {
            return vline.width;
        }
        let tab_width = usize::from(buffer.tab_width().max(1));
        let line_start = buffer.rope().line_start(vline.source_line).unwrap_or(0);
        let (_, cells) = layout_cells(buffer, vline.source_line);
        let mut col = 0;
        for cell in cells
            .iter()
            .filter(|c| line_start + c.start >= vline.byte_start)
        {
            if line_start + cell.end() > offset {
                break;
            }
            col += cell.width_at(col, tab_width);
        }
        col
    }

    /// Byte offset at a virtual row and display column, or `None` if the row
    /// does not exist.
    ///
    /// Columns past the end of the row resolve to its end. A column inside a
    /// wide cluster resolves to the start of that cluster.
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`] if `buffer` is not this view's buffer.
    pub fn offset_at_visual(
        &self,
        buffer: &TextBuffer,
        row: usize,
        col: usize,
    ) -> Result<Option<usize>> {
        self.check(buffer)?;
        Ok(self.offset_at(buffer, row, col))
    }

    fn offset_at(&self, buffer: &TextBuffer, row: usize, target: usize) -> Option<usize> {
        let cache = self.line_cache(buffer);
        let vline = *cache.virtual_lines.get(row)?;
        let next_is_hard_wrap = cache
            .virtual_lines
            .get(row + 1)
            .is_some_and(|next| next.is_wrap && next.byte_start == vline.byte_end);
        drop(cache);

        let tab_width = usize::from(buffer.tab_width().max(1));
        let line_start = buffer.rope().line_start(vline.source_line)?;
        let (_, cells) = layout_cells(buffer, vline.source_line);
        let mut col = 0;
        let mut last_start = vline.byte_start;
        for cell in cells.iter().filter(|c| {
            line_start + c.start >= vline.byte_start && line_start + c.end() <= vline.byte_end
        }) {
            let width = cell.width_at(col, tab_width);
            if col + width > target {
                return Some(line_start + cell.start);
            }
            col += width;
            last_start = line_start + cell.start;
        }
        // The end of a hard-wrapped row is the start of the next one; stay on
        // this row by landing before its last cell.
        Some(if next_is_hard_wrap {
            last_start
        } else {
            vline.byte_end
        })
    }

    /// Rows currently inside the viewport, with tabs expanded and horizontal
    /// scroll applied. A zero viewport height shows every row, a zero width
    /// does not clip.
    ///
    /// # Errors
    ///
    /// [`Error::BufferMismatch`] if `buffer` is not this view's buffer.
    pub fn visible_rows(&self, buffer: &TextBuffer) -> Result<Vec<VisibleRow>> {
        self.check(buffer)?;
        let virtual_lines = self.line_cache(buffer).virtual_lines.clone();
        let first = (self.viewport.y as usize).min(virtual_lines.len());
        let last = if self.viewport.height == 0 {
            virtual_lines.len()
        } else {
            (first + self.viewport.height as usize).min(virtual_lines.len())
        };
        Ok(virtual_lines[first..last]
            .iter()
            .enumerate()
            .map(|(i, vline)| self.render_row(buffer, first + i, vline))
            .collect())
    }

    fn render_row(&self, buffer: &TextBuffer, index: usize, vline: &VirtualLine) -> VisibleRow {
        let tab_width = usize::from(buffer.tab_width().max(1));
        let line_start = buffer.rope().line_start(vline.source_line).unwrap_or(0);
        let (text, cells) = layout_cells(buffer, vline.source_line);

        // One entry per display column; the trailing columns of a wide
        // cluster hold `None`.
        let mut columns: Vec<Option<String>> = Vec::with_capacity(vline.width);
        for cell in cells.iter().filter(|c| {
            line_start + c.start >= vline.byte_start && line_start + c.end() <= vline.byte_end
        }) {
            let width = cell.width_at(columns.len(), tab_width);
            if cell.is_tab {
                let head = self.tab_indicator.unwrap_or(' ');
                columns.push(Some(head.to_string()));
                columns.extend((1..width).map(|_| Some(" ".to_owned())));
                continue;
            }
            let glyph = text.get(cell.start..cell.end()).unwrap_or_default();
            if width == 0 {
                if let Some(Some(prev)) = columns.last_mut() {
                    prev.push_str(glyph);
                }
                continue;
            }
            columns.push(Some(glyph.to_owned()));
            columns.extend((1..width).map(|_| None));
        }

        let scroll_x = self.scroll_x();
        let right = if self.viewport.width == 0 {
            usize::MAX
        } else {
            scroll_x.saturating_add(self.viewport.width as usize)
        };
        let clipped = columns.len() > right;
        let end = columns.len().min(right);
        let start = scroll_x.min(end);
        let mut visible: Vec<String> = columns[start..end]
            .iter()
            .map(|c| c.clone().unwrap_or_else(|| " ".to_owned()))
            .collect();
        // A wide cluster cut by the right edge shows as blank.
        if end < columns.len() && columns[end].is_none() {
            if let Some(last) = visible.last_mut() {
                *last = " ".to_owned();
            }
        }
        if clipped && self.truncate && self.wrap_mode == WrapMode::None {
            if let Some(last) = visible.last_mut() {
                *last = "…".to_owned();
            }
        }

        VisibleRow {
            virtual_line: index,
            source_line: vline.source_line,
            start: vline.byte_start,
            end: vline.byte_end,
            text: visible.concat(),
            clipped,
        }
    }
}
