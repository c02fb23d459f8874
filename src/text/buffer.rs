//! Styled text buffer with highlighting support.
//!
//! [`TextBuffer`] stores UTF-8 text in a rope, keeps a per-line cell ledger
//! whose non-ASCII clusters live in a shared grapheme pool, and maintains
//! highlights that follow the text through edits. Every content change funnels
//! through [`TextBuffer::splice`], which either applies completely or leaves
//! the buffer untouched.
//!
//! For editing with cursor and undo, see [`EditBuffer`](super::EditBuffer).

use crate::cell::{CellCode, GraphemeHandle};
use crate::color::Rgba;
use crate::error::{Error, Result};
use crate::grapheme_pool::{GraphemePool, SharedGraphemePool};
use crate::highlight::{Highlight, HighlightIndex, SyntaxStyleRegistry};
use crate::link::LinkPool;
use crate::options::TextOptions;
use crate::style::{Style, TextAttributes};
use crate::text::lines::{CellLedger, CellMetric};
use crate::text::mem::{MemId, MemRegistry, MemSource};
use crate::text::rope::TextRope;
use crate::text::segment::{LineHighlight, StyledChunk, StyledSpan};
use crate::unicode::{WidthMethod, tab_stop_width};
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace, warn};

/// Owner tag given to highlights created by [`TextBuffer::set_styled`].
pub const STYLED_CHUNK_REF: u16 = 0;

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`TextBuffer`], used by views to check they
/// are handed the buffer they were created for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(u64);

impl BufferId {
    fn next() -> Self {
        Self(NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buffer#{}", self.0)
    }
}

/// Text buffer with styled highlights.
///
/// Offsets are byte offsets; `(row, col)` coordinates count scalars. Dropping
/// the buffer releases every grapheme handle it holds.
pub struct TextBuffer {
    id: BufferId,
    rope: TextRope,
    cells: CellLedger,
    pool: SharedGraphemePool,
    highlights: HighlightIndex,
    styles: SyntaxStyleRegistry,
    links: LinkPool,
    mem: MemRegistry,
    default_style: Style,
    tab_width: u8,
    width_method: WidthMethod,
    revision: u64,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TextBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextBuffer")
            .field("id", &self.id)
            .field("len_bytes", &self.rope.len_bytes())
            .field("lines", &self.rope.line_count())
            .field("highlights", &self.highlights.len())
            .field("tab_width", &self.tab_width)
            .field("width_method", &self.width_method)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

impl Drop for TextBuffer {
    fn drop(&mut self) {
        if let Ok(mut pool) = self.pool.try_borrow_mut() {
            self.cells.clear(&mut pool);
        } else {
            warn!(id = %self.id, "grapheme pool busy while dropping buffer; handles leaked");
        }
    }
}

impl TextBuffer {
    /// Create an empty buffer with default options and its own pool.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(TextOptions::default())
    }

    /// Create an empty buffer with its own pool configured from `options`.
    #[must_use]
    pub fn with_options(options: TextOptions) -> Self {
        Self::with_pool(GraphemePool::shared(options.pool_capacity), options)
    }

    /// Create an empty buffer interning into an existing shared pool.
    ///
    /// `options.pool_capacity` is ignored; the pool's own limit applies.
    #[must_use]
    pub fn with_pool(pool: SharedGraphemePool, options: TextOptions) -> Self {
        Self {
            id: BufferId::next(),
            rope: TextRope::new(),
            cells: CellLedger::new(),
            pool,
            highlights: HighlightIndex::new(),
            styles: SyntaxStyleRegistry::new(),
            links: LinkPool::new(),
            mem: MemRegistry::new(),
            default_style: Style::NONE,
            tab_width: options.tab_width,
            width_method: options.width_method,
            revision: 0,
        }
    }

    /// Create a buffer holding `text`.
    ///
    /// # Errors
    ///
    /// Propagates grapheme pool errors.
    pub fn from_text(text: &str) -> Result<Self> {
        let mut buffer = Self::new();
        buffer.set_text(text)?;
        Ok(buffer)
    }

    /// Identity used by views.
    #[must_use]
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Content revision; increases on every change that affects layout.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn bump_revision(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// The grapheme pool this buffer interns into.
    #[must_use]
    pub fn pool(&self) -> &SharedGraphemePool {
        &self.pool
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    /// Set the default style for text no highlight covers.
    pub fn set_default_style(&mut self, style: Style) {
        self.default_style = style;
    }

    /// Set the default foreground color.
    pub fn set_default_fg(&mut self, fg: Option<Rgba>) {
        self.default_style.fg = fg;
    }

    /// Set the default background color.
    pub fn set_default_bg(&mut self, bg: Option<Rgba>) {
        self.default_style.bg = bg;
    }

    /// Set the default attributes.
    pub fn set_default_attributes(&mut self, attributes: TextAttributes) {
        self.default_style.attributes = attributes;
    }

    /// Get the default style.
    #[must_use]
    pub fn default_style(&self) -> Style {
        self.default_style
    }

    /// Set tab width. Zero is treated as 1 by layout.
    pub fn set_tab_width(&mut self, width: u8) {
        if self.tab_width != width {
            self.tab_width = width;
            self.bump_revision();
        }
    }

    /// Get tab width.
    #[must_use]
    pub fn tab_width(&self) -> u8 {
        self.tab_width
    }

    /// Switch the width policy, re-measuring every line.
    ///
    /// # Errors
    ///
    /// Propagates grapheme pool errors; the buffer keeps its previous policy
    /// and cells in that case.
    pub fn set_width_method(&mut self, method: WidthMethod) -> Result<()> {
        if self.width_method == method {
            return Ok(());
        }
        let text = self.rope.to_string();
        self.cells
            .rebuild_all(&text, method, &mut self.pool.borrow_mut())?;
        debug!(id = %self.id, %method, lines = self.cells.line_count(), "width method rebuilt");
        self.width_method = method;
        self.bump_revision();
        Ok(())
    }

    /// Get width calculation method.
    #[must_use]
    pub fn width_method(&self) -> WidthMethod {
        self.width_method
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Number of bytes.
    #[must_use]
    pub fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    /// Number of scalars.
    #[must_use]
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Number of logical lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.rope.line_count()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rope.is_empty()
    }

    /// The underlying rope.
    #[must_use]
    pub fn rope(&self) -> &TextRope {
        &self.rope
    }

    /// Text of a line without its `\n`.
    #[must_use]
    pub fn line_text(&self, row: usize) -> Option<String> {
        self.rope.line_text(row)
    }

    /// Stored cells of a line.
    #[must_use]
    pub fn line_cells(&self, row: usize) -> Option<&[CellCode]> {
        self.cells.line(row)
    }

    /// Byte length and width of each cell of a line.
    #[must_use]
    pub fn line_metrics(&self, row: usize) -> Vec<CellMetric> {
        self.cells.metrics(row, &self.pool.borrow())
    }

    /// Display width of a line with tabs expanded from column 0.
    #[must_use]
    pub fn line_width(&self, row: usize) -> usize {
        let tab_width = usize::from(self.tab_width.max(1));
        self.line_metrics(row).iter().fold(0, |col, m| {
            col + if m.is_tab {
                tab_stop_width(col, tab_width)
            } else {
                m.width
            }
        })
    }

    /// Every packed handle stored in the cell ledger, with repeats.
    pub fn grapheme_handles(&self) -> impl Iterator<Item = GraphemeHandle> + '_ {
        self.cells.handles()
    }

    /// Plain text, truncated to at most `max_len` bytes on a char boundary.
    ///
    /// Returns `None` only when the buffer is empty.
    #[must_use]
    pub fn get_plain_text(&self, max_len: usize) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        Some(self.rope.slice_clamped(0, max_len))
    }

    /// The whole text.
    #[must_use]
    pub fn plain_text(&self) -> String {
        self.rope.to_string()
    }

    /// Text of a byte range, clamped to the buffer.
    #[must_use]
    pub fn get_text_range(&self, start: usize, end: usize) -> String {
        self.rope.slice_clamped(start, end)
    }

    /// Text between two `(row, col)` positions, each clamped to the buffer.
    #[must_use]
    pub fn get_text_range_by_coords(
        &self,
        start_row: usize,
        start_col: usize,
        end_row: usize,
        end_col: usize,
    ) -> String {
        let start = self.rope.coords_to_offset_clamped(start_row, start_col);
        let end = self.rope.coords_to_offset_clamped(end_row, end_col);
        self.rope.slice_clamped(start, end)
    }

    /// Approximate heap bytes held by the buffer, including the shared pool.
    #[must_use]
    pub fn arena_bytes(&self) -> usize {
        self.rope.arena_bytes()
            + self.cells.arena_bytes()
            + self.mem.arena_bytes()
            + self.pool.borrow().arena_bytes()
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Replace the bytes `start..end` with `text`.
    ///
    /// This is the single mutation path: the rope, the cell ledger and the
    /// highlights all change together, or nothing changes.
    ///
    /// # Errors
    ///
    /// Range errors if either end is out of range or not on a char boundary,
    /// grapheme pool errors if the new clusters cannot be interned.
    pub fn splice(&mut self, start: usize, end: usize, text: &str) -> Result<()> {
        self.rope.check_range(start, end)?;
        if start == end && text.is_empty() {
            return Ok(());
        }

        let first_row = self.rope.line_of_offset(start);
        let last_row = self.rope.line_of_offset(end);
        let (region_start, _) = self
            .rope
            .line_range(first_row)
            .ok_or(Error::InvalidCoords { row: first_row, col: 0 })?;
        let (_, region_end) = self
            .rope
            .line_range(last_row)
            .ok_or(Error::InvalidCoords { row: last_row, col: 0 })?;

        let mut region = self.rope.slice(region_start, start)?;
        region.push_str(text);
        region.push_str(&self.rope.slice(end, region_end)?);

        self.cells.replace_lines(
            first_row,
            last_row,
            region.split('\n'),
            self.width_method,
            &mut self.pool.borrow_mut(),
        )?;
        self.rope.delete(start, end)?;
        self.rope.insert(start, text)?;
        self.highlights.apply_splice(start, end, text.len());
        self.bump_revision();

        trace!(
            id = %self.id,
            start,
            removed = end - start,
            inserted = text.len(),
            "splice"
        );
        debug_assert_eq!(self.rope.line_count(), self.cells.line_count());
        Ok(())
    }

    /// Insert text at a byte offset.
    ///
    /// # Errors
    ///
    /// See [`splice`](Self::splice).
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<()> {
        self.splice(offset, offset, text)
    }

    /// Delete the bytes `start..end`.
    ///
    /// # Errors
    ///
    /// See [`splice`](Self::splice).
    pub fn delete(&mut self, start: usize, end: usize) -> Result<()> {
        self.splice(start, end, "")
    }

    /// Append text to the end.
    ///
    /// # Errors
    ///
    /// Propagates grapheme pool errors.
    pub fn append(&mut self, text: &str) -> Result<()> {
        let len = self.len_bytes();
        self.splice(len, len, text)
    }

    /// Append raw bytes, validating them as UTF-8 first.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidEncoding`] for non-UTF-8 input, or grapheme pool errors.
    pub fn append_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.append(std::str::from_utf8(bytes)?)
    }

    /// Replace the whole text. Highlights are cleared.
    ///
    /// # Errors
    ///
    /// Propagates grapheme pool errors; the buffer is unchanged on error.
    pub fn set_text(&mut self, text: &str) -> Result<()> {
        let len = self.len_bytes();
        self.splice(0, len, text)?;
        self.highlights.clear();
        Ok(())
    }

    /// Replace the whole text from raw bytes, validating them as UTF-8.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidEncoding`] for non-UTF-8 input, or grapheme pool errors.
    pub fn replace(&mut self, bytes: &[u8]) -> Result<()> {
        self.set_text(std::str::from_utf8(bytes)?)
    }

    /// Remove all text and highlights.
    pub fn clear(&mut self) {
        self.cells.clear(&mut self.pool.borrow_mut());
        self.rope.clear();
        self.highlights.clear();
        self.bump_revision();
    }

    /// Replace the contents with styled chunks.
    ///
    /// Each non-empty chunk becomes one highlight over exactly its bytes, with
    /// a style registered (deduplicated) in this buffer's style registry and
    /// tagged [`STYLED_CHUNK_REF`]. Empty chunks are skipped.
    ///
    /// # Errors
    ///
    /// Link or grapheme pool exhaustion; the text, style registry and link
    /// pool are unchanged on error.
    pub fn set_styled(&mut self, chunks: &[StyledChunk<'_>]) -> Result<()> {
        let styles = self.styles.clone();
        let links = self.links.clone();
        let result = self.apply_styled(chunks);
        if result.is_err() {
            self.styles = styles;
            self.links = links;
        }
        result
    }

    fn apply_styled(&mut self, chunks: &[StyledChunk<'_>]) -> Result<()> {
        let mut text = String::new();
        let mut spans = Vec::with_capacity(chunks.len());
        for chunk in chunks.iter().filter(|c| !c.text.is_empty()) {
            let style_id = self.chunk_style_id(chunk)?;
            let start = text.len();
            text.push_str(chunk.text);
            spans.push((start, text.len(), style_id));
        }

        self.set_text(&text)?;
        for (start, end, style_id) in spans {
            self.highlights
                .add(Highlight::new(start, end, style_id, 0, STYLED_CHUNK_REF));
        }
        Ok(())
    }

    fn chunk_style_id(&mut self, chunk: &StyledChunk<'_>) -> Result<u32> {
        let mut style = chunk.style();
        let mut link_id = None;
        if let Some(url) = chunk.link {
            let id = self.links.intern(url)?;
            style = style.with_link(id);
            link_id = Some(id);
        }
        let before = self.styles.len();
        let style_id = self.styles.intern(style);
        if let Some(id) = link_id {
            // The link stays referenced once per registered style carrying it.
            if self.styles.len() == before {
                self.links.release(id);
            }
        }
        Ok(style_id)
    }

    /// Hyperlink URLs referenced by registered styles.
    #[must_use]
    pub fn links(&self) -> &LinkPool {
        &self.links
    }

    // ------------------------------------------------------------------
    // Memory registry
    // ------------------------------------------------------------------

    /// Register bytes for later [`set_from_registered`](Self::set_from_registered).
    ///
    /// # Errors
    ///
    /// [`Error::MemIdsExhausted`] when no new ID can be issued.
    pub fn register_mem(&mut self, source: impl Into<MemSource>) -> Result<MemId> {
        self.mem.register(source)
    }

    /// Replace registered bytes.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownMemId`] if `id` is not registered.
    pub fn replace_mem(&mut self, id: MemId, source: impl Into<MemSource>) -> Result<()> {
        self.mem.replace(id, source)
    }

    /// Remove registered bytes.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownMemId`] if `id` is not registered.
    pub fn unregister_mem(&mut self, id: MemId) -> Result<MemSource> {
        self.mem.unregister(id)
    }

    /// The memory registry.
    #[must_use]
    pub fn mem_registry(&self) -> &MemRegistry {
        &self.mem
    }

    /// Replace the text with the bytes registered under `id`.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownMemId`], [`Error::InvalidEncoding`], or grapheme pool
    /// errors. The buffer is unchanged on error.
    pub fn set_from_registered(&mut self, id: MemId) -> Result<()> {
        let text = std::str::from_utf8(self.mem.get(id)?)?.to_owned();
        self.set_text(&text)
    }

    // ------------------------------------------------------------------
    // File loading
    // ------------------------------------------------------------------

    /// Replace the text with a file's contents.
    ///
    /// The file is read fully and validated before the buffer is touched.
    ///
    /// # Errors
    ///
    /// I/O, encoding, or grapheme pool errors, with the buffer unchanged.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let text = std::str::from_utf8(&bytes)?;
        self.set_text(text)?;
        debug!(id = %self.id, path = %path.display(), bytes = bytes.len(), "loaded file");
        Ok(())
    }

    /// [`load_file`](Self::load_file), reporting failure as `false`.
    pub fn try_load_file(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        match self.load_file(path) {
            Ok(()) => true,
            Err(err) => {
                warn!(id = %self.id, path = %path.display(), %err, "file load failed");
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Highlights
    // ------------------------------------------------------------------

    /// The style registry highlights refer to.
    #[must_use]
    pub fn syntax_styles(&self) -> &SyntaxStyleRegistry {
        &self.styles
    }

    /// Mutable access to the style registry.
    pub fn syntax_styles_mut(&mut self) -> &mut SyntaxStyleRegistry {
        &mut self.styles
    }

    /// Replace the style registry.
    pub fn set_syntax_styles(&mut self, registry: SyntaxStyleRegistry) {
        self.styles = registry;
    }

    /// Highlight the bytes `start..end`.
    ///
    /// Returns `false` (and stores nothing) for an empty range.
    ///
    /// # Errors
    ///
    /// Range errors if either end is invalid.
    pub fn add_highlight(
        &mut self,
        start: usize,
        end: usize,
        style_id: u32,
        priority: u8,
        hl_ref: u16,
    ) -> Result<bool> {
        self.rope.check_range(start, end)?;
        Ok(self
            .highlights
            .add(Highlight::new(start, end, style_id, priority, hl_ref)))
    }

    /// Highlight columns `col_start..col_end` of one line.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCoords`] if the row or either column is out of range.
    pub fn add_highlight_by_coords(
        &mut self,
        row: usize,
        col_start: usize,
        col_end: usize,
        style_id: u32,
        priority: u8,
        hl_ref: u16,
    ) -> Result<bool> {
        let start = self.rope.coords_to_offset(row, col_start)?;
        let end = self.rope.coords_to_offset(row, col_end)?;
        self.add_highlight(start, end, style_id, priority, hl_ref)
    }

    /// Highlight a scalar range `char_start..char_end` of the whole text.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfRange`] if either end is past the end of the text.
    pub fn add_highlight_by_char_range(
        &mut self,
        char_start: usize,
        char_end: usize,
        style_id: u32,
        priority: u8,
        hl_ref: u16,
    ) -> Result<bool> {
        let len = self.len_chars();
        for idx in [char_start, char_end] {
            if idx > len {
                return Err(Error::OutOfRange { offset: idx, len });
            }
        }
        let rope = self.rope.inner();
        let start = rope.char_to_byte(char_start);
        let end = rope.char_to_byte(char_end);
        self.add_highlight(start, end, style_id, priority, hl_ref)
    }

    /// Remove every highlight tagged `hl_ref`, returning how many went.
    ///
    /// Runs in O(total highlights).
    pub fn remove_highlights(&mut self, hl_ref: u16) -> usize {
        self.highlights.remove_by_ref(hl_ref)
    }

    /// Remove all highlights.
    pub fn clear_highlights(&mut self) {
        self.highlights.clear();
    }

    fn line_span(&self, row: usize) -> Option<(usize, usize)> {
        let (start, _) = self.rope.line_range(row)?;
        let end = self
            .rope
            .line_start(row + 1)
            .unwrap_or_else(|| self.len_bytes());
        Some((start, end))
    }

    /// Remove highlighting from one line, trimming highlights that continue
    /// onto neighboring lines.
    pub fn clear_line_highlights(&mut self, row: usize) {
        if let Some((start, end)) = self.line_span(row) {
            self.highlights.clear_range(start, end, None);
        }
    }

    /// [`clear_line_highlights`](Self::clear_line_highlights) restricted to
    /// one owner.
    pub fn clear_line_highlights_by_ref(&mut self, row: usize, hl_ref: u16) {
        if let Some((start, end)) = self.line_span(row) {
            self.highlights.clear_range(start, end, Some(hl_ref));
        }
    }

    /// Number of stored highlights.
    #[must_use]
    pub fn highlight_count(&self) -> usize {
        self.highlights.len()
    }

    /// All highlights in start order.
    pub fn highlights(&self) -> impl Iterator<Item = &Highlight> {
        self.highlights.iter()
    }

    /// Highlights touching one line, clipped to it and expressed in columns.
    ///
    /// Overlaps are reported as-is; resolving them is up to the caller.
    #[must_use]
    pub fn line_highlights(&self, row: usize) -> Vec<LineHighlight> {
        let Some((line_start, line_end)) = self.rope.line_range(row) else {
            return Vec::new();
        };
        let rope = self.rope.inner();
        let line_char = rope.byte_to_char(line_start);
        self.highlights
            .overlapping(line_start, line_end.max(line_start + 1))
            .filter_map(|h| {
                let start = h.start.max(line_start);
                let end = h.end.min(line_end);
                (start < end).then(|| LineHighlight {
                    col_start: rope.byte_to_char(start) - line_char,
                    col_end: rope.byte_to_char(end) - line_char,
                    style_id: h.style_id,
                    priority: h.priority,
                    hl_ref: h.hl_ref,
                })
            })
            .collect()
    }

    fn resolve_style(&self, highlight: Option<&Highlight>) -> Style {
        highlight
            .and_then(|h| self.styles.style(h.style_id))
            .map_or(self.default_style, |s| self.default_style.merge(s))
    }

    /// Effective style at a byte offset: the default style merged with the
    /// winning highlight's style.
    #[must_use]
    pub fn style_at(&self, offset: usize) -> Style {
        self.resolve_style(self.highlights.winner_at(offset))
    }

    /// One line split into maximal runs of equal effective style.
    #[must_use]
    pub fn line_spans(&self, row: usize) -> Vec<StyledSpan> {
        let Some((line_start, line_end)) = self.rope.line_range(row) else {
            return Vec::new();
        };
        if line_start == line_end {
            return Vec::new();
        }
        let active: Vec<&Highlight> = self.highlights.overlapping(line_start, line_end).collect();
        let mut bounds = vec![line_start, line_end];
        for h in &active {
            bounds.extend([h.start, h.end].into_iter().filter(|&b| b > line_start && b < line_end));
        }
        bounds.sort_unstable();
        bounds.dedup();

        let mut spans: Vec<StyledSpan> = Vec::new();
        for pair in bounds.windows(2) {
            let (start, end) = (pair[0], pair[1]);
            let winner = active
                .iter()
                .copied()
                .filter(|h| h.overlaps(start, end))
                .fold(None, |best: Option<&Highlight>, h| match best {
                    Some(b) if !h.wins_over(b) => Some(b),
                    _ => Some(h),
                });
            let style = self.resolve_style(winner);
            match spans.last_mut() {
                Some(last) if last.style == style => last.end = end,
                _ => spans.push(StyledSpan { start, end, style }),
            }
        }
        spans
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_basic() {
        let mut buffer = TextBuffer::new();
        buffer.set_text("Hello, world!").unwrap();
        assert_eq!(buffer.len_chars(), 13);
        assert_eq!(buffer.line_count(), 1);
    }

    #[test]
    fn test_splice_keeps_lines_in_sync() {
        let mut buffer = TextBuffer::from_text("ab\ncd\nef").unwrap();
        buffer.splice(1, 4, "X\nY").unwrap();
        assert_eq!(buffer.plain_text(), "aX\nYd\nef");
        assert_eq!(buffer.line_count(), 3);
        assert_eq!(buffer.line_cells(1).unwrap().len(), 2);

        buffer.delete(2, 3).unwrap();
        assert_eq!(buffer.plain_text(), "aXYd\nef");
        assert_eq!(buffer.line_count(), 2);
        assert_eq!(buffer.line_cells(0).unwrap().len(), 4);
    }

    #[test]
    fn test_rejected_splice_leaves_buffer_untouched() {
        let mut buffer = TextBuffer::from_text("héllo").unwrap();
        let rev = buffer.revision();
        assert!(matches!(
            buffer.insert(2, "x"),
            Err(Error::NotCharBoundary { offset: 2 })
        ));
        assert!(matches!(
            buffer.delete(3, 99),
            Err(Error::OutOfRange { offset: 99, .. })
        ));
        assert_eq!(buffer.plain_text(), "héllo");
        assert_eq!(buffer.revision(), rev);
    }

    #[test]
    fn test_pool_exhaustion_is_atomic() {
        let options = TextOptions::default().with_pool_capacity(1);
        let mut buffer = TextBuffer::with_options(options);
        buffer.set_text("aé").unwrap();
        buffer.add_highlight(0, 1, 1, 0, 3).unwrap();
        let err = buffer.append("ü").unwrap_err();
        assert!(matches!(err, Error::PoolExhausted { capacity: 1 }));
        assert_eq!(buffer.plain_text(), "aé");
        assert_eq!(buffer.highlight_count(), 1);
        assert_eq!(buffer.pool().borrow().active_count(), 1);
    }

    #[test]
    fn test_drop_releases_handles() {
        let pool = GraphemePool::shared(None);
        {
            let mut buffer = TextBuffer::with_pool(pool.clone(), TextOptions::default());
            buffer.set_text("漢字 and é").unwrap();
            assert_eq!(pool.borrow().active_count(), 3);
        }
        assert_eq!(pool.borrow().active_count(), 0);
    }

    #[test]
    fn test_shared_pool_refcounts() {
        let pool = GraphemePool::shared(None);
        let mut a = TextBuffer::with_pool(pool.clone(), TextOptions::default());
        let mut b = TextBuffer::with_pool(pool.clone(), TextOptions::default());
        a.set_text("é").unwrap();
        b.set_text("éé").unwrap();
        let handle = a.grapheme_handles().next().unwrap();
        assert_eq!(pool.borrow().refcount(handle), 3);
        b.clear();
        assert_eq!(pool.borrow().refcount(handle), 1);
    }

    #[test]
    fn test_get_plain_text() {
        let mut buffer = TextBuffer::new();
        assert_eq!(buffer.get_plain_text(100), None);
        buffer.set_text("héllo").unwrap();
        assert_eq!(buffer.get_plain_text(0).as_deref(), Some(""));
        // Truncation never splits é.
        assert_eq!(buffer.get_plain_text(2).as_deref(), Some("h"));
        assert_eq!(buffer.get_plain_text(3).as_deref(), Some("hé"));
        assert_eq!(buffer.get_plain_text(100).as_deref(), Some("héllo"));
    }

    #[test]
    fn test_text_ranges_clamp() {
        let buffer = TextBuffer::from_text("one\ntwo\nthree").unwrap();
        assert_eq!(buffer.get_text_range(4, 7), "two");
        assert_eq!(buffer.get_text_range(8, 500), "three");
        assert_eq!(buffer.get_text_range_by_coords(1, 1, 2, 2), "wo\nth");
        assert_eq!(buffer.get_text_range_by_coords(0, 99, 99, 99), "\ntwo\nthree");
    }

    #[test]
    fn test_highlights_follow_edits() {
        let mut buffer = TextBuffer::from_text("hello world").unwrap();
        buffer.add_highlight(6, 11, 1, 0, 1).unwrap();
        buffer.insert(0, ">> ").unwrap();
        let h = buffer.highlights().next().unwrap();
        assert_eq!((h.start, h.end), (9, 14));
        buffer.delete(8, 14).unwrap();
        assert_eq!(buffer.highlight_count(), 0);
    }

    #[test]
    fn test_remove_highlights_by_owner() {
        let mut buffer = TextBuffer::from_text("hello").unwrap();
        buffer.add_highlight(0, 5, 1, 1, 7).unwrap();
        buffer.add_highlight(0, 5, 2, 2, 9).unwrap();
        assert_eq!(buffer.remove_highlights(7), 1);
        let line = buffer.line_highlights(0);
        assert_eq!(line.len(), 1);
        assert_eq!(line[0].hl_ref, 9);
        assert_eq!(line[0].style_id, 2);
    }

    #[test]
    fn test_line_highlights_clip_to_lines() {
        let mut buffer = TextBuffer::from_text("ab\nçd\nef").unwrap();
        buffer.add_highlight(1, 6, 4, 0, 0).unwrap();
        assert_eq!(
            buffer.line_highlights(0),
            vec![LineHighlight {
                col_start: 1,
                col_end: 2,
                style_id: 4,
                priority: 0,
                hl_ref: 0
            }]
        );
        let second = buffer.line_highlights(1);
        assert_eq!((second[0].col_start, second[0].col_end), (0, 2));
        assert!(buffer.line_highlights(2).is_empty());

        buffer.clear_line_highlights(1);
        assert!(buffer.line_highlights(1).is_empty());
        assert_eq!(buffer.line_highlights(0).len(), 1);
    }

    #[test]
    fn test_highlight_by_coords_validates() {
        let mut buffer = TextBuffer::from_text("abc\nde").unwrap();
        assert!(buffer.add_highlight_by_coords(1, 0, 2, 1, 0, 0).unwrap());
        assert!(matches!(
            buffer.add_highlight_by_coords(1, 0, 3, 1, 0, 0),
            Err(Error::InvalidCoords { row: 1, col: 3 })
        ));
        assert!(!buffer.add_highlight_by_coords(0, 1, 1, 1, 0, 0).unwrap());
        assert!(buffer.add_highlight_by_char_range(0, 99, 1, 0, 0).is_err());
    }

    #[test]
    fn test_styled_chunks() {
        let mut buffer = TextBuffer::new();
        buffer
            .set_styled(&[
                StyledChunk::new("Hello", Style::fg(Rgba::RED)),
                StyledChunk::plain(""),
                StyledChunk::plain(", "),
                StyledChunk::new("world", Style::fg(Rgba::RED))
                    .with_link("https://example.com"),
            ])
            .unwrap();

        assert_eq!(buffer.plain_text(), "Hello, world");
        assert_eq!(buffer.highlight_count(), 3);
        let ranges: Vec<_> = buffer.highlights().map(|h| (h.start, h.end)).collect();
        assert_eq!(ranges, vec![(0, 5), (5, 7), (7, 12)]);

        assert_eq!(buffer.style_at(0).fg, Some(Rgba::RED));
        let link = buffer.style_at(8).attributes.link_id().unwrap();
        assert_eq!(buffer.links().get(link), Some("https://example.com"));
        assert_eq!(buffer.style_at(0).attributes.link_id(), None);
    }

    #[test]
    fn test_failed_styled_set_leaves_styles_and_links() {
        let options = TextOptions::default().with_pool_capacity(1);
        let mut buffer = TextBuffer::with_options(options);
        buffer.set_text("keep").unwrap();
        let styles_before = buffer.syntax_styles().len();

        let err = buffer
            .set_styled(&[
                StyledChunk::new("αβγ", Style::fg(Rgba::GREEN)).with_link("https://example.com"),
            ])
            .unwrap_err();
        assert!(matches!(err, Error::PoolExhausted { .. }));
        assert_eq!(buffer.plain_text(), "keep");
        assert_eq!(buffer.syntax_styles().len(), styles_before);
        assert!(buffer.links().is_empty());
        assert_eq!(buffer.highlight_count(), 0);
    }

    #[test]
    fn test_line_spans_resolve_priority() {
        let mut buffer = TextBuffer::from_text("abcdef").unwrap();
        let red = buffer.syntax_styles_mut().register("red", Style::fg(Rgba::RED));
        let blue = buffer
            .syntax_styles_mut()
            .register("blue", Style::fg(Rgba::BLUE));
        buffer.add_highlight(0, 4, red, 1, 0).unwrap();
        buffer.add_highlight(2, 6, blue, 2, 0).unwrap();

        let spans = buffer.line_spans(0);
        let summary: Vec<_> = spans.iter().map(|s| (s.start, s.end, s.style.fg)).collect();
        assert_eq!(
            summary,
            vec![(0, 2, Some(Rgba::RED)), (2, 6, Some(Rgba::BLUE))]
        );
    }

    #[test]
    fn test_mem_registry_set_text() {
        let mut buffer = TextBuffer::new();
        let id = buffer.register_mem(b"External".to_vec()).unwrap();
        buffer.set_from_registered(id).unwrap();
        assert_eq!(buffer.plain_text(), "External");

        let bad = buffer.register_mem(vec![0xFF, 0xFE]).unwrap();
        assert!(matches!(
            buffer.set_from_registered(bad),
            Err(Error::InvalidEncoding(_))
        ));
        assert_eq!(buffer.plain_text(), "External");
        buffer.unregister_mem(id).unwrap();
        assert!(matches!(
            buffer.set_from_registered(id),
            Err(Error::UnknownMemId(_))
        ));
    }

    #[test]
    fn test_width_method_switch() {
        let mut buffer = TextBuffer::from_text("e\u{0301}👨‍👩‍👧").unwrap();
        assert_eq!(buffer.line_cells(0).unwrap().len(), 2);
        assert_eq!(buffer.line_width(0), 3);

        buffer.set_width_method(WidthMethod::WcWidth).unwrap();
        assert_eq!(buffer.line_cells(0).unwrap().len(), 4);
        assert_eq!(buffer.line_width(0), 7);
    }

    #[test]
    fn test_line_width_expands_tabs() {
        let mut buffer = TextBuffer::from_text("ab\tc").unwrap();
        assert_eq!(buffer.line_width(0), 5);
        buffer.set_tab_width(8);
        assert_eq!(buffer.line_width(0), 9);
    }

    #[test]
    fn test_replace_rejects_invalid_utf8() {
        let mut buffer = TextBuffer::from_text("keep").unwrap();
        assert!(matches!(
            buffer.replace(&[0x61, 0xC3]),
            Err(Error::InvalidEncoding(_))
        ));
        assert_eq!(buffer.plain_text(), "keep");
        buffer.append_bytes("→".as_bytes()).unwrap();
        assert_eq!(buffer.plain_text(), "keep→");
    }
}
