//! Cluster segmentation with column-aware widths.

use crate::unicode::width::{WidthMethod, cluster_width, tab_stop_width};
use std::ops::Range;
use std::str::CharIndices;
use unicode_segmentation::{GraphemeCursor, GraphemeIndices, UnicodeSegmentation};

/// One measured run of text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    /// Byte offset of the run within the segmented slice.
    pub start: usize,
    /// Byte length of the run.
    pub len: usize,
    /// Display width in cells. Tabs get the distance to the next tab stop.
    pub width: usize,
    /// Whether the run is a single tab character.
    pub is_tab: bool,
}

impl Segment {
    /// Byte range within the segmented slice.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }

    /// Exclusive end byte offset.
    #[must_use]
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

enum Source<'a> {
    Ascii { len: usize, pos: usize },
    Codepoints(CharIndices<'a>),
    Clusters(GraphemeIndices<'a>),
}

/// Lazy iterator of [`Segment`]s over a bounded slice.
///
/// Zero-width runs are yielded with width 0 so callers can merge them; they
/// never advance the column.
pub struct Segments<'a> {
    text: &'a str,
    source: Source<'a>,
    method: WidthMethod,
    tab_width: usize,
    col: usize,
}

impl<'a> Segments<'a> {
    /// Segment `text` starting at column 0.
    #[must_use]
    pub fn new(text: &'a str, method: WidthMethod, tab_width: usize) -> Self {
        let source = if is_printable_ascii(text) {
            Source::Ascii {
                len: text.len(),
                pos: 0,
            }
        } else {
            match method {
                WidthMethod::WcWidth => Source::Codepoints(text.char_indices()),
                WidthMethod::Unicode => Source::Clusters(text.grapheme_indices(true)),
            }
        };
        Self {
            text,
            source,
            method,
            tab_width: tab_width.max(1),
            col: 0,
        }
    }

    /// Start measuring at `col` instead of 0, so tabs land on the right stop.
    #[must_use]
    pub fn with_start_col(mut self, col: usize) -> Self {
        self.col = col;
        self
    }

    /// Column reached after the segments yielded so far.
    #[must_use]
    pub fn col(&self) -> usize {
        self.col
    }

    fn measure(&mut self, start: usize, piece: &str) -> Segment {
        let is_tab = piece == "\t";
        let width = if is_tab {
            tab_stop_width(self.col, self.tab_width)
        } else {
            cluster_width(piece, self.method)
        };
        self.col += width;
        Segment {
            start,
            len: piece.len(),
            width,
            is_tab,
        }
    }
}

impl Iterator for Segments<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        let text = self.text;
        let (start, piece) = match &mut self.source {
            Source::Ascii { len, pos } => {
                if *pos >= *len {
                    return None;
                }
                let start = *pos;
                *pos += 1;
                self.col += 1;
                return Some(Segment {
                    start,
                    len: 1,
                    width: 1,
                    is_tab: false,
                });
            }
            Source::Codepoints(chars) => {
                let (start, c) = chars.next()?;
                (start, &text[start..start + c.len_utf8()])
            }
            Source::Clusters(clusters) => clusters.next()?,
        };
        Some(self.measure(start, piece))
    }
}

/// Segment a slice starting at column 0.
#[must_use]
pub fn segments(text: &str, method: WidthMethod, tab_width: usize) -> Segments<'_> {
    Segments::new(text, method, tab_width)
}

/// Whether every byte is printable ASCII (`0x20..0x7F`).
#[inline]
#[must_use]
pub fn is_printable_ascii(text: &str) -> bool {
    text.bytes().all(|b| (0x20..0x7F).contains(&b))
}

/// Byte offset of the grapheme boundary after `offset`, if any.
#[must_use]
pub fn next_grapheme_boundary(s: &str, offset: usize) -> Option<usize> {
    if offset >= s.len() {
        return None;
    }
    let mut cursor = GraphemeCursor::new(offset, s.len(), true);
    cursor.next_boundary(s, 0).ok().flatten()
}

/// Byte offset of the grapheme boundary before `offset`, if any.
#[must_use]
pub fn prev_grapheme_boundary(s: &str, offset: usize) -> Option<usize> {
    if offset == 0 || offset > s.len() {
        return None;
    }
    let mut cursor = GraphemeCursor::new(offset, s.len(), true);
    cursor.prev_boundary(s, 0).ok().flatten()
}
