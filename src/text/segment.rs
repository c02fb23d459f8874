//! Styled text chunks and resolved spans.

use crate::color::Rgba;
use crate::style::{Style, TextAttributes};
use std::ops::Range;

/// A run of text with optional colors, attributes and hyperlink, used to
/// build buffer content with [`TextBuffer::set_styled`](super::TextBuffer::set_styled).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyledChunk<'a> {
    /// The text content.
    pub text: &'a str,
    /// Foreground color.
    pub fg: Option<Rgba>,
    /// Background color.
    pub bg: Option<Rgba>,
    /// Attribute flags (any link bits here are replaced by `link`).
    pub attributes: TextAttributes,
    /// Hyperlink URL.
    pub link: Option<&'a str>,
}

impl<'a> StyledChunk<'a> {
    /// Create a chunk with the colors and attributes of `style`.
    #[must_use]
    pub fn new(text: &'a str, style: Style) -> Self {
        Self {
            text,
            fg: style.fg,
            bg: style.bg,
            attributes: style.attributes.flags_only(),
            link: None,
        }
    }

    /// Create an unstyled chunk.
    #[must_use]
    pub fn plain(text: &'a str) -> Self {
        Self {
            text,
            ..Self::default()
        }
    }

    /// Attach a hyperlink.
    #[must_use]
    pub fn with_link(mut self, url: &'a str) -> Self {
        self.link = Some(url);
        self
    }

    /// Style of this chunk, without its link.
    #[must_use]
    pub fn style(&self) -> Style {
        Style::new(self.fg, self.bg, self.attributes.flags_only())
    }
}

/// A resolved, non-overlapping styled byte range of one line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StyledSpan {
    /// Absolute start byte offset.
    pub start: usize,
    /// Absolute end byte offset (exclusive).
    pub end: usize,
    /// Default style merged with the winning highlight's style.
    pub style: Style,
}

impl StyledSpan {
    /// Byte range covered.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// A highlight clipped to one line, in scalar columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineHighlight {
    /// Start column (inclusive).
    pub col_start: usize,
    /// End column (exclusive).
    pub col_end: usize,
    /// Style ID.
    pub style_id: u32,
    /// Priority.
    pub priority: u8,
    /// Owner tag.
    pub hl_ref: u16,
}
