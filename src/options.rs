//! Construction options for buffers and editors.

use crate::unicode::WidthMethod;

/// Default tab width in cells.
pub const DEFAULT_TAB_WIDTH: u8 = 4;

/// Default number of undo groups kept.
pub const DEFAULT_HISTORY_DEPTH: usize = 1000;

/// Options consumed by [`TextBuffer::with_options`](crate::TextBuffer::with_options),
/// [`EditBuffer::with_options`](crate::EditBuffer::with_options) and
/// [`EditorView::with_options`](crate::EditorView::with_options).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextOptions {
    /// Tab width in cells. Zero is treated as 1.
    pub tab_width: u8,
    /// Width policy used to segment and measure text.
    pub width_method: WidthMethod,
    /// Maximum number of undo groups kept by an edit buffer.
    pub max_history_depth: usize,
    /// Maximum number of active clusters in a freshly created grapheme pool.
    /// `None` means limited only by the handle space.
    pub pool_capacity: Option<usize>,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            tab_width: DEFAULT_TAB_WIDTH,
            width_method: WidthMethod::default(),
            max_history_depth: DEFAULT_HISTORY_DEPTH,
            pool_capacity: None,
        }
    }
}

impl TextOptions {
    /// Set the tab width.
    #[must_use]
    pub const fn with_tab_width(mut self, tab_width: u8) -> Self {
        self.tab_width = tab_width;
        self
    }

    /// Set the width policy.
    #[must_use]
    pub const fn with_width_method(mut self, method: WidthMethod) -> Self {
        self.width_method = method;
        self
    }

    /// Set the undo depth.
    #[must_use]
    pub const fn with_max_history_depth(mut self, depth: usize) -> Self {
        self.max_history_depth = depth;
        self
    }

    /// Limit the grapheme pool.
    #[must_use]
    pub const fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = Some(capacity);
        self
    }

    /// Tab width as used by layout (never zero).
    #[must_use]
    pub fn effective_tab_width(&self) -> usize {
        usize::from(self.tab_width.max(1))
    }
}
