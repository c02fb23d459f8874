//! Undo/redo history for [`EditBuffer`](super::EditBuffer).
//!
//! Edits accumulate in an open group until [`History::commit`] closes it, so
//! one undo step can cover several primitive edits (a word typed character by
//! character, a line move). The number of closed groups is bounded; the oldest
//! are dropped first.

use crate::options::DEFAULT_HISTORY_DEPTH;
use tracing::debug;

/// A primitive, reversible text edit in byte offsets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditOp {
    /// `text` was inserted at `offset`.
    Insert { offset: usize, text: String },
    /// `text` was removed from `offset`.
    Delete { offset: usize, text: String },
}

impl EditOp {
    /// The edit that undoes this one.
    #[must_use]
    pub fn invert(&self) -> Self {
        match self {
            Self::Insert { offset, text } => Self::Delete {
                offset: *offset,
                text: text.clone(),
            },
            Self::Delete { offset, text } => Self::Insert {
                offset: *offset,
                text: text.clone(),
            },
        }
    }

    /// The edit as a splice: `(start, removed_len, inserted_text)`.
    #[must_use]
    pub fn as_splice(&self) -> (usize, usize, &str) {
        match self {
            Self::Insert { offset, text } => (*offset, 0, text),
            Self::Delete { offset, text } => (*offset, text.len(), ""),
        }
    }
}

/// A closed set of edits undone and redone together.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UndoGroup {
    ops: Vec<EditOp>,
    cursor_before: usize,
    cursor_after: usize,
    meta: Vec<u8>,
}

impl UndoGroup {
    /// Edits in the order they were made.
    #[must_use]
    pub fn ops(&self) -> &[EditOp] {
        &self.ops
    }

    /// Cursor offset before the first edit.
    #[must_use]
    pub fn cursor_before(&self) -> usize {
        self.cursor_before
    }

    /// Cursor offset after the last edit.
    #[must_use]
    pub fn cursor_after(&self) -> usize {
        self.cursor_after
    }

    /// Caller payload attached at commit time.
    #[must_use]
    pub fn meta(&self) -> &[u8] {
        &self.meta
    }
}

/// What an undo or redo changed, for callers deciding what to re-render.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HistoryChange {
    /// Start of the byte range touched, in the text after the change.
    pub start: usize,
    /// End of the byte range touched, in the text after the change.
    pub end: usize,
    /// Cursor offset after the change.
    pub cursor: usize,
    /// Opaque payload recorded with [`History::commit_with_meta`].
    pub meta: Vec<u8>,
}

/// Tracks the byte range covered by a sequence of splices.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct TouchedRange(Option<(usize, usize)>);

impl TouchedRange {
    pub(crate) fn record(&mut self, start: usize, removed: usize, inserted: usize) {
        let map = |pos: usize| {
            if pos < start {
                pos
            } else if pos >= start + removed {
                pos - removed + inserted
            } else {
                start
            }
        };
        let (lo, hi) = match self.0 {
            Some((lo, hi)) => (map(lo).min(start), map(hi).max(start + inserted)),
            None => (start, start + inserted),
        };
        self.0 = Some((lo, hi));
    }

    pub(crate) fn bounds(self) -> (usize, usize) {
        self.0.unwrap_or_default()
    }
}

/// Edit history for undo/redo with bounded memory usage.
#[derive(Clone, Debug)]
pub struct History {
    undo_stack: Vec<UndoGroup>,
    redo_stack: Vec<UndoGroup>,
    current: UndoGroup,
    /// Maximum number of undo groups to retain. Oldest entries are dropped when exceeded.
    max_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_max_depth(DEFAULT_HISTORY_DEPTH)
    }
}

impl History {
    /// Create a history with the default depth.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a history with a custom maximum depth.
    #[must_use]
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            current: UndoGroup::default(),
            max_depth,
        }
    }

    /// Maximum number of undo groups kept.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Change the depth, pruning the oldest groups immediately if needed.
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
        self.prune();
    }

    fn prune(&mut self) {
        if self.undo_stack.len() > self.max_depth {
            let excess = self.undo_stack.len() - self.max_depth;
            self.undo_stack.drain(..excess);
            debug!(dropped = excess, depth = self.max_depth, "history pruned");
        }
    }

    /// Record an edit in the open group and discard the redo stack.
    pub fn push(&mut self, op: EditOp, cursor_before: usize, cursor_after: usize) {
        if self.current.ops.is_empty() {
            self.current.cursor_before = cursor_before;
        }
        self.current.ops.push(op);
        self.current.cursor_after = cursor_after;
        self.redo_stack.clear();
    }

    /// Close the open group, if it has edits.
    pub fn commit(&mut self) {
        self.commit_with_meta(Vec::new());
    }

    /// Close the open group, attaching a payload returned by undo and redo.
    pub fn commit_with_meta(&mut self, meta: Vec<u8>) {
        if self.current.ops.is_empty() {
            return;
        }
        let mut group = std::mem::take(&mut self.current);
        group.meta = meta;
        self.undo_stack.push(group);
        self.prune();
    }

    /// Close the open group and take the newest undo group.
    pub fn pop_undo(&mut self) -> Option<UndoGroup> {
        self.commit();
        self.undo_stack.pop()
    }

    /// Take the newest redo group.
    pub fn pop_redo(&mut self) -> Option<UndoGroup> {
        self.redo_stack.pop()
    }

    /// Store a group that was just undone.
    pub fn push_redo(&mut self, group: UndoGroup) {
        self.redo_stack.push(group);
    }

    /// Store a group that was just redone, keeping the redo stack.
    pub fn push_undo(&mut self, group: UndoGroup) {
        self.undo_stack.push(group);
        self.prune();
    }

    /// Check if undo is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty() || !self.current.ops.is_empty()
    }

    /// Check if redo is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of closed undo groups.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of redo groups.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Drop both stacks and the open group.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current = UndoGroup::default();
    }
}
