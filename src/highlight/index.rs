//! Highlight storage keyed by absolute byte ranges.
//!
//! Every highlight is kept as one `start..end` byte range over the whole text,
//! ordered by start. Line- and column-based entry points convert to this form
//! before storing, and edits shift or shrink ranges through
//! [`HighlightIndex::apply_splice`].

use std::ops::Range;

/// A styled range contributed by some owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Highlight {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
    /// Style ID in the buffer's style registry.
    pub style_id: u32,
    /// Higher priority wins where highlights overlap.
    pub priority: u8,
    /// Owner tag used to remove a caller's highlights in bulk.
    pub hl_ref: u16,
    seq: u64,
}

impl Highlight {
    /// Create a highlight over `start..end`.
    #[must_use]
    pub const fn new(start: usize, end: usize, style_id: u32, priority: u8, hl_ref: u16) -> Self {
        Self {
            start,
            end,
            style_id,
            priority,
            hl_ref,
            seq: 0,
        }
    }

    /// Byte range covered.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Whether this highlight covers no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Whether this highlight overlaps `start..end`.
    #[must_use]
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }

    /// Whether `self` beats `other` where both apply: higher priority, then
    /// the one added later.
    #[must_use]
    pub fn wins_over(&self, other: &Self) -> bool {
        (self.priority, self.seq) > (other.priority, other.seq)
    }
}

/// Ordered collection of [`Highlight`]s.
#[derive(Clone, Debug, Default)]
pub struct HighlightIndex {
    items: Vec<Highlight>,
    next_seq: u64,
}

impl HighlightIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a highlight. Empty ranges are ignored; returns whether it was stored.
    pub fn add(&mut self, mut highlight: Highlight) -> bool {
        if highlight.is_empty() {
            return false;
        }
        highlight.seq = self.next_seq;
        self.next_seq += 1;
        let at = self.items.partition_point(|h| h.start <= highlight.start);
        self.items.insert(at, highlight);
        true
    }

    /// Remove every highlight tagged `hl_ref`, returning how many were removed.
    ///
    /// Scans all highlights: O(n) in the total count, with no per-owner index
    /// to keep in sync on edits.
    pub fn remove_by_ref(&mut self, hl_ref: u16) -> usize {
        let before = self.items.len();
        self.items.retain(|h| h.hl_ref != hl_ref);
        before - self.items.len()
    }

    /// Cut `start..end` out of every highlight matching `filter`, keeping the
    /// parts that fall outside the range.
    pub fn clear_range(&mut self, start: usize, end: usize, filter: Option<u16>) {
        let mut kept = Vec::with_capacity(self.items.len());
        for h in self.items.drain(..) {
            let matches = filter.is_none_or(|r| r == h.hl_ref);
            if !matches || !h.overlaps(start, end) {
                kept.push(h);
                continue;
            }
            if h.start < start {
                kept.push(Highlight { end: start, ..h });
            }
            if h.end > end {
                kept.push(Highlight { start: end, ..h });
            }
        }
        kept.sort_by_key(|h| (h.start, h.seq));
        self.items = kept;
    }

    /// Remove every highlight.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Update ranges after `start..old_end` was replaced by `new_len` bytes.
    ///
    /// Positions before the edit stay put, positions after it move by the size
    /// difference, and positions inside the removed bytes collapse to `start`.
    /// A highlight ending exactly at an insertion point does not grow.
    /// Highlights left empty are dropped.
    pub fn apply_splice(&mut self, start: usize, old_end: usize, new_len: usize) {
        let map = |pos: usize| {
            if pos < start {
                pos
            } else if pos >= old_end {
                pos - (old_end - start) + new_len
            } else {
                start
            }
        };
        for h in &mut self.items {
            if h.end <= start {
                continue;
            }
            h.start = map(h.start);
            h.end = map(h.end);
        }
        self.items.retain(|h| !h.is_empty());
    }

    /// Highlights overlapping `start..end`, in start order.
    pub fn overlapping(&self, start: usize, end: usize) -> impl Iterator<Item = &Highlight> {
        let upper = self.items.partition_point(|h| h.start < end);
        self.items[..upper]
            .iter()
            .filter(move |h| h.overlaps(start, end))
    }

    /// The winning highlight covering `pos`, if any.
    #[must_use]
    pub fn winner_at(&self, pos: usize) -> Option<&Highlight> {
        self.overlapping(pos, pos + 1)
            .fold(None, |best: Option<&Highlight>, h| match best {
                Some(b) if !h.wins_over(b) => Some(b),
                _ => Some(h),
            })
    }

    /// All highlights in start order.
    pub fn iter(&self) -> impl Iterator<Item = &Highlight> {
        self.items.iter()
    }

    /// Number of highlights.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(index: &HighlightIndex) -> Vec<(usize, usize)> {
        index.iter().map(|h| (h.start, h.end)).collect()
    }

    #[test]
    fn test_add_keeps_start_order() {
        let mut index = HighlightIndex::new();
        index.add(Highlight::new(5, 8, 1, 0, 0));
        index.add(Highlight::new(0, 3, 1, 0, 0));
        index.add(Highlight::new(2, 9, 1, 0, 0));
        assert!(!index.add(Highlight::new(4, 4, 1, 0, 0)));
        assert_eq!(ranges(&index), vec![(0, 3), (2, 9), (5, 8)]);
    }

    #[test]
    fn test_remove_by_ref() {
        let mut index = HighlightIndex::new();
        index.add(Highlight::new(0, 5, 1, 1, 7));
        index.add(Highlight::new(0, 5, 2, 2, 9));
        index.add(Highlight::new(6, 9, 1, 1, 7));
        assert_eq!(index.remove_by_ref(7), 2);
        assert_eq!(index.len(), 1);
        assert_eq!(index.iter().next().unwrap().hl_ref, 9);
    }

    #[test]
    fn test_winner_by_priority_then_recency() {
        let mut index = HighlightIndex::new();
        index.add(Highlight::new(0, 10, 1, 2, 0));
        index.add(Highlight::new(3, 6, 2, 1, 0));
        index.add(Highlight::new(4, 5, 3, 2, 0));
        assert_eq!(index.winner_at(0).unwrap().style_id, 1);
        assert_eq!(index.winner_at(3).unwrap().style_id, 1);
        assert_eq!(index.winner_at(4).unwrap().style_id, 3);
        assert!(index.winner_at(10).is_none());
    }

    #[test]
    fn test_splice_insert() {
        let mut index = HighlightIndex::new();
        index.add(Highlight::new(0, 3, 1, 0, 0));
        index.add(Highlight::new(3, 6, 1, 0, 0));
        index.add(Highlight::new(1, 5, 1, 0, 0));
        // Insert 2 bytes at offset 3.
        index.apply_splice(3, 3, 2);
        assert_eq!(ranges(&index), vec![(0, 3), (1, 7), (5, 8)]);
    }

    #[test]
    fn test_splice_delete_shrinks_and_drops() {
        let mut index = HighlightIndex::new();
        index.add(Highlight::new(0, 4, 1, 0, 0));
        index.add(Highlight::new(4, 6, 1, 0, 0));
        index.add(Highlight::new(5, 10, 1, 0, 0));
        // Delete 3..7.
        index.apply_splice(3, 7, 0);
        assert_eq!(ranges(&index), vec![(0, 3), (3, 6)]);
    }

    #[test]
    fn test_clear_range_splits() {
        let mut index = HighlightIndex::new();
        index.add(Highlight::new(0, 10, 1, 0, 1));
        index.add(Highlight::new(4, 6, 1, 0, 2));
        index.clear_range(3, 7, Some(1));
        assert_eq!(ranges(&index), vec![(0, 3), (4, 6), (7, 10)]);
        index.clear_range(0, 20, None);
        assert!(index.is_empty());
    }
}
