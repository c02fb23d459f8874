//! Property-based tests for text storage, layout and editing invariants.
//!
//! Uses proptest to verify invariants that must hold across all valid inputs.

mod common;

use common::assert_handles_live;
use opentui_text::unicode::{WidthMethod, display_width};
use opentui_text::{EditBuffer, GraphemePool, TextBuffer, TextBufferView, TextOptions, WrapMode};
use proptest::prelude::*;
use unicode_segmentation::UnicodeSegmentation;

// ============================================================================
// Strategies
// ============================================================================

const PIECES: &[&str] = &[
    "a", "b", "word", " ", "  ", "\n", "é", "e\u{0301}", "中", "文", "😀", "👍🏽", "👨‍👩‍👧", "🇺🇸",
    "\r\n", ",", "x_y",
];

/// Text mixing ASCII, combining sequences, wide clusters and line breaks.
fn mixed_text() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(PIECES), 0..40).prop_map(|parts| parts.concat())
}

/// Single-line text for wrapping: words, spaces and wide clusters.
fn wrap_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec!["the", "quick", "supercalifragilistic", " ", "中文", "😀", "é"]),
        0..30,
    )
    .prop_map(|parts| parts.concat())
}

/// Char-boundary offsets of `s`, including its length.
fn boundaries(s: &str) -> Vec<usize> {
    s.char_indices().map(|(i, _)| i).chain([s.len()]).collect()
}

#[derive(Clone, Debug)]
enum Op {
    Insert { at: usize, text: String },
    Delete { from: usize, to: usize },
}

fn ops() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        (any::<usize>(), mixed_text()).prop_map(|(at, text)| Op::Insert { at, text }),
        (any::<usize>(), any::<usize>()).prop_map(|(from, to)| Op::Delete { from, to }),
    ];
    prop::collection::vec(op, 1..20)
}

/// Pick a char boundary of `s` from an arbitrary seed.
fn pick(s: &str, seed: usize) -> usize {
    let b = boundaries(s);
    b[seed % b.len()]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Exporting a range and inserting it into an empty buffer reproduces the
    /// original bytes.
    #[test]
    fn text_range_round_trips(text in mixed_text(), a in any::<usize>(), b in any::<usize>()) {
        let buffer = TextBuffer::from_text(&text).unwrap();
        let (s, e) = {
            let (x, y) = (pick(&text, a), pick(&text, b));
            (x.min(y), x.max(y))
        };
        let range = buffer.get_text_range(s, e);
        prop_assert_eq!(&range, &text[s..e]);

        let mut copy = TextBuffer::new();
        copy.insert(0, &range).unwrap();
        prop_assert_eq!(copy.plain_text(), &text[s..e]);
        prop_assert_eq!(copy.line_count(), text[s..e].matches('\n').count() + 1);
    }

    /// Every handle referenced by a live cell stays resolvable through any
    /// edit sequence, and freed handles never resolve.
    #[test]
    fn grapheme_refcounts_stay_consistent(initial in mixed_text(), ops in ops()) {
        let pool = GraphemePool::shared(None);
        let mut buffer = TextBuffer::with_pool(pool.clone(), TextOptions::default());
        buffer.set_text(&initial).unwrap();
        let mut seen = Vec::new();

        for op in ops {
            let text = buffer.plain_text();
            match op {
                Op::Insert { at, text: insert } => {
                    buffer.insert(pick(&text, at), &insert).unwrap();
                }
                Op::Delete { from, to } => {
                    let (x, y) = (pick(&text, from), pick(&text, to));
                    buffer.delete(x.min(y), x.max(y)).unwrap();
                }
            }
            assert_handles_live(&buffer);
            seen.extend(buffer.grapheme_handles());
        }

        drop(buffer);
        let pool = pool.borrow();
        prop_assert_eq!(pool.active_count(), 0);
        for handle in seen {
            prop_assert_eq!(pool.refcount(handle), 0);
            prop_assert!(pool.resolve(handle).is_err());
        }
    }

    /// Word wrap never produces a row wider than the wrap width, except a row
    /// holding a single cluster that is wider on its own.
    #[test]
    fn word_wrap_respects_width(text in wrap_text(), width in 1u32..24) {
        let buffer = TextBuffer::from_text(&text).unwrap();
        let view = TextBufferView::new(&buffer)
            .viewport(0, 0, width, 10)
            .wrap_mode(WrapMode::Word);
        let info = view.line_info(&buffer).unwrap();

        prop_assert_eq!(info.starts.len(), info.widths.len());
        prop_assert_eq!(info.sources.len(), info.wraps.len());
        prop_assert_eq!(info.wraps.first().copied(), Some(false));
        for i in 0..info.virtual_line_count() {
            let row = &text[info.starts[i]..info.ends[i]];
            let clusters = row.graphemes(true).count();
            prop_assert!(
                info.widths[i] <= width as usize || clusters == 1,
                "row {:?} has width {} > {}", row, info.widths[i], width
            );
            if i > 0 {
                prop_assert!(info.starts[i] >= info.ends[i - 1]);
                prop_assert!(info.wraps[i]);
            }
        }
        // Every cluster outside swallowed whitespace is laid out.
        let laid_out: String = (0..info.virtual_line_count())
            .map(|i| &text[info.starts[i]..info.ends[i]])
            .collect();
        prop_assert_eq!(laid_out.replace(' ', ""), text.replace(' ', ""));
    }

    /// Word wrap never breaks early: the gap swallowed after a row plus the
    /// next word would not have fit in the row's remaining width.
    #[test]
    fn word_wrap_fills_rows(text in wrap_text(), width in 1u32..24) {
        let buffer = TextBuffer::from_text(&text).unwrap();
        let view = TextBufferView::new(&buffer)
            .viewport(0, 0, width, 10)
            .wrap_mode(WrapMode::Word);
        let info = view.line_info(&buffer).unwrap();
        let measure = |s: &str| display_width(s, WidthMethod::Unicode, 4);

        for i in 0..info.virtual_line_count().saturating_sub(1) {
            if !info.wraps[i + 1] {
                continue;
            }
            let gap = &text[info.ends[i]..info.starts[i + 1]];
            let rest = &text[info.starts[i + 1]..];
            let word = rest.split(' ').next().unwrap_or("");
            let needed = measure(gap) + measure(word);
            prop_assert!(
                info.widths[i] + needed > width as usize,
                "row {} {:?} (width {}) broke before {:?} at wrap width {}",
                i, &text[info.starts[i]..info.ends[i]], info.widths[i], word, width
            );
        }
    }

    /// Undo restores the exact previous text and redo reapplies the edit.
    #[test]
    fn undo_redo_is_idempotent(initial in mixed_text(), op in ops()) {
        let mut buf = EditBuffer::with_text(&initial).unwrap();
        let before = buf.text();
        let op = op[0].clone();
        match op {
            Op::Insert { at, text } => {
                buf.set_cursor_by_offset(pick(&before, at));
                buf.insert_text(&text).unwrap();
            }
            Op::Delete { from, to } => {
                buf.delete_range_offsets(pick(&before, from), pick(&before, to)).unwrap();
            }
        }
        buf.commit();
        let after = buf.text();

        buf.undo().unwrap();
        prop_assert_eq!(buf.text(), before);
        buf.redo().unwrap();
        prop_assert_eq!(buf.text(), after);
        assert_handles_live(buf.buffer());
    }

    /// Offset to coordinates and back is the identity on char boundaries.
    #[test]
    fn coordinate_conversion_inverts(text in mixed_text()) {
        let buffer = TextBuffer::from_text(&text).unwrap();
        let rope = buffer.rope();
        for offset in boundaries(&text) {
            let (row, col) = rope.offset_to_coords(offset).unwrap();
            prop_assert_eq!(rope.coords_to_offset(row, col).unwrap(), offset);
        }
    }
}
