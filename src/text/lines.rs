//! Per-line cell ledger.
//!
//! Each logical line keeps one [`CellCode`] per display cluster. Building a
//! line interns its non-ASCII clusters in the grapheme pool; replacing or
//! dropping a line releases them. Zero-width clusters never get a cell of
//! their own: they attach to the preceding cluster, or to the following one
//! at the start of a line or after a tab. The one exception is a run with no
//! neighbor to join (a line holding only zero-width clusters, or such a run
//! between a tab and the line end). It becomes a single width-0 cell so every
//! byte of the line stays covered by the ledger.

use crate::cell::CellCode;
use crate::error::Result;
use crate::grapheme_pool::GraphemePool;
use crate::unicode::{WidthMethod, is_printable_ascii, segments};
use tracing::warn;

/// Byte length and width of one stored cell, as used by layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellMetric {
    /// UTF-8 bytes covered by the cell.
    pub len: usize,
    /// Display width; 0 for tabs, whose width depends on their column.
    pub width: usize,
    /// Whether the cell is a tab.
    pub is_tab: bool,
}

#[derive(Clone, Copy, Debug)]
struct Piece {
    start: usize,
    end: usize,
    width: usize,
    is_tab: bool,
}

/// Split a line into cell-sized pieces, folding zero-width clusters into a
/// neighbor.
fn pieces(line: &str, method: WidthMethod) -> Vec<Piece> {
    let mut out: Vec<Piece> = Vec::new();
    let mut pending_start: Option<usize> = None;

    for seg in segments(line, method, 1) {
        if seg.is_tab {
            if let Some(start) = pending_start.take() {
                out.push(Piece {
                    start,
                    end: seg.start,
                    width: 0,
                    is_tab: false,
                });
            }
            out.push(Piece {
                start: seg.start,
                end: seg.end(),
                width: 0,
                is_tab: true,
            });
            continue;
        }
        if seg.width == 0 {
            match out.last_mut() {
                Some(last) if !last.is_tab && pending_start.is_none() => last.end = seg.end(),
                _ => {
                    pending_start.get_or_insert(seg.start);
                }
            }
            continue;
        }
        out.push(Piece {
            start: pending_start.take().unwrap_or(seg.start),
            end: seg.end(),
            width: seg.width,
            is_tab: false,
        });
    }

    if let Some(start) = pending_start {
        out.push(Piece {
            start,
            end: line.len(),
            width: 0,
            is_tab: false,
        });
    }
    out
}

/// Release every packed handle in `cells`.
fn release_cells(cells: &[CellCode], pool: &mut GraphemePool) {
    for handle in cells.iter().filter_map(|c| c.handle()) {
        if let Err(err) = pool.release(handle) {
            warn!(%handle, %err, "released a cell handle that was not live");
        }
    }
}

/// Build the cells for one line (without its `\n`).
///
/// # Errors
///
/// Returns the pool's error if interning fails; every handle interned for
/// this line so far is released first.
pub fn build_line(
    line: &str,
    method: WidthMethod,
    pool: &mut GraphemePool,
) -> Result<Vec<CellCode>> {
    if is_printable_ascii(line) {
        return Ok(line.bytes().filter_map(CellCode::ascii).collect());
    }

    let pieces = pieces(line, method);
    let mut cells = Vec::with_capacity(pieces.len());
    for piece in pieces {
        let text = &line[piece.start..piece.end];
        let cell = if piece.is_tab {
            CellCode::TAB
        } else if let Some(cell) = single_ascii(text) {
            cell
        } else {
            match pool.intern(text) {
                Ok(handle) => {
                    let width = u8::try_from(piece.width).unwrap_or(u8::MAX);
                    CellCode::packed(handle, width)
                }
                Err(err) => {
                    release_cells(&cells, pool);
                    return Err(err);
                }
            }
        };
        cells.push(cell);
    }
    Ok(cells)
}

fn single_ascii(text: &str) -> Option<CellCode> {
    match text.as_bytes() {
        [byte] => CellCode::ascii(*byte),
        _ => None,
    }
}

/// Build cells for several lines, all or nothing.
fn build_lines<'a>(
    lines: impl IntoIterator<Item = &'a str>,
    method: WidthMethod,
    pool: &mut GraphemePool,
) -> Result<Vec<Vec<CellCode>>> {
    let mut built = Vec::new();
    for line in lines {
        match build_line(line, method, pool) {
            Ok(cells) => built.push(cells),
            Err(err) => {
                for cells in &built {
                    release_cells(cells, pool);
                }
                return Err(err);
            }
        }
    }
    Ok(built)
}

/// Cells of every logical line of a buffer.
#[derive(Debug)]
pub struct CellLedger {
    lines: Vec<Vec<CellCode>>,
}

impl Default for CellLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl CellLedger {
    /// A ledger holding one empty line.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: vec![Vec::new()],
        }
    }

    /// Number of lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Cells of one line.
    #[must_use]
    pub fn line(&self, row: usize) -> Option<&[CellCode]> {
        self.lines.get(row).map(Vec::as_slice)
    }

    /// Replace lines `first..=last` with cells built from `new_lines`.
    ///
    /// New cells are built before anything is touched, so on error the ledger
    /// and pool refcounts are unchanged.
    ///
    /// # Errors
    ///
    /// Propagates grapheme pool errors.
    pub fn replace_lines<'a>(
        &mut self,
        first: usize,
        last: usize,
        new_lines: impl IntoIterator<Item = &'a str>,
        method: WidthMethod,
        pool: &mut GraphemePool,
    ) -> Result<()> {
        let built = build_lines(new_lines, method, pool)?;
        let last = last.min(self.lines.len().saturating_sub(1));
        let old: Vec<Vec<CellCode>> = self.lines.splice(first..=last, built).collect();
        for cells in &old {
            release_cells(cells, pool);
        }
        Ok(())
    }

    /// Rebuild every line from `text`, all or nothing.
    ///
    /// # Errors
    ///
    /// Propagates grapheme pool errors.
    pub fn rebuild_all(
        &mut self,
        text: &str,
        method: WidthMethod,
        pool: &mut GraphemePool,
    ) -> Result<()> {
        let last = self.lines.len() - 1;
        self.replace_lines(0, last, text.split('\n'), method, pool)
    }

    /// Drop every line, leaving one empty line.
    pub fn clear(&mut self, pool: &mut GraphemePool) {
        for cells in &self.lines {
            release_cells(cells, pool);
        }
        self.lines = vec![Vec::new()];
    }

    /// Byte lengths and widths of a line's cells.
    #[must_use]
    pub fn metrics(&self, row: usize, pool: &GraphemePool) -> Vec<CellMetric> {
        let Some(cells) = self.lines.get(row) else {
            return Vec::new();
        };
        cells
            .iter()
            .map(|cell| CellMetric {
                len: cell.literal_len().unwrap_or_else(|| {
                    cell.handle()
                        .and_then(|h| pool.resolve(h).ok())
                        .map_or(0, str::len)
                }),
                width: cell.width(),
                is_tab: cell.is_tab(),
            })
            .collect()
    }

    /// Every packed handle currently stored, with repeats.
    pub fn handles(&self) -> impl Iterator<Item = crate::cell::GraphemeHandle> + '_ {
        self.lines
            .iter()
            .flatten()
            .filter_map(|cell| cell.handle())
    }

    /// Heap bytes held by the ledger.
    #[must_use]
    pub fn arena_bytes(&self) -> usize {
        self.lines
            .iter()
            .map(|l| l.capacity() * std::mem::size_of::<CellCode>())
            .sum::<usize>()
            + self.lines.capacity() * std::mem::size_of::<Vec<CellCode>>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn texts(cells: &[CellCode], pool: &GraphemePool) -> Vec<String> {
        cells
            .iter()
            .map(|c| match (c.as_ascii(), c.handle()) {
                (Some(b), _) => (b as char).to_string(),
                (None, Some(h)) => pool.resolve(h).unwrap().to_string(),
                (None, None) => unreachable!(),
            })
            .collect()
    }

    #[test]
    fn test_ascii_line_is_literal() {
        let mut pool = GraphemePool::new();
        let cells = build_line("hello", WidthMethod::Unicode, &mut pool).unwrap();
        assert_eq!(cells.len(), 5);
        assert!(cells.iter().all(|c| !c.is_packed()));
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn test_accented_char_is_one_cell() {
        let mut pool = GraphemePool::new();
        let cells = build_line("héllo\tworld", WidthMethod::Unicode, &mut pool).unwrap();
        assert_eq!(cells.len(), 11);
        assert!(cells[1].is_packed());
        assert_eq!(pool.resolve(cells[1].handle().unwrap()).unwrap(), "é");
        assert!(cells[5].is_tab());
    }

    #[test]
    fn test_zero_width_merges_into_previous() {
        let mut pool = GraphemePool::new();
        let cells = build_line("ae\u{0301}\r", WidthMethod::WcWidth, &mut pool).unwrap();
        assert_eq!(texts(&cells, &pool), vec!["a", "e\u{0301}\r"]);
        assert_eq!(cells[1].width(), 1);
    }

    #[test]
    fn test_leading_zero_width_merges_into_next() {
        let mut pool = GraphemePool::new();
        let cells = build_line("\u{0301}ab", WidthMethod::WcWidth, &mut pool).unwrap();
        assert_eq!(texts(&cells, &pool), vec!["\u{0301}a", "b"]);
    }

    #[test]
    fn test_unattached_zero_width_run_is_one_empty_cell() {
        let mut pool = GraphemePool::new();
        let cells = build_line("\u{200b}\u{200b}", WidthMethod::Unicode, &mut pool).unwrap();
        assert_eq!(texts(&cells, &pool), vec!["\u{200b}\u{200b}"]);
        assert_eq!(cells[0].width(), 0);

        let cells = build_line("a\t\u{200b}", WidthMethod::Unicode, &mut pool).unwrap();
        assert_eq!(cells.len(), 3);
        assert_eq!(texts(&cells, &pool)[2], "\u{200b}");
        assert_eq!(cells[2].width(), 0);
    }

    #[test]
    fn test_failed_build_releases_partial_handles() {
        let mut pool = GraphemePool::with_capacity_limit(2);
        let err = build_line("αβγ", WidthMethod::Unicode, &mut pool).unwrap_err();
        assert!(matches!(err, Error::PoolExhausted { .. }));
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn test_replace_lines_is_atomic() {
        let mut pool = GraphemePool::with_capacity_limit(2);
        let mut ledger = CellLedger::new();
        ledger
            .replace_lines(0, 0, ["aα", "β"], WidthMethod::Unicode, &mut pool)
            .unwrap();
        assert_eq!(ledger.line_count(), 2);

        let err = ledger.replace_lines(0, 1, ["γδε"], WidthMethod::Unicode, &mut pool);
        assert!(err.is_err());
        assert_eq!(ledger.line_count(), 2);
        assert_eq!(pool.active_count(), 2);

        ledger.clear(&mut pool);
        assert_eq!(pool.active_count(), 0);
        assert_eq!(ledger.line_count(), 1);
    }

    #[test]
    fn test_metrics() {
        let mut pool = GraphemePool::new();
        let mut ledger = CellLedger::new();
        ledger.rebuild_all("a漢\t", WidthMethod::Unicode, &mut pool).unwrap();
        let metrics = ledger.metrics(0, &pool);
        assert_eq!(
            metrics,
            vec![
                CellMetric { len: 1, width: 1, is_tab: false },
                CellMetric { len: 3, width: 2, is_tab: false },
                CellMetric { len: 1, width: 0, is_tab: true },
            ]
        );
    }
}
