//! Error types for the text core.

use crate::text::MemId;
use std::io;
use thiserror::Error;

/// Result type alias for text core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for text core operations.
///
/// Mutating operations validate their arguments before touching any state, so
/// an `Err` always means the target was left exactly as it was.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error while loading a file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Byte offset past the end of the text.
    #[error("offset {offset} out of range for text of {len} bytes")]
    OutOfRange { offset: usize, len: usize },
    /// Row/column pair that does not address a position in the text.
    #[error("coordinates ({row}, {col}) out of range")]
    InvalidCoords { row: usize, col: usize },
    /// Byte offset that falls inside a multi-byte codepoint.
    #[error("offset {offset} is not on a UTF-8 character boundary")]
    NotCharBoundary { offset: usize },
    /// Input bytes that are not valid UTF-8.
    #[error("invalid UTF-8 input: {0}")]
    InvalidEncoding(#[from] std::str::Utf8Error),
    /// The grapheme pool has no free slot left.
    #[error("grapheme pool exhausted (capacity {capacity})")]
    PoolExhausted { capacity: usize },
    /// Memory registry lookup with an ID that was never registered or was removed.
    #[error("unknown memory registry id {0}")]
    UnknownMemId(MemId),
    /// Every memory registry ID has been handed out.
    #[error("memory registry ids exhausted")]
    MemIdsExhausted,
    /// Generation-checked handle whose slot was removed or reused.
    #[error("stale handle")]
    StaleHandle,
    /// A view was used with a buffer it was not created for.
    #[error("view is bound to a different text buffer")]
    BufferMismatch,
}
