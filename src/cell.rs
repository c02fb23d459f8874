//! Packed per-character cell codes.
//!
//! Every display position of a line is stored as one [`CellCode`]. Printable
//! ASCII and the tab character are stored literally; everything else
//! (multi-byte clusters, wide characters, combining sequences, control
//! characters) is interned in the
//! [`GraphemePool`](crate::grapheme_pool::GraphemePool) and referenced through
//! a packed handle that also caches the display width.
//!
//! # Encoding
//!
//! ```text
//! literal: [31: 0][30-8: 0][7-0: ASCII byte or 0x09 for tab]
//! packed:  [31: 1][30-24: width (7 bits)][23-0: pool handle (24 bits)]
//! ```
//!
//! The high bit is never set for a literal, so no ASCII byte collides with a
//! packed value.

use std::fmt;

/// Handle identifying an interned grapheme cluster in a pool.
///
/// Handle 0 is reserved and never resolves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphemeHandle(u32);

impl GraphemeHandle {
    /// Largest handle value that fits the packed cell encoding.
    pub const MAX: u32 = 0x00FF_FFFF;

    /// Create a handle from a raw slot index (masked to 24 bits).
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw & Self::MAX)
    }

    /// Raw slot index.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Whether this is the reserved null handle.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for GraphemeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// One stored character position: either a literal ASCII byte or a packed
/// grapheme handle with cached width.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCode(u32);

impl CellCode {
    const PACKED_BIT: u32 = 1 << 31;
    const WIDTH_SHIFT: u32 = 24;
    const WIDTH_MASK: u32 = 0x7F << Self::WIDTH_SHIFT;
    const HANDLE_MASK: u32 = GraphemeHandle::MAX;

    /// Literal tab cell.
    pub const TAB: Self = Self(0x09);

    /// Literal cell for a printable ASCII byte (`0x20..0x7F`).
    ///
    /// Returns `None` for control bytes and anything outside ASCII; those
    /// must go through the pool.
    #[must_use]
    pub const fn ascii(byte: u8) -> Option<Self> {
        if byte >= 0x20 && byte < 0x7F {
            Some(Self(byte as u32))
        } else {
            None
        }
    }

    /// Packed cell for an interned cluster. Width saturates at 127.
    #[must_use]
    pub const fn packed(handle: GraphemeHandle, width: u8) -> Self {
        let width = if width > 0x7F { 0x7F } else { width };
        Self(Self::PACKED_BIT | ((width as u32) << Self::WIDTH_SHIFT) | handle.raw())
    }

    /// Whether this cell references the grapheme pool.
    #[must_use]
    pub const fn is_packed(self) -> bool {
        self.0 & Self::PACKED_BIT != 0
    }

    /// Whether this is the literal tab cell.
    #[must_use]
    pub const fn is_tab(self) -> bool {
        self.0 == Self::TAB.0
    }

    /// Display width in terminal cells.
    ///
    /// Tabs report 0 here; their width depends on the column they land in
    /// and is computed during layout.
    #[must_use]
    pub const fn width(self) -> usize {
        if self.is_packed() {
            ((self.0 & Self::WIDTH_MASK) >> Self::WIDTH_SHIFT) as usize
        } else if self.is_tab() {
            0
        } else {
            1
        }
    }

    /// Number of UTF-8 bytes a literal cell covers; `None` for packed cells,
    /// whose length lives in the pool.
    #[must_use]
    pub const fn literal_len(self) -> Option<usize> {
        if self.is_packed() { None } else { Some(1) }
    }

    /// Pool handle for packed cells.
    #[must_use]
    pub const fn handle(self) -> Option<GraphemeHandle> {
        if self.is_packed() {
            Some(GraphemeHandle(self.0 & Self::HANDLE_MASK))
        } else {
            None
        }
    }

    /// The literal byte for ASCII cells.
    #[must_use]
    pub const fn as_ascii(self) -> Option<u8> {
        if self.is_packed() {
            None
        } else {
            Some(self.0 as u8)
        }
    }

    /// Raw encoded value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for CellCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.as_ascii(), self.handle()) {
            (Some(byte), _) => write!(f, "CellCode({:?})", byte as char),
            (None, Some(handle)) => write!(f, "CellCode({handle}, w{})", self.width()),
            (None, None) => write!(f, "CellCode({:#x})", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_literal() {
        let cell = CellCode::ascii(b'A').unwrap();
        assert!(!cell.is_packed());
        assert_eq!(cell.as_ascii(), Some(b'A'));
        assert_eq!(cell.width(), 1);
        assert_eq!(cell.handle(), None);
    }

    #[test]
    fn test_ascii_rejects_control_and_high_bytes() {
        assert!(CellCode::ascii(b'\t').is_none());
        assert!(CellCode::ascii(0x1F).is_none());
        assert!(CellCode::ascii(0x7F).is_none());
        assert!(CellCode::ascii(0xC3).is_none());
        assert!(CellCode::ascii(b' ').is_some());
        assert!(CellCode::ascii(b'~').is_some());
    }

    #[test]
    fn test_tab_literal() {
        let tab = CellCode::TAB;
        assert!(tab.is_tab());
        assert!(!tab.is_packed());
        assert_eq!(tab.width(), 0);
        assert_eq!(tab.as_ascii(), Some(b'\t'));
        assert!(!CellCode::ascii(b' ').unwrap().is_tab());
    }

    #[test]
    fn test_packed_encoding() {
        let handle = GraphemeHandle::from_raw(0x12_3456);
        let cell = CellCode::packed(handle, 2);
        assert!(cell.is_packed());
        assert_eq!(cell.handle(), Some(handle));
        assert_eq!(cell.width(), 2);
        assert_eq!(cell.as_ascii(), None);
    }

    #[test]
    fn test_packed_width_saturates() {
        let cell = CellCode::packed(GraphemeHandle::from_raw(1), 200);
        assert_eq!(cell.width(), 127);
    }

    #[test]
    fn test_no_literal_collides_with_packed() {
        for byte in 0x20..0x7F_u8 {
            let literal = CellCode::ascii(byte).unwrap();
            assert!(!literal.is_packed());
            let packed = CellCode::packed(GraphemeHandle::from_raw(u32::from(byte)), 1);
            assert_ne!(literal, packed);
        }
    }

    #[test]
    fn test_handle_masked_to_24_bits() {
        let handle = GraphemeHandle::from_raw(0xFF00_0001);
        assert_eq!(handle.raw(), 1);
        assert!(GraphemeHandle::default().is_null());
    }
}
