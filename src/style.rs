//! Text styling with attributes and colors.
//!
//! - [`TextAttributes`]: Bitflags for bold, italic, underline, etc., with a
//!   hyperlink ID packed into the upper bits
//! - [`Style`]: Colors plus attributes, registered in a
//!   [`SyntaxStyleRegistry`](crate::highlight::SyntaxStyleRegistry) and
//!   referenced from highlights by ID
//!
//! ```
//! use opentui_text::{Rgba, Style, TextAttributes};
//!
//! let keyword = Style::builder().fg(Rgba::BLUE).bold().build();
//! let merged = Style::fg(Rgba::WHITE).merge(keyword);
//! assert_eq!(merged.fg, Some(Rgba::BLUE));
//! assert!(merged.attributes.contains(TextAttributes::BOLD));
//! ```

use crate::color::Rgba;
use bitflags::bitflags;

bitflags! {
    /// Text rendering attributes (bold, italic, underline, etc.).
    ///
    /// Link IDs are packed into the upper 24 bits.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    pub struct TextAttributes: u32 {
        /// Bold/increased intensity.
        const BOLD          = 0x01;
        /// Dim/decreased intensity.
        const DIM           = 0x02;
        /// Italic.
        const ITALIC        = 0x04;
        /// Underlined text.
        const UNDERLINE     = 0x08;
        /// Blinking text.
        const BLINK         = 0x10;
        /// Swapped foreground/background.
        const INVERSE       = 0x20;
        /// Hidden/invisible text.
        const HIDDEN        = 0x40;
        /// Strikethrough text.
        const STRIKETHROUGH = 0x80;
    }
}

impl TextAttributes {
    /// Mask for the lower 8 bits containing style flags.
    pub const FLAGS_MASK: u32 = 0x0000_00FF;
    /// Mask for the upper 24 bits containing link ID.
    pub const LINK_ID_MASK: u32 = 0xFFFF_FF00;
    /// Bit shift for link ID storage.
    pub const LINK_ID_SHIFT: u32 = 8;
    /// Maximum link ID that fits in 24 bits.
    pub const MAX_LINK_ID: u32 = 0x00FF_FFFF;

    /// Extract the link ID (if any).
    #[must_use]
    pub const fn link_id(self) -> Option<u32> {
        let id = (self.bits() & Self::LINK_ID_MASK) >> Self::LINK_ID_SHIFT;
        if id == 0 { None } else { Some(id) }
    }

    /// Return attributes with a link ID set (masked to 24 bits).
    #[must_use]
    pub const fn with_link_id(self, link_id: u32) -> Self {
        let id = link_id & Self::MAX_LINK_ID;
        let bits = (self.bits() & Self::FLAGS_MASK) | (id << Self::LINK_ID_SHIFT);
        Self::from_bits_retain(bits)
    }

    /// Return only the style flags (link ID cleared).
    #[must_use]
    pub const fn flags_only(self) -> Self {
        Self::from_bits_retain(self.bits() & Self::FLAGS_MASK)
    }

    /// Merge attributes: OR flags, prefer `other` link ID when set.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        let flags = (self.bits() | other.bits()) & Self::FLAGS_MASK;
        let link_bits = if (other.bits() & Self::LINK_ID_MASK) != 0 {
            other.bits() & Self::LINK_ID_MASK
        } else {
            self.bits() & Self::LINK_ID_MASK
        };
        Self::from_bits_retain(flags | link_bits)
    }
}

/// Foreground, background and attributes applied to a run of text.
///
/// `None` colors mean "inherit" (from the buffer default, and ultimately the
/// terminal default).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Style {
    /// Foreground color.
    pub fg: Option<Rgba>,
    /// Background color.
    pub bg: Option<Rgba>,
    /// Text rendering attributes.
    pub attributes: TextAttributes,
}

impl Style {
    /// Empty style with no colors or attributes.
    pub const NONE: Self = Self {
        fg: None,
        bg: None,
        attributes: TextAttributes::empty(),
    };

    /// Create a new style builder.
    #[must_use]
    pub fn builder() -> StyleBuilder {
        StyleBuilder::default()
    }

    /// Create a style with only foreground color.
    #[must_use]
    pub const fn fg(color: Rgba) -> Self {
        Self {
            fg: Some(color),
            ..Self::NONE
        }
    }

    /// Create a style with only background color.
    #[must_use]
    pub const fn bg(color: Rgba) -> Self {
        Self {
            bg: Some(color),
            ..Self::NONE
        }
    }

    /// Create a style from optional colors and attributes.
    #[must_use]
    pub const fn new(fg: Option<Rgba>, bg: Option<Rgba>, attributes: TextAttributes) -> Self {
        Self { fg, bg, attributes }
    }

    /// Return a new style with the specified attributes added.
    #[must_use]
    pub const fn with_attributes(self, attrs: TextAttributes) -> Self {
        Self {
            attributes: self.attributes.merge(attrs),
            ..self
        }
    }

    /// Return a new style with a hyperlink ID.
    #[must_use]
    pub const fn with_link(self, link_id: u32) -> Self {
        Self {
            attributes: self.attributes.with_link_id(link_id),
            ..self
        }
    }

    /// Check if this style has any non-default properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fg.is_none() && self.bg.is_none() && self.attributes.is_empty()
    }

    /// Merge two styles, with `other` taking precedence for set values.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            fg: other.fg.or(self.fg),
            bg: other.bg.or(self.bg),
            attributes: self.attributes.merge(other.attributes),
        }
    }

    /// Exact, hashable identity of this style, used to deduplicate
    /// registrations.
    #[must_use]
    pub fn key(&self) -> StyleKey {
        StyleKey {
            fg: self.fg.map(Rgba::to_bits),
            bg: self.bg.map(Rgba::to_bits),
            attributes: self.attributes.bits(),
        }
    }
}

/// Bitwise identity of a [`Style`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StyleKey {
    fg: Option<u128>,
    bg: Option<u128>,
    attributes: u32,
}

/// Builder for creating styles fluently.
#[derive(Clone, Debug, Default)]
pub struct StyleBuilder {
    style: Style,
}

impl StyleBuilder {
    /// Set foreground color.
    #[must_use]
    pub fn fg(mut self, color: Rgba) -> Self {
        self.style.fg = Some(color);
        self
    }

    /// Set background color.
    #[must_use]
    pub fn bg(mut self, color: Rgba) -> Self {
        self.style.bg = Some(color);
        self
    }

    /// Add bold attribute.
    #[must_use]
    pub fn bold(mut self) -> Self {
        self.style.attributes |= TextAttributes::BOLD;
        self
    }

    /// Add italic attribute.
    #[must_use]
    pub fn italic(mut self) -> Self {
        self.style.attributes |= TextAttributes::ITALIC;
        self
    }

    /// Add underline attribute.
    #[must_use]
    pub fn underline(mut self) -> Self {
        self.style.attributes |= TextAttributes::UNDERLINE;
        self
    }

    /// Add arbitrary attribute flags.
    #[must_use]
    pub fn attributes(mut self, attrs: TextAttributes) -> Self {
        self.style.attributes = self.style.attributes.merge(attrs);
        self
    }

    /// Build the final style.
    #[must_use]
    pub fn build(self) -> Style {
        self.style
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_builder() {
        let style = Style::builder()
            .fg(Rgba::RED)
            .bg(Rgba::BLACK)
            .bold()
            .underline()
            .build();

        assert_eq!(style.fg, Some(Rgba::RED));
        assert_eq!(style.bg, Some(Rgba::BLACK));
        assert!(style.attributes.contains(TextAttributes::BOLD));
        assert!(style.attributes.contains(TextAttributes::UNDERLINE));
    }

    #[test]
    fn test_style_merge() {
        let base = Style::fg(Rgba::RED).with_attributes(TextAttributes::BOLD);
        let overlay = Style::bg(Rgba::BLUE).with_attributes(TextAttributes::ITALIC);

        let merged = base.merge(overlay);

        assert_eq!(merged.fg, Some(Rgba::RED));
        assert_eq!(merged.bg, Some(Rgba::BLUE));
        assert!(merged.attributes.contains(TextAttributes::BOLD));
        assert!(merged.attributes.contains(TextAttributes::ITALIC));
    }

    #[test]
    fn test_style_key_identity() {
        let a = Style::fg(Rgba::RED).with_link(3);
        let b = Style::builder().fg(Rgba::RED).build().with_link(3);
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), Style::fg(Rgba::RED).key());
    }

    #[test]
    fn test_text_attributes_link_id_packing() {
        let attrs = TextAttributes::BOLD.with_link_id(0x12_3456);
        assert!(attrs.contains(TextAttributes::BOLD));
        assert_eq!(attrs.link_id(), Some(0x12_3456));
        assert_eq!(attrs.flags_only(), TextAttributes::BOLD);
    }

    #[test]
    fn test_text_attributes_merge_link_id_preference() {
        let base = TextAttributes::BOLD.with_link_id(1);
        let merged = base.merge(TextAttributes::ITALIC);
        assert_eq!(merged.link_id(), Some(1));

        let merged_with_link = base.merge(TextAttributes::UNDERLINE.with_link_id(2));
        assert_eq!(merged_with_link.link_id(), Some(2));
        assert!(merged_with_link.contains(TextAttributes::BOLD));
    }
}
