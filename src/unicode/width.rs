//! Display width calculation for terminal rendering.

use std::fmt;
use std::str::FromStr;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Width policy used to segment text and measure clusters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WidthMethod {
    /// Legacy wcwidth-style table: every codepoint is measured on its own and
    /// zero-width codepoints attach to their neighbor. Also called "narrow".
    WcWidth,
    /// Extended grapheme clusters (emoji, ZWJ sequences, combining marks) are
    /// measured as one unit, capped at two cells. Also called "wide".
    #[default]
    Unicode,
}

impl WidthMethod {
    /// Short policy name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WcWidth => "narrow",
            Self::Unicode => "wide",
        }
    }
}

impl fmt::Display for WidthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WidthMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "narrow" | "wcwidth" => Ok(Self::WcWidth),
            "wide" | "unicode" => Ok(Self::Unicode),
            other => Err(format!("unknown width method: {other}")),
        }
    }
}

/// Whether a character is a C0/C1 control (or DEL).
#[inline]
#[must_use]
pub fn is_control(c: char) -> bool {
    c < ' ' || ('\u{7f}'..='\u{9f}').contains(&c)
}

/// Width of a single codepoint. Control characters are zero width.
///
/// Includes a fast path for printable ASCII, which is always width 1.
#[inline]
#[must_use]
pub fn char_width(c: char) -> usize {
    if c.is_ascii() && (' '..='~').contains(&c) {
        return 1;
    }
    if is_control(c) {
        return 0;
    }
    UnicodeWidthChar::width(c).unwrap_or(0)
}

/// Width of one segment produced under `method`, excluding tabs.
///
/// For [`WidthMethod::Unicode`] the cluster is measured as a whole and capped
/// at 2; for [`WidthMethod::WcWidth`] the widths of its codepoints are summed.
#[must_use]
pub fn cluster_width(cluster: &str, method: WidthMethod) -> usize {
    match method {
        WidthMethod::WcWidth => cluster.chars().map(char_width).sum(),
        WidthMethod::Unicode => {
            let Some(first) = cluster.chars().next() else {
                return 0;
            };
            if is_control(first) {
                return 0;
            }
            if cluster.len() == first.len_utf8() {
                return char_width(first);
            }
            UnicodeWidthStr::width(cluster).min(2)
        }
    }
}

/// Cells a tab occupies when it starts at `col`.
#[inline]
#[must_use]
pub fn tab_stop_width(col: usize, tab_width: usize) -> usize {
    let tab_width = tab_width.max(1);
    tab_width - (col % tab_width)
}

/// Display width of a whole line starting at column 0, expanding tabs.
#[must_use]
pub fn display_width(s: &str, method: WidthMethod, tab_width: usize) -> usize {
    crate::unicode::segments(s, method, tab_width)
        .map(|seg| seg.width)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_width() {
        assert_eq!(display_width("hello", WidthMethod::Unicode, 4), 5);
        assert_eq!(char_width('a'), 1);
    }

    #[test]
    fn test_cjk_width() {
        assert_eq!(display_width("漢字", WidthMethod::Unicode, 4), 4);
        assert_eq!(display_width("漢字", WidthMethod::WcWidth, 4), 4);
        assert_eq!(char_width('漢'), 2);
    }

    #[test]
    fn test_emoji_width() {
        assert_eq!(cluster_width("😀", WidthMethod::Unicode), 2);
        assert_eq!(cluster_width("👨‍👩‍👧", WidthMethod::Unicode), 2);
    }

    #[test]
    fn test_zero_width() {
        assert_eq!(char_width('\u{0301}'), 0);
        assert_eq!(char_width('\r'), 0);
        assert_eq!(char_width('\u{1b}'), 0);
        assert_eq!(cluster_width("e\u{0301}", WidthMethod::Unicode), 1);
        assert_eq!(cluster_width("e\u{0301}", WidthMethod::WcWidth), 1);
    }

    #[test]
    fn test_tab_stops() {
        assert_eq!(tab_stop_width(0, 4), 4);
        assert_eq!(tab_stop_width(1, 4), 3);
        assert_eq!(tab_stop_width(4, 4), 4);
        assert_eq!(tab_stop_width(3, 0), 1);
        assert_eq!(display_width("ab\tc", WidthMethod::Unicode, 4), 5);
    }

    #[test]
    fn test_width_method_parse() {
        assert_eq!("narrow".parse::<WidthMethod>(), Ok(WidthMethod::WcWidth));
        assert_eq!("WIDE".parse::<WidthMethod>(), Ok(WidthMethod::Unicode));
        assert!("other".parse::<WidthMethod>().is_err());
        assert_eq!(WidthMethod::default().to_string(), "wide");
    }
}
