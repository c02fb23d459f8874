//! Unicode utilities: cluster segmentation and display width.

mod grapheme;
mod width;

pub use grapheme::{
    Segment, Segments, is_printable_ascii, next_grapheme_boundary, prev_grapheme_boundary,
    segments,
};
pub use width::{
    WidthMethod, char_width, cluster_width, display_width, is_control, tab_stop_width,
};
