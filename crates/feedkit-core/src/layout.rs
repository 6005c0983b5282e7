//! Layout geometry: the responsive breakpoint and offset computation over an
//! abstract layout tree.

use serde::Deserialize;

/// How summaries are laid out, derived from the viewport width.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LayoutMode {
    /// Narrow viewport; summaries use large preview thumbnails.
    Compact,
    /// Wide viewport; summaries use small inline thumbnails.
    #[default]
    Wide,
}

impl LayoutMode {
    /// Thumbnail size requested from the summary renderer in this mode.
    pub fn thumb_size(self) -> ThumbSize {
        match self {
            LayoutMode::Compact => ThumbSize::Mobile,
            LayoutMode::Wide => ThumbSize::Desktop,
        }
    }
}

/// Thumbnail sizing passed through to the summary renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ThumbSize {
    Mobile,
    #[default]
    Desktop,
}

/// A `max-width` breakpoint expressed in `em`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Breakpoint {
    /// Widths at or below this many `em` are compact.
    pub max_width_em: f64,
}

impl Breakpoint {
    /// `screen and (max-width: 39.9375em)`.
    pub const SMALL_SCREEN: Breakpoint = Breakpoint {
        max_width_em: 39.9375,
    };

    /// Evaluate the breakpoint against a viewport width in pixels.
    ///
    /// Media queries resolve `em` against the initial font size, not any
    /// element's, hence the explicit `root_font_px`.
    pub fn mode_for(&self, width_px: f64, root_font_px: f64) -> LayoutMode {
        if width_px <= self.max_width_em * root_font_px {
            LayoutMode::Compact
        } else {
            LayoutMode::Wide
        }
    }
}

impl Default for Breakpoint {
    fn default() -> Self {
        Self::SMALL_SCREEN
    }
}

/// Font size media queries resolve `em` against unless told otherwise.
pub const DEFAULT_ROOT_FONT_PX: f64 = 16.0;

/// Upper bound on the ancestor chain walked by [`document_offset_top`].
pub const MAX_ANCESTOR_DEPTH: usize = 1024;

/// A node in a positioned layout tree.
pub trait LayoutNode: Sized {
    /// Distance from the top of the offset parent's padding edge.
    fn offset_top(&self) -> f64;

    /// Rendered height including borders.
    fn offset_height(&self) -> f64;

    /// The nearest positioned ancestor, or `None` at the document root.
    fn offset_parent(&self) -> Option<Self>;
}

/// Cumulative vertical offset of `node` from the document origin.
///
/// Sums `offset_top` up the offset-parent chain until a node has no parent.
/// The walk stops after [`MAX_ANCESTOR_DEPTH`] hops so a cyclic or absurdly
/// deep tree cannot hang the caller.
pub fn document_offset_top<N: LayoutNode>(node: &N) -> f64 {
    let mut total = node.offset_top();
    let mut parent = node.offset_parent();
    let mut depth = 0;
    while let Some(current) = parent {
        depth += 1;
        if depth > MAX_ANCESTOR_DEPTH {
            tracing::warn!(depth, "offset-parent chain exceeds depth bound; truncating");
            break;
        }
        total += current.offset_top();
        parent = current.offset_parent();
    }
    total
}
