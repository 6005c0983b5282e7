//! Viewport geometry of a feed drawn in a terminal.
//!
//! The monitor thinks in pixels, a terminal in cells. [`CellMetrics`]
//! converts between the two so thresholds and the `em` breakpoint keep
//! their meaning: with the default 8×16 cell an 80 column terminal is
//! 640px wide, just above the compact breakpoint.

use feedkit_core::{LayoutNode, Viewport, DEFAULT_ROOT_ID};

/// Pixel size of one terminal cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    pub px_per_col: f64,
    pub px_per_row: f64,
}

impl Default for CellMetrics {
    fn default() -> Self {
        Self {
            px_per_col: 8.0,
            px_per_row: 16.0,
        }
    }
}

/// A positioned block of rows in the scrolled document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerminalNode {
    offset_top: f64,
    height: f64,
    /// Top and height of the enclosing document, if any.
    parent: Option<(f64, f64)>,
}

impl LayoutNode for TerminalNode {
    fn offset_top(&self) -> f64 {
        self.offset_top
    }

    fn offset_height(&self) -> f64 {
        self.height
    }

    fn offset_parent(&self) -> Option<Self> {
        self.parent.map(|(offset_top, height)| TerminalNode {
            offset_top,
            height,
            parent: None,
        })
    }
}

/// Snapshot of a rendered feed: where the list sits in the scrolled
/// document and how much of it the terminal shows.
///
/// The document is `header_rows` of chrome followed by the list; it scrolls
/// as a whole inside a body area of `body_rows` × `cols` cells.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalViewport {
    pub metrics: CellMetrics,
    pub root_id: String,
    pub header_rows: usize,
    pub list_rows: usize,
    pub scroll_rows: usize,
    pub body_rows: u16,
    pub cols: u16,
}

impl TerminalViewport {
    pub fn new(cols: u16, body_rows: u16) -> Self {
        Self {
            metrics: CellMetrics::default(),
            root_id: DEFAULT_ROOT_ID.to_string(),
            header_rows: 0,
            list_rows: 0,
            scroll_rows: 0,
            body_rows,
            cols,
        }
    }

    pub fn with_metrics(mut self, metrics: CellMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_root_id(mut self, root_id: impl Into<String>) -> Self {
        self.root_id = root_id.into();
        self
    }

    /// Rows of the whole scrolled document.
    pub fn document_rows(&self) -> usize {
        self.header_rows + self.list_rows
    }

    fn rows_px(&self, rows: usize) -> f64 {
        rows as f64 * self.metrics.px_per_row
    }
}

impl Viewport for TerminalViewport {
    type Node<'a> = TerminalNode;

    fn element_by_id(&self, id: &str) -> Option<TerminalNode> {
        if id != self.root_id {
            return None;
        }
        Some(TerminalNode {
            offset_top: self.rows_px(self.header_rows),
            height: self.rows_px(self.list_rows),
            parent: Some((0.0, self.rows_px(self.document_rows()))),
        })
    }

    fn scroll_top(&self) -> f64 {
        self.rows_px(self.scroll_rows)
    }

    fn inner_height(&self) -> f64 {
        f64::from(self.body_rows) * self.metrics.px_per_row
    }

    fn inner_width(&self) -> f64 {
        f64::from(self.cols) * self.metrics.px_per_col
    }
}
