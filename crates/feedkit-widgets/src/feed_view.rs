//! The scrollable feed.
//!
//! Rendering happens in two steps. [`FeedLines::build`] lays the composed
//! entries out as rows for a given width and remembers which rows belong to
//! which entry key. [`FeedView`] then draws a window of those rows at a
//! scroll offset, with a scrollbar when the content overflows.

use crate::ad::ad_lines;
use crate::loading::LoadingIndicator;
use crate::summary::{card_lines, Summary};
use feedkit_core::{Entry, EntryKey};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::text::{Line, Text};
use ratatui::widgets::{
    Block, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget, Widget,
};
use std::ops::Range;

/// Rows of a laid-out feed.
#[derive(Debug, Clone, Default)]
pub struct FeedLines {
    lines: Vec<Line<'static>>,
    rows: Vec<(EntryKey, Range<usize>)>,
    header_rows: usize,
}

impl FeedLines {
    /// Lay `entries` out for `width` columns.
    pub fn build<R: Summary>(
        entries: &[Entry<'_, R>],
        width: u16,
        loading: &LoadingIndicator,
    ) -> Self {
        let mut lines = Vec::new();
        let mut rows = Vec::with_capacity(entries.len());
        for entry in entries {
            let start = lines.len();
            match entry {
                Entry::Summary(summary) => lines.extend(card_lines(summary, width)),
                Entry::Ad(ad) => lines.extend(ad_lines(ad, width)),
                Entry::Loading => lines.push(loading.line(width)),
            }
            rows.push((entry.key(), start..lines.len()));
        }
        Self {
            lines,
            rows,
            header_rows: 0,
        }
    }

    /// Put `header` above the list. It scrolls with the list but belongs to
    /// no entry.
    pub fn with_header(mut self, header: Vec<Line<'static>>) -> Self {
        let shift = header.len();
        for (_, range) in &mut self.rows {
            *range = range.start + shift..range.end + shift;
        }
        self.lines.splice(0..0, header);
        self.header_rows += shift;
        self
    }

    /// Total height in rows.
    pub fn height(&self) -> usize {
        self.lines.len()
    }

    pub fn header_rows(&self) -> usize {
        self.header_rows
    }

    /// Height of the list below the header.
    pub fn list_rows(&self) -> usize {
        self.lines.len() - self.header_rows
    }

    pub fn lines(&self) -> &[Line<'static>] {
        &self.lines
    }

    /// Entry keys in display order.
    pub fn keys(&self) -> impl Iterator<Item = EntryKey> + '_ {
        self.rows.iter().map(|(key, _)| *key)
    }

    /// Rows occupied by the entry with `key`.
    pub fn rows_of(&self, key: EntryKey) -> Option<Range<usize>> {
        self.rows
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, range)| range.clone())
    }

    /// Rows `offset..offset + height`, clipped to the content.
    pub fn window(&self, offset: usize, height: usize) -> &[Line<'static>] {
        let start = offset.min(self.lines.len());
        let end = offset.saturating_add(height).min(self.lines.len());
        &self.lines[start..end]
    }
}

/// Vertical scroll position of a feed, in rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedScroll {
    offset: usize,
}

impl FeedScroll {
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Largest offset that still fills the view.
    pub fn max_offset(content: usize, visible: usize) -> usize {
        content.saturating_sub(visible)
    }

    /// Move by `delta` rows, staying within the content.
    ///
    /// Returns whether the offset changed.
    pub fn scroll_by(&mut self, delta: isize, content: usize, visible: usize) -> bool {
        let max = Self::max_offset(content, visible);
        let target = self.offset.saturating_add_signed(delta).min(max);
        let changed = target != self.offset;
        self.offset = target;
        changed
    }

    pub fn to_top(&mut self) -> bool {
        let changed = self.offset != 0;
        self.offset = 0;
        changed
    }

    pub fn to_bottom(&mut self, content: usize, visible: usize) -> bool {
        let max = Self::max_offset(content, visible);
        let changed = self.offset != max;
        self.offset = max;
        changed
    }

    /// Re-apply the bounds after the content or view size changed.
    pub fn clamp(&mut self, content: usize, visible: usize) {
        self.offset = self.offset.min(Self::max_offset(content, visible));
    }
}

/// Draws a window of [`FeedLines`].
pub struct FeedView<'a> {
    lines: &'a FeedLines,
    offset: usize,
    block: Option<Block<'a>>,
}

impl<'a> FeedView<'a> {
    pub fn new(lines: &'a FeedLines, scroll: FeedScroll) -> Self {
        Self {
            lines,
            offset: scroll.offset(),
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for FeedView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = match &self.block {
            Some(block) => block.inner(area),
            None => area,
        };
        if let Some(block) = self.block {
            block.render(area, buf);
        }
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let visible = usize::from(inner.height);
        let offset = self
            .offset
            .min(FeedScroll::max_offset(self.lines.height(), visible));
        let window = self.lines.window(offset, visible);
        Paragraph::new(Text::from(window.to_vec())).render(inner, buf);

        if self.lines.height() > visible {
            let max = FeedScroll::max_offset(self.lines.height(), visible);
            let mut state = ScrollbarState::new(max).position(offset);
            Scrollbar::new(ScrollbarOrientation::VerticalRight).render(inner, buf, &mut state);
        }
    }
}
