//! Animated indicator shown below the list while a page is loading.

use crate::text;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::Widget;
use std::time::Duration;

/// Built-in frame sets.
pub mod frames {
    /// Quarter-filled circle turning clockwise.
    pub const CIRCLE: &[&str] = &["◐", "◓", "◑", "◒"];
    /// Braille dot spinner cycling through ten positions.
    pub const DOTS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    /// Classic ASCII line spinner.
    pub const LINE: &[&str] = &["|", "/", "-", "\\"];
}

/// Time between frames.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(120);

/// Spinner state. Advance it with [`tick`](LoadingIndicator::tick) on a
/// timer; render it with [`line`](LoadingIndicator::line) or as a widget.
#[derive(Debug, Clone)]
pub struct LoadingIndicator {
    frames: &'static [&'static str],
    frame_index: usize,
    label: String,
    style: Style,
    interval: Duration,
}

impl LoadingIndicator {
    pub fn new() -> Self {
        Self {
            frames: frames::CIRCLE,
            frame_index: 0,
            label: "loading more…".to_string(),
            style: Style::default().fg(Color::Cyan),
            interval: DEFAULT_INTERVAL,
        }
    }

    pub fn with_frames(mut self, frames: &'static [&'static str]) -> Self {
        self.frames = frames;
        self.frame_index = 0;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Advance to the next frame.
    pub fn tick(&mut self) {
        if !self.frames.is_empty() {
            self.frame_index = (self.frame_index + 1) % self.frames.len();
        }
    }

    /// The current frame glyph.
    pub fn frame(&self) -> &'static str {
        self.frames.get(self.frame_index).copied().unwrap_or("")
    }

    /// The indicator as one centred line `width` columns wide.
    pub fn line(&self, width: u16) -> Line<'static> {
        let content = if self.label.is_empty() {
            self.frame().to_string()
        } else {
            format!("{} {}", self.frame(), self.label)
        };
        Line::styled(text::center(&content, usize::from(width)), self.style)
    }
}

impl Default for LoadingIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for &LoadingIndicator {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let row = Rect {
            y: area.y + area.height / 2,
            height: 1,
            ..area
        };
        self.line(area.width).render(row, buf);
    }
}
