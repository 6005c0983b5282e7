//! Content summary cards.
//!
//! A card is a handful of [`Line`]s. Its shape depends on the thumbnail size
//! the list picked for the current layout: wide layouts put a small
//! thumbnail next to the title, compact layouts stack a banner above it.

use crate::text;
use feedkit_core::{NsfwPref, SummaryEntry, ThumbSize};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

/// What a record has to expose to be rendered as a card.
pub trait Summary {
    fn title(&self) -> &str;

    fn author(&self) -> &str;

    fn category(&self) -> Option<&str> {
        None
    }

    fn excerpt(&self) -> &str {
        ""
    }

    fn net_votes(&self) -> i64 {
        0
    }

    fn is_nsfw(&self) -> bool {
        false
    }

    /// Low-rated content is collapsed unless the list shows negative
    /// comments.
    fn is_low_rated(&self) -> bool {
        self.net_votes() < 0
    }
}

const THUMB_SMALL: &str = "▣ ";
const BANNER_WIDTH: usize = 12;

/// Render one summary as card lines of exactly `width` columns or less.
///
/// Every card ends with one blank separator line.
pub fn card_lines<R: Summary>(entry: &SummaryEntry<'_, R>, width: u16) -> Vec<Line<'static>> {
    let width = usize::from(width);
    let record = entry.record;
    let options = &entry.options;

    if record.is_nsfw() && options.nsfw_pref == NsfwPref::Hide {
        return vec![
            Line::styled(
                text::truncate("  nsfw content hidden", width),
                Style::default().fg(Color::DarkGray),
            ),
            Line::default(),
        ];
    }

    let collapsed = record.is_low_rated() && !options.show_negative_comments;
    let title_style = if collapsed {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    let excerpt = if collapsed {
        "low-rated content collapsed".to_string()
    } else if record.is_nsfw() && options.nsfw_pref == NsfwPref::Warn {
        "⚠ nsfw: open to view".to_string()
    } else {
        text::sanitize(record.excerpt())
    };

    let mut meta = format!("by {}", record.author());
    if let Some(category) = record.category().filter(|_| !options.hide_category) {
        meta.push_str(&format!(" in #{category}"));
    }
    meta.push_str(&format!(" · {} votes", record.net_votes()));

    let mut lines = Vec::with_capacity(5);
    let indent = match options.thumb_size {
        ThumbSize::Desktop => {
            let title_width = width.saturating_sub(text::display_width(THUMB_SMALL));
            lines.push(Line::from(vec![
                Span::styled(THUMB_SMALL, Style::default().fg(Color::Blue)),
                Span::styled(text::truncate(&text::sanitize(record.title()), title_width), title_style),
            ]));
            "  "
        }
        ThumbSize::Mobile => {
            lines.push(Line::styled(
                "▀".repeat(BANNER_WIDTH.min(width)),
                Style::default().fg(Color::Blue),
            ));
            lines.push(Line::styled(
                text::truncate(&text::sanitize(record.title()), width),
                title_style,
            ));
            ""
        }
    };
    let body_width = width.saturating_sub(indent.len());
    lines.push(Line::styled(
        format!("{indent}{}", text::truncate(&meta, body_width)),
        Style::default().fg(Color::Gray),
    ));
    lines.push(Line::raw(format!("{indent}{}", text::truncate(&excerpt, body_width))));
    lines.push(Line::default());
    lines
}
