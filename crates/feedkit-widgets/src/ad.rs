//! Ad placeholder rows.

use crate::text;
use feedkit_core::{AdEntry, AdKind};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;

fn kind_label(kind: AdKind) -> &'static str {
    match kind {
        AdKind::Freestar => "freestar",
    }
}

/// Render an ad placeholder: a ruled heading naming the targeting tag, the
/// zone it would be served into, and a blank separator.
pub fn ad_lines(ad: &AdEntry<'_>, width: u16) -> Vec<Line<'static>> {
    let width = usize::from(width);
    let heading = match ad.category {
        Some(category) => format!(" sponsored · #{category} "),
        None => " sponsored ".to_string(),
    };
    let heading = text::truncate(&heading, width);
    let rule = width.saturating_sub(text::display_width(&heading));
    let left = rule.min(2);

    vec![
        Line::styled(
            format!("{}{}{}", "─".repeat(left), heading, "─".repeat(rule - left)),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::DIM),
        ),
        Line::styled(
            text::truncate(&format!("  {} · {}", kind_label(ad.kind), ad.zone_id), width),
            Style::default().fg(Color::DarkGray),
        ),
        Line::default(),
    ]
}
