//! Per-segment breakdown of the logged points

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::activity_log::ActivityLog;

use super::app::App;
use super::utils::{segment_color, truncate_str};

/// Points per segment in first-logged order
pub fn segment_totals(log: &ActivityLog) -> Vec<(String, u64)> {
    let mut totals: Vec<(String, u64)> = Vec::new();
    for entry in log.entries() {
        match totals.iter_mut().find(|(s, _)| *s == entry.segment) {
            Some((_, points)) => *points = points.saturating_add(entry.total_points),
            None => totals.push((entry.segment.clone(), entry.total_points)),
        }
    }
    totals
}

/// Render the summary chart
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let log = app.session.log();
    let total = log.total();

    let mut lines = Vec::new();

    if total > 0 {
        // Order of segments in the rule table keeps colors stable as rows come and go
        let order = app.session.segments();
        for (segment, points) in segment_totals(log) {
            let percentage = points as f64 / total as f64 * 100.0;
            let bar_width = (percentage / 100.0 * 20.0) as usize; // Max 20 chars for bar
            let color_index = order.iter().position(|s| *s == segment).unwrap_or(0);
            let color = segment_color(color_index);

            lines.push(Line::from(vec![
                Span::styled(
                    format!("{:14} ", truncate_str(&segment, 14)),
                    Style::default().fg(Color::White),
                ),
                Span::styled("█".repeat(bar_width), Style::default().fg(color)),
                Span::styled(
                    format!(" {} ({:.0}%)", points, percentage),
                    Style::default().fg(color),
                ),
            ]));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Total: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(
                total.to_string(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
        ]));
    } else {
        lines.push(Line::from(Span::styled(
            "No points logged yet",
            Style::default().fg(Color::Gray),
        )));
    }

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" By Segment ")
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(paragraph, area);
}
