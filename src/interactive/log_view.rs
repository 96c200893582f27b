//! Activity log table

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::export::{LogTable, HEADERS};

use super::app::App;
use super::utils::truncate_str;

/// Render the activity log, or a placeholder while it is empty
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let table = LogTable::from_log(app.session.log());
    let border_style = if app.form.focus_on_log {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Cyan)
    };

    if table.is_empty() {
        let paragraph = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "No activities yet. Press Enter to add the current selection.",
                Style::default().fg(Color::Gray),
            )),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Activity Log ")
                .border_style(border_style),
        );
        f.render_widget(paragraph, area);
        return;
    }

    let mut header_cells = vec![Cell::from("")];
    header_cells.extend(HEADERS.iter().map(|h| Cell::from(*h)));
    let header = Row::new(header_cells)
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .height(1);

    let mut rows = Vec::with_capacity(table.rows.len() + 1);
    for (i, row) in table.rows.iter().enumerate() {
        let is_marked = app.marked.contains(&i);
        let is_cursor = app.form.focus_on_log && app.log_cursor == i;

        let mut style = Style::default();
        if is_marked {
            style = style.fg(Color::Red);
        }
        if is_cursor {
            style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
        }

        let mark = if is_marked { "[x]" } else { "[ ]" };
        let mut cells = vec![Cell::from(mark)];
        cells.extend(row.iter().enumerate().map(|(col, value)| {
            let text = if col < 3 {
                truncate_str(value, 24)
            } else {
                value.clone()
            };
            Cell::from(text)
        }));
        rows.push(Row::new(cells).style(style));
    }

    rows.push(
        Row::new(vec![
            Cell::from(""),
            Cell::from("Total"),
            Cell::from(""),
            Cell::from(""),
            Cell::from(""),
            Cell::from(""),
            Cell::from(table.total.to_string()),
        ])
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
    );

    let widths = vec![
        Constraint::Length(3),      // Mark
        Constraint::Percentage(18), // Segment
        Constraint::Percentage(14), // Code
        Constraint::Percentage(24), // Activity
        Constraint::Length(15),     // Points per unit
        Constraint::Length(6),      // Count
        Constraint::Length(12),     // Total
    ];

    let title = format!(
        " Activity Log - {} entries, {} points ",
        table.rows.len(),
        table.total
    );

    let widget = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(border_style),
        )
        .column_spacing(1);

    f.render_widget(widget, area);
}
