//! Main UI rendering logic

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::app::{App, AppMode};
use super::messages::MessageType;
use super::utils::get_message_style;
use super::{form_ui, log_view, summary_chart};

/// Main draw function
pub fn draw(f: &mut Frame, app: &App) {
    let size = f.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(12),   // Main content
            Constraint::Length(5), // Messages
            Constraint::Length(3), // Footer
        ])
        .split(size);

    render_header(f, app, chunks[0]);

    match app.mode {
        AppMode::Help => render_help(f, chunks[1]),
        _ => render_main_content(f, app, chunks[1]),
    }

    render_messages(f, app, chunks[2]);
    render_footer(f, app, chunks[3]);
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let title = format!(
        " Contest Points Calculator - {} ({} rules) ",
        app.rules_path.display(),
        app.session.table().len()
    );
    let header = Paragraph::new(title)
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );

    f.render_widget(header, area);
}

fn render_main_content(f: &mut Frame, app: &App, area: Rect) {
    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(68), // Calculator and log
            Constraint::Percentage(32), // Options and breakdown
        ])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(12), // Form
            Constraint::Min(5),     // Log
        ])
        .split(main_chunks[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(55), // Options for the focused field
            Constraint::Percentage(45), // Segment breakdown
        ])
        .split(main_chunks[1]);

    form_ui::render_form(f, app, left[0]);
    log_view::render(f, app, left[1]);
    form_ui::render_context_panel(f, app, right[0]);
    summary_chart::render(f, app, right[1]);
}

fn render_help(f: &mut Frame, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };

    let help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .add_modifier(Modifier::BOLD)
                .fg(Color::Cyan),
        )),
        Line::from(""),
        section("Calculator:"),
        Line::from("  ↑/↓           Move between Segment, Code, Activity, Sub-category, Count"),
        Line::from("  ←/→           Change the selected value"),
        Line::from("  0-9, +/-      Edit or step the count (minimum 1)"),
        Line::from("  Enter or a    Add the current selection to the log"),
        Line::from(""),
        section("Activity log:"),
        Line::from("  Tab           Switch focus between calculator and log"),
        Line::from("  ↑/↓, Space    Move and mark rows"),
        Line::from("  d             Delete marked rows (or the highlighted row)"),
        Line::from("  Esc           Clear marks"),
        Line::from(""),
        section("Export:"),
        Line::from("  x             Save the log as a PNG image"),
        Line::from("  j             Save the log as JSON"),
        Line::from("  c             Copy the log table to the clipboard"),
        Line::from(""),
        section("General:"),
        Line::from("  ?             Show this help"),
        Line::from("  q, Ctrl+C     Quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to return...",
            Style::default().fg(Color::Gray),
        )),
    ];

    let paragraph = Paragraph::new(help_text).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Help ")
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(paragraph, area);
}

fn render_messages(f: &mut Frame, app: &App, area: Rect) {
    let mut lines = Vec::new();

    // Show recent messages (last 3)
    let recent_messages: Vec<_> = app.messages.iter().rev().take(3).collect();

    for msg in recent_messages.iter().rev() {
        let mut style = get_message_style(msg.message_type);

        if app.mode == AppMode::DeleteConfirm && msg.message_type == MessageType::Warning {
            style = style.add_modifier(Modifier::SLOW_BLINK);
        }

        lines.push(Line::from(vec![
            Span::styled(format!("{} ", msg.icon()), style),
            Span::styled(msg.text.as_str(), style),
        ]));
    }

    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "Ready",
            Style::default().fg(Color::Gray),
        )));
    }

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Messages ")
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(paragraph, area);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match app.mode {
        AppMode::Normal if app.form.focus_on_log => {
            "[↑↓] Rows  [Space] Mark  [d]elete  [Esc] Clear marks  [Tab] Calculator  [x] PNG  [j] JSON  [c]opy  [?] help  [q]uit"
        }
        AppMode::Normal => {
            "[↑↓] Fields  [←→] Change  [0-9 +/-] Count  [Enter/a] Add  [Tab] Log  [x] PNG  [j] JSON  [c]opy  [?] help  [q]uit"
        }
        AppMode::DeleteConfirm => "[y] Confirm  [n/Esc] Cancel",
        AppMode::Help => "Press any key to return",
    };

    let footer = Paragraph::new(shortcuts)
        .style(Style::default().fg(Color::Gray))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );

    f.render_widget(footer, area);
}
