//! Form UI rendering with context-aware right panel

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::cascade::Resolution;
use crate::rules::Refinement;

use super::app::App;
use super::form::FormField;

/// Display value of a field, plus whether it still needs the user's attention
fn field_value(app: &App, field: FormField) -> (String, bool) {
    let selection = app.session.selection();
    match field {
        FormField::Segment => (selection.segment().unwrap_or("<none>").to_string(), false),
        FormField::Code => (selection.code().unwrap_or("<none>").to_string(), false),
        FormField::Activity => match (app.session.activities(), selection.activity()) {
            (None, _) => ("(single activity)".to_string(), false),
            (Some(_), Some(choice)) => (choice.to_string(), false),
            (Some(options), None) => (format!("<choose 1 of {}>", options.len()), true),
        },
        FormField::Refinement => match (app.session.refinements(), selection.refinement()) {
            (None, _) => ("(not needed)".to_string(), false),
            (Some(_), Some(choice)) => (choice.to_string(), false),
            (Some(options), None) => (format!("<choose 1 of {}>", options.len()), true),
        },
        FormField::Count => (app.form.count_input.value().to_string(), false),
    }
}

/// Field name; the last cascade level is named after the column it uses
fn field_label(app: &App, field: FormField) -> &'static str {
    match (field, app.session.table().refinement()) {
        (FormField::Refinement, Refinement::Activity) => "Activity",
        _ => field.label(),
    }
}

/// Render the calculator form
pub fn render_form(f: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled(
            "↑↓: Field | ←→: Change | 0-9 +/-: Count | Enter: Add | Tab: Log",
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
    ];

    let fields = FormField::visible(app.session.table().has_activity_level());
    for (index, field) in fields.into_iter().enumerate() {
        let is_current = app.form.current_field == field && !app.form.focus_on_log;
        let (value, needs_input) = field_value(app, field);

        let label_style = if is_current {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };

        let value_style = if needs_input {
            Style::default().fg(Color::Red)
        } else if is_current {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };

        let display_value = if is_current && field == FormField::Count {
            let mut display = value;
            let cursor = app.form.count_input.cursor().min(display.len());
            display.insert(cursor, '█');
            display
        } else if is_current && field != FormField::Count {
            format!("◀ {} ▶", value)
        } else {
            value
        };

        lines.push(Line::from(vec![
            Span::styled(
                format!("{:17}", format!("{}. {}", index + 1, field_label(app, field))),
                label_style,
            ),
            Span::raw(": "),
            Span::styled(display_value, value_style),
        ]));
    }

    lines.push(Line::from(""));

    match app.session.current() {
        Resolution::Resolved(quote) => {
            lines.push(Line::from(vec![
                Span::styled("Points: ", Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(
                    format!(
                        "{} × {} = {}",
                        quote.points_per_unit,
                        quote.count,
                        quote.total_points()
                    ),
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
            ]));
            if let Some(raw) = quote.points_raw.as_deref() {
                if raw != quote.points_per_unit.to_string() {
                    lines.push(Line::from(Span::styled(
                        format!("Rule text: {}", raw),
                        Style::default().fg(Color::Blue),
                    )));
                }
            }
        }
        Resolution::NeedsActivity(_) => {
            lines.push(Line::from(Span::styled(
                "Choose an activity to resolve the points",
                Style::default().fg(Color::Yellow),
            )));
        }
        Resolution::NeedsRefinement(_) => {
            lines.push(Line::from(Span::styled(
                "Choose a sub-category to resolve the points",
                Style::default().fg(Color::Yellow),
            )));
        }
        Resolution::Unselected => {
            lines.push(Line::from(Span::styled(
                "Select a segment and code",
                Style::default().fg(Color::Yellow),
            )));
        }
    }

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Calculator ")
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(paragraph, area);
}

/// Render the option list for whichever dropdown has focus
pub fn render_context_panel(f: &mut Frame, app: &App, area: Rect) {
    let selection = app.session.selection();
    let (title, options, current) = match app.form.current_field {
        FormField::Segment => (" Segments ", app.session.segments(), selection.segment()),
        FormField::Code => (" Codes ", app.session.codes(), selection.code()),
        FormField::Activity => (
            " Activities ",
            app.session.activities().unwrap_or_default(),
            selection.activity(),
        ),
        FormField::Refinement => (
            match app.session.table().refinement() {
                Refinement::Activity => " Activities ",
                _ => " Sub-categories ",
            },
            app.session.refinements().unwrap_or_default(),
            selection.refinement(),
        ),
        FormField::Count => {
            render_count_hint(f, area);
            return;
        }
    };

    let items: Vec<ListItem> = if options.is_empty() {
        vec![ListItem::new("  (none for this selection)").style(Style::default().fg(Color::Gray))]
    } else {
        options
            .iter()
            .map(|option| {
                let is_selected = Some(option.as_str()) == current;
                let style = if is_selected {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };
                let prefix = if is_selected { "▶ " } else { "  " };
                ListItem::new(format!("{}{}", prefix, option)).style(style)
            })
            .collect()
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(list, area);
}

fn render_count_hint(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from("Type how many times the activity was done."),
        Line::from(""),
        Line::from("  0-9        Edit the count"),
        Line::from("  ←/→ or +/- Step by one"),
        Line::from(""),
        Line::from(Span::styled(
            "The count is never below 1.",
            Style::default().fg(Color::Gray),
        )),
    ];
    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Count ")
            .style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(paragraph, area);
}
