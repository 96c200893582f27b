//! Styling helpers for the interactive UI

use super::messages::MessageType;
use ratatui::style::{Color, Style};
use unicode_width::UnicodeWidthChar;

/// Palette cycled across segments in the breakdown chart
const SEGMENT_COLORS: [Color; 6] = [
    Color::Green,
    Color::Cyan,
    Color::Yellow,
    Color::Magenta,
    Color::LightBlue,
    Color::LightRed,
];

/// Stable color for the n-th segment
pub fn segment_color(index: usize) -> Color {
    SEGMENT_COLORS[index % SEGMENT_COLORS.len()]
}

/// Get style for message type
pub fn get_message_style(message_type: MessageType) -> Style {
    match message_type {
        MessageType::Info => Style::default().fg(Color::Cyan),
        MessageType::Success => Style::default().fg(Color::Green),
        MessageType::Warning => Style::default().fg(Color::Yellow),
        MessageType::Error => Style::default().fg(Color::Red),
    }
}

/// Truncate string to fit a display width, counting wide characters twice
pub fn truncate_str(s: &str, max_width: usize) -> String {
    let width: usize = s.chars().map(|c| c.width().unwrap_or(0)).sum();
    if width <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return "...".to_string();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max_width - 3 {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("Service", 10), "Service");
        assert_eq!(truncate_str("Community Service", 10), "Communi...");
        assert_eq!(truncate_str("abcdef", 2), "...");
    }

    #[test]
    fn test_truncate_wide_chars() {
        assert_eq!(truncate_str("日本語テキスト", 7), "日本...");
    }

    #[test]
    fn test_segment_colors_cycle() {
        assert_eq!(segment_color(0), segment_color(SEGMENT_COLORS.len()));
    }
}
