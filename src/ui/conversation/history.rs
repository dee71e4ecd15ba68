//! Conversation history display component

use crate::conversation::{ChatMessage, Role};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

/// Scrollable list of turns, anchored to the newest message
pub struct HistoryView<'a> {
    pub messages: &'a [ChatMessage],
    pub loading: bool,
    /// Lines scrolled up from the bottom
    pub scroll_offset: u16,
    /// Animation tick for the typing indicator
    pub tick: u64,
}

impl Widget for HistoryView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        if self.messages.is_empty() {
            let welcome_lines = [
                Line::from(Span::styled(
                    "Hi! Ask me anything.",
                    Style::default().fg(Color::Cyan),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Enter to send, Shift+Enter for a new line, /help for commands.",
                    Style::default().fg(Color::DarkGray),
                )),
            ];
            for (i, line) in welcome_lines.iter().enumerate().take(area.height as usize) {
                buf.set_line(area.x, area.y + i as u16, line, area.width);
            }
            return;
        }

        let width = area.width as usize;
        let mut all_lines: Vec<Line> = Vec::new();
        for message in self.messages {
            all_lines.extend(render_message(message, width));
            all_lines.push(Line::from(""));
        }
        if self.loading {
            all_lines.push(typing_indicator(self.tick));
        }

        // Show the window ending `scroll_offset` lines above the bottom
        let height = area.height as usize;
        let total = all_lines.len();
        let max_offset = total.saturating_sub(height);
        let offset = (self.scroll_offset as usize).min(max_offset);
        let end = total - offset;
        let start = end.saturating_sub(height);

        for (i, line) in all_lines[start..end].iter().enumerate() {
            buf.set_line(area.x, area.y + i as u16, line, area.width);
        }
    }
}

/// Render a single message into lines
fn render_message(message: &ChatMessage, width: usize) -> Vec<Line<'static>> {
    let (label, label_style, content_style) = match message.role {
        Role::User => (
            "you",
            Style::default().fg(Color::LightBlue).add_modifier(Modifier::BOLD),
            Style::default().fg(Color::White),
        ),
        Role::Model => (
            "assistant",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            Style::default().fg(Color::Gray),
        ),
    };

    let timestamp = message.timestamp.format("%H:%M").to_string();
    let mut lines = vec![Line::from(vec![
        Span::styled(label, label_style),
        Span::styled(format!(" {}", timestamp), Style::default().fg(Color::DarkGray)),
    ])];

    for content_line in wrap_text(&message.content, width.saturating_sub(2)) {
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(content_line, content_style),
        ]));
    }

    lines
}

fn typing_indicator(tick: u64) -> Line<'static> {
    let dots = match (tick / 6) % 4 {
        0 => "●",
        1 => "● ●",
        2 => "● ● ●",
        _ => "",
    };
    Line::from(vec![
        Span::raw("  "),
        Span::styled(dots, Style::default().fg(Color::Cyan)),
    ])
}

/// Wrap text to fit within the given width, keeping explicit line breaks
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current_line = String::new();
        let mut current_len = 0;

        // Indentation and runs of spaces are kept; only the break points drop them
        for token in paragraph.split_inclusive(' ') {
            let word = token.trim_end_matches(' ');
            let spaces = &token[word.len()..];
            let word_len = word.chars().count();

            if current_len > 0 && current_len + word_len > width {
                lines.push(current_line.trim_end().to_string());
                current_line.clear();
                current_len = 0;
                if word.is_empty() {
                    continue;
                }
            }

            // Hard-split words longer than the line
            let mut rest: Vec<char> = word.chars().collect();
            while rest.len() > width {
                lines.push(rest.drain(..width).collect());
            }

            current_line.extend(rest.iter());
            current_line.push_str(spaces);
            current_len += rest.len() + spaces.len();
        }

        lines.push(current_line.trim_end().to_string());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_on_word_boundaries() {
        assert_eq!(wrap_text("the quick brown fox", 9), vec!["the quick", "brown fox"]);
    }

    #[test]
    fn keeps_explicit_newlines_and_blank_lines() {
        assert_eq!(wrap_text("a\n\nb", 10), vec!["a", "", "b"]);
    }

    #[test]
    fn keeps_indentation_and_inner_spacing() {
        let code = "fn main() {\n    println!(\"x\");\n}\na  b";
        assert_eq!(
            wrap_text(code, 40),
            vec!["fn main() {", "    println!(\"x\");", "}", "a  b"]
        );
        assert_eq!(wrap_text("    let value = 1;", 12), vec!["    let", "value = 1;"]);
    }

    #[test]
    fn splits_overlong_words() {
        assert_eq!(wrap_text("abcdefgh", 3), vec!["abc", "def", "gh"]);
    }

    #[test]
    fn empty_placeholder_renders_one_blank_line() {
        assert_eq!(wrap_text("", 10), vec![""]);
    }

    #[test]
    fn renders_newest_lines_at_the_bottom() {
        let mut reply = ChatMessage::placeholder();
        reply.content = "latest".to_string();
        let messages = vec![ChatMessage::user("first"), reply];

        let area = Rect::new(0, 0, 20, 2);
        let mut buf = Buffer::empty(area);
        HistoryView {
            messages: &messages,
            loading: false,
            scroll_offset: 0,
            tick: 0,
        }
        .render(area, &mut buf);

        // Last two lines are the reply body and the trailing spacer
        let row: String = (0..20).map(|x| buf.get(x, 0).symbol().to_string()).collect();
        assert!(row.contains("latest"));
    }
}
