use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Outcome of a key press in the composer
#[derive(Debug, PartialEq, Eq)]
pub enum ComposerAction {
    /// Enter without modifiers: the caller decides what to do with the buffer
    Submit,
    /// The buffer or cursor changed
    Edited,
    /// Key was not for the composer
    Ignored,
}

/// Input buffer with a cursor, measured in characters
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    content: String,
    cursor: usize,
}

impl TextInput {
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Replace the buffer and move the cursor to the end
    pub fn set_content(&mut self, content: String) {
        self.cursor = content.chars().count();
        self.content = content;
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    pub fn insert_str(&mut self, text: &str) {
        for c in text.chars() {
            self.insert_char(c);
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerAction {
        if key.kind != KeyEventKind::Press {
            return ComposerAction::Ignored;
        }

        match key.code {
            KeyCode::Enter => {
                if key.modifiers.contains(KeyModifiers::SHIFT)
                    || key.modifiers.contains(KeyModifiers::ALT)
                {
                    self.insert_char('\n');
                    ComposerAction::Edited
                } else {
                    ComposerAction::Submit
                }
            }
            KeyCode::Char(c) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    return ComposerAction::Ignored;
                }
                self.insert_char(c);
                ComposerAction::Edited
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_offset(self.cursor);
                    self.content.remove(at);
                }
                ComposerAction::Edited
            }
            KeyCode::Delete => {
                if self.cursor < self.len() {
                    let at = self.byte_offset(self.cursor);
                    self.content.remove(at);
                }
                ComposerAction::Edited
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                ComposerAction::Edited
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(self.len());
                ComposerAction::Edited
            }
            KeyCode::Home => {
                self.cursor = 0;
                ComposerAction::Edited
            }
            KeyCode::End => {
                self.cursor = self.len();
                ComposerAction::Edited
            }
            _ => ComposerAction::Ignored,
        }
    }

    fn insert_char(&mut self, c: char) {
        let at = self.byte_offset(self.cursor);
        self.content.insert(at, c);
        self.cursor += 1;
    }

    fn len(&self) -> usize {
        self.content.chars().count()
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }
}

/// Input box at the bottom of the chat panel
pub struct ComposerView<'a> {
    pub input: &'a TextInput,
    pub placeholder: &'a str,
    pub title: String,
    pub disabled: bool,
}

impl Widget for ComposerView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.disabled {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Cyan)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.title)
            .border_style(border_style);

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.input.content().is_empty() {
            let placeholder_line = Line::from(vec![Span::styled(
                self.placeholder,
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
            return;
        }

        // Render content with cursor indicator
        let mut content: String = self.input.content().to_string();
        let at = self.input.byte_offset(self.input.cursor());
        content.insert(at, '▌');

        let lines: Vec<&str> = content.split('\n').collect();
        let visible = inner_area.height as usize;
        let start = lines.len().saturating_sub(visible);
        for (i, line_text) in lines[start..].iter().enumerate() {
            let line = Line::from(vec![Span::raw(*line_text)]);
            buf.set_line(inner_area.x, inner_area.y + i as u16, &line, inner_area.width);
        }
    }
}
