use crate::events::GenerationMode;
use crate::ui::conversation::composer::ComposerView;
use crate::ui::conversation::history::HistoryView;
use crate::ui::conversation::widget::ChatWidget;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Widget},
};

/// Floating chat panel, or the launcher bubble when closed
pub struct ChatPanel<'a> {
    pub widget: &'a ChatWidget,
    pub tick: u64,
    pub status: Option<&'a str>,
}

impl ChatPanel<'_> {
    /// Bottom-right placement: the open panel or the closed launcher
    pub fn area_for(widget: &ChatWidget, screen: Rect) -> Rect {
        if widget.is_open() {
            let width = screen.width.saturating_sub(4).min(64);
            let height = (screen.height as u32 * 7 / 10).max(12).min(screen.height as u32) as u16;
            Rect {
                x: screen.x + screen.width.saturating_sub(width + 2),
                y: screen.y + screen.height.saturating_sub(height + 1),
                width,
                height,
            }
        } else {
            let width = 24.min(screen.width);
            let height = 3.min(screen.height);
            Rect {
                x: screen.x + screen.width.saturating_sub(width + 2),
                y: screen.y + screen.height.saturating_sub(height + 1),
                width,
                height,
            }
        }
    }

    fn render_launcher(area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(area);
        block.render(area, buf);

        let line = Line::from(vec![
            Span::styled("💬 Enter", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::styled(" chat · q quit", Style::default().fg(Color::Gray)),
        ]);
        buf.set_line(inner.x + 1, inner.y, &line, inner.width.saturating_sub(1));
    }

    fn composer_title(widget: &ChatWidget) -> &'static str {
        if widget.is_loading() {
            " waiting for reply… "
        } else if widget.can_send() {
            " Enter to send "
        } else {
            " type a message "
        }
    }

    fn mode_line(widget: &ChatWidget) -> Line<'static> {
        let mode = GenerationMode::from_thinking_flag(widget.is_thinking_mode());
        let (marker, style) = if widget.is_thinking_mode() {
            ("✦ ", Style::default().fg(Color::Cyan))
        } else {
            ("✧ ", Style::default().fg(Color::DarkGray))
        };
        Line::from(vec![
            Span::styled(marker, style),
            Span::styled(
                format!("{} mode", mode.display_name()),
                Style::default().fg(Color::Gray),
            ),
            Span::styled(
                format!(" · {}", mode.description()),
                Style::default().fg(Color::DarkGray),
            ),
        ])
    }
}

impl Widget for ChatPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        if !self.widget.is_open() {
            Self::render_launcher(area, buf);
            return;
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan))
            .title(Span::styled(
                " Cosmic Assistant ",
                Style::default().fg(Color::LightCyan).add_modifier(Modifier::BOLD),
            ));
        let inner = block.inner(area);
        block.render(area, buf);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // History
                Constraint::Length(1), // Mode toggle
                Constraint::Length(4), // Composer
                Constraint::Length(1), // Status
            ])
            .split(inner);

        HistoryView {
            messages: self.widget.messages(),
            loading: self.widget.is_loading(),
            scroll_offset: self.widget.scroll_offset(),
            tick: self.tick,
        }
        .render(chunks[0], buf);

        buf.set_line(chunks[1].x, chunks[1].y, &Self::mode_line(self.widget), chunks[1].width);

        ComposerView {
            input: self.widget.input_state(),
            placeholder: "Ask a question...",
            title: Self::composer_title(self.widget).to_string(),
            disabled: self.widget.is_loading(),
        }
        .render(chunks[2], buf);

        if let Some(status) = self.status {
            let line = Line::from(Span::styled(
                status.to_string(),
                Style::default().fg(Color::DarkGray),
            ));
            buf.set_line(chunks[3].x, chunks[3].y, &line, chunks[3].width);
        }
    }
}
