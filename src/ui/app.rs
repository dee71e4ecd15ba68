use crate::config::Config;
use crate::events::{GenerationMode, TuiEvent};
use crate::llm::Gateway;
use crate::ui::conversation::{
    ChatPanel, ChatWidget, ComposerAction, SlashCommand, get_help_text, parse_slash_command,
};
use crate::ui::landing::Landing;
use anyhow::{Context, Result};
use crossterm::event::{EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use futures::StreamExt;
use ratatui::{Frame, Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

const SCROLL_STEP: u16 = 5;

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Landing page with the chat panel on top
pub struct App {
    widget: ChatWidget,
    gateway: Arc<dyn Gateway>,
    title: String,
    tick_rate: Duration,
    status: Option<String>,
    tick: u64,
    running: bool,
}

impl App {
    pub fn new(config: &Config, gateway: Arc<dyn Gateway>) -> Self {
        let mut widget = ChatWidget::new();
        if config.ui.start_open {
            widget.toggle_open();
        }

        Self {
            widget,
            gateway,
            title: config.ui.title.clone(),
            tick_rate: Duration::from_millis(config.ui.tick_rate_ms.max(10)),
            status: None,
            tick: 0,
            running: true,
        }
    }

    /// Take over the terminal until the user quits
    pub async fn run(mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal).await;
        restore_terminal(&mut terminal)?;
        result
    }

    async fn event_loop(&mut self, terminal: &mut Tui) -> Result<()> {
        let mut events = EventStream::new();
        let mut ticker = tokio::time::interval(self.tick_rate);

        while self.running {
            self.widget.poll_stream();
            terminal
                .draw(|frame| self.draw(frame))
                .context("Failed to draw frame")?;

            tokio::select! {
                _ = ticker.tick() => self.handle_event(TuiEvent::Tick),
                maybe_event = events.next() => match maybe_event {
                    Some(Ok(event)) => {
                        if let Some(event) = TuiEvent::from_crossterm(event) {
                            self.handle_event(event);
                        }
                    }
                    Some(Err(error)) => {
                        return Err(anyhow::Error::new(error).context("Failed to read terminal event"));
                    }
                    None => break,
                },
            }
        }

        tracing::info!("leaving landing page");
        Ok(())
    }

    fn draw(&self, frame: &mut Frame) {
        let screen = frame.size();
        frame.render_widget(
            Landing {
                title: &self.title,
                tick: self.tick,
            },
            screen,
        );
        frame.render_widget(
            ChatPanel {
                widget: &self.widget,
                tick: self.tick,
                status: self.status.as_deref(),
            },
            ChatPanel::area_for(&self.widget, screen),
        );
    }

    pub fn handle_event(&mut self, event: TuiEvent) {
        match event {
            TuiEvent::Tick => self.tick = self.tick.wrapping_add(1),
            TuiEvent::Key(key) => self.handle_key(key),
            TuiEvent::Paste(text) => {
                if self.widget.is_open() {
                    self.widget.input_mut().insert_str(&text);
                }
            }
            // Next draw picks up the new size
            TuiEvent::Resize(width, height) => tracing::trace!(width, height, "terminal resized"),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => self.running = false,
                KeyCode::Char('t') if self.widget.is_open() => self.toggle_thinking_mode(),
                _ => {}
            }
            return;
        }

        if !self.widget.is_open() {
            match key.code {
                KeyCode::Enter | KeyCode::Char('c') => self.widget.toggle_open(),
                KeyCode::Esc | KeyCode::Char('q') => self.running = false,
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Esc => self.widget.toggle_open(),
            KeyCode::PageUp => self.widget.scroll_up(SCROLL_STEP),
            KeyCode::PageDown => self.widget.scroll_down(SCROLL_STEP),
            _ => match self.widget.input_mut().handle_key(key) {
                ComposerAction::Submit => self.submit(),
                ComposerAction::Edited => self.status = None,
                ComposerAction::Ignored => {}
            },
        }
    }

    fn submit(&mut self) {
        if let Some(command) = parse_slash_command(self.widget.input()) {
            self.widget.set_input("");
            self.run_command(command);
            return;
        }

        if self.widget.is_loading() {
            self.status = Some("Still answering, hold on…".to_string());
            return;
        }

        if self.widget.start_send(Arc::clone(&self.gateway)) {
            self.status = None;
        }
    }

    fn run_command(&mut self, command: SlashCommand) {
        match command {
            SlashCommand::Think => self.toggle_thinking_mode(),
            SlashCommand::Close => self.widget.toggle_open(),
            SlashCommand::Help => self.status = Some(get_help_text()),
            SlashCommand::Quit => self.running = false,
        }
    }

    fn toggle_thinking_mode(&mut self) {
        self.widget.toggle_thinking_mode();
        let mode = GenerationMode::from_thinking_flag(self.widget.is_thinking_mode());
        tracing::debug!(mode = mode.display_name(), "generation mode toggled");
        self.status = Some(format!("{} mode on for the next message", mode.display_name()));
    }
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        crossterm::event::EnableBracketedPaste
    )
    .context("Failed to enter alternate screen")?;

    // Put the terminal back if anything panics while it is ours
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(
            io::stdout(),
            LeaveAlternateScreen,
            crossterm::event::DisableBracketedPaste
        );
        default_hook(info);
    }));

    Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        crossterm::event::DisableBracketedPaste
    )
    .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;
    use crate::error::GenerationError;
    use crate::llm::{FragmentSender, GenerationRequest};
    use async_trait::async_trait;

    struct EchoGateway;

    #[async_trait]
    impl Gateway for EchoGateway {
        async fn try_stream(
            &self,
            request: &GenerationRequest,
            fragments: &FragmentSender,
        ) -> Result<(), GenerationError> {
            let prompt = request.latest_user_message().map(|m| m.content.clone()).unwrap_or_default();
            let _ = fragments.send(format!("echo: {}", prompt));
            Ok(())
        }
    }

    fn app() -> App {
        App::new(&Config::default(), Arc::new(EchoGateway))
    }

    fn key(code: KeyCode) -> TuiEvent {
        TuiEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> TuiEvent {
        TuiEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_event(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn launcher_opens_and_escape_closes() {
        let mut app = app();
        assert!(!app.widget.is_open());

        app.handle_event(key(KeyCode::Enter));
        assert!(app.widget.is_open());

        app.handle_event(key(KeyCode::Esc));
        assert!(!app.widget.is_open());
        assert!(app.running);

        app.handle_event(key(KeyCode::Char('q')));
        assert!(!app.running);
    }

    #[test]
    fn slash_commands_do_not_become_messages() {
        let mut app = app();
        app.handle_event(key(KeyCode::Enter));

        type_text(&mut app, "/think");
        app.handle_event(key(KeyCode::Enter));

        assert!(app.widget.is_thinking_mode());
        assert!(app.widget.messages().is_empty());
        assert_eq!(app.widget.input(), "");

        type_text(&mut app, "/help");
        app.handle_event(key(KeyCode::Enter));
        assert!(app.status.as_deref().unwrap_or_default().contains("/quit"));
    }

    #[test]
    fn ctrl_t_toggles_thinking_only_when_open() {
        let mut app = app();
        app.handle_event(ctrl('t'));
        assert!(!app.widget.is_thinking_mode());

        app.handle_event(key(KeyCode::Enter));
        app.handle_event(ctrl('t'));
        assert!(app.widget.is_thinking_mode());

        app.handle_event(ctrl('c'));
        assert!(!app.running);
    }

    #[tokio::test]
    async fn enter_streams_reply_into_the_panel() {
        let mut app = app();
        app.handle_event(key(KeyCode::Enter));
        type_text(&mut app, "Hello");
        app.handle_event(key(KeyCode::Enter));

        assert!(app.widget.is_loading());
        assert_eq!(app.widget.messages().len(), 2);

        // A second Enter while streaming keeps the new input
        type_text(&mut app, "again");
        app.handle_event(key(KeyCode::Enter));
        assert_eq!(app.widget.messages().len(), 2);
        assert_eq!(app.widget.input(), "again");

        while app.widget.is_loading() {
            app.widget.poll_stream();
            tokio::task::yield_now().await;
        }

        let last = app.widget.messages().last().unwrap();
        assert_eq!(last.role, Role::Model);
        assert_eq!(last.content, "echo: Hello");
    }
}
