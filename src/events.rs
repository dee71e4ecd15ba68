/// Terminal events consumed by the app loop
#[derive(Debug, Clone)]
pub enum TuiEvent {
    /// Key press event
    Key(crossterm::event::KeyEvent),

    /// Paste event
    Paste(String),

    /// Terminal resize
    Resize(u16, u16),

    /// Periodic redraw
    Tick,
}

impl TuiEvent {
    /// Map a raw crossterm event, dropping the ones the app ignores
    pub fn from_crossterm(event: crossterm::event::Event) -> Option<Self> {
        match event {
            crossterm::event::Event::Key(key) => Some(TuiEvent::Key(key)),
            crossterm::event::Event::Paste(text) => Some(TuiEvent::Paste(text)),
            crossterm::event::Event::Resize(w, h) => Some(TuiEvent::Resize(w, h)),
            _ => None,
        }
    }
}

/// Generation mode selected by the thinking-mode flag at send time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    /// Faster model, no extended reasoning budget
    Fast,
    /// Higher-capability model with a bounded reasoning budget
    Thinking,
}

impl GenerationMode {
    pub fn from_thinking_flag(thinking: bool) -> Self {
        if thinking {
            GenerationMode::Thinking
        } else {
            GenerationMode::Fast
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            GenerationMode::Fast => "Fast",
            GenerationMode::Thinking => "Thinking",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            GenerationMode::Fast => "quick answers from the lighter model",
            GenerationMode::Thinking => "slower, deeper answers with a reasoning budget",
        }
    }
}
