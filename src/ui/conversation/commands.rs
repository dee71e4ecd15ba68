use std::str::FromStr;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Toggle thinking mode for the next message
    Think,
    /// Close the chat panel
    Close,
    /// Show help
    Help,
    /// Exit the application
    Quit,
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::Think => "toggle thinking mode for the next message",
            SlashCommand::Close => "close the chat panel",
            SlashCommand::Help => "show available commands",
            SlashCommand::Quit => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }
}

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let input = input.trim();
    let head = input.strip_prefix('/')?.split_whitespace().next()?;

    SlashCommand::from_str(head)
        .ok()
        .or_else(|| match head.to_lowercase().as_str() {
            "t" | "thinking" => Some(SlashCommand::Think),
            "q" | "exit" | "bye" => Some(SlashCommand::Quit),
            "h" | "?" => Some(SlashCommand::Help),
            _ => None,
        })
}

/// One-line help text for the status bar
pub fn get_help_text() -> String {
    let commands: Vec<String> = SlashCommand::iter()
        .map(|command| format!("/{} {}", command.command(), command.description()))
        .collect();
    format!(
        "{} · Ctrl+T thinking · Esc close · PgUp/PgDn scroll",
        commands.join(" · ")
    )
}
