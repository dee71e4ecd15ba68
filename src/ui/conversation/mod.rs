//! Chat panel: widget state, composer, history and slash commands

pub mod commands;
pub mod composer;
pub mod history;
pub mod panel;
pub mod widget;

pub use commands::{SlashCommand, get_help_text, parse_slash_command};
pub use composer::{ComposerAction, TextInput};
pub use panel::ChatPanel;
pub use widget::ChatWidget;
