//! Terminal landing page with a streaming Gemini chat assistant.

pub mod commands;
pub mod config;
pub mod conversation;
pub mod error;
pub mod events;
pub mod llm;
pub mod logging;
pub mod streaming;
pub mod ui;
