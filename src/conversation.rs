//! Conversation data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// A single conversational turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(skip, default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// An empty model turn that fragments are streamed into
    pub fn placeholder() -> Self {
        Self {
            role: Role::Model,
            content: String::new(),
            timestamp: Utc::now(),
        }
    }
}

/// Append-only ordered list of turns
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Append text to the last turn if it is a model turn.
    ///
    /// Returns `false`, leaving the conversation untouched, otherwise.
    pub fn append_to_last_model(&mut self, fragment: &str) -> bool {
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Model => {
                last.content.push_str(fragment);
                true
            }
            _ => false,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}
