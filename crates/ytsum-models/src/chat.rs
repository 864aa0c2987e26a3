//! Chat message models.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One message in a chat session.
///
/// Assistant messages grow in place while `is_streaming` is set and are
/// frozen once it is cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
    #[serde(default)]
    pub is_streaming: bool,
}

impl ChatMessage {
    /// A complete user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: ChatRole::User,
            content: content.into(),
            is_streaming: false,
        }
    }

    /// An empty assistant message that is still streaming.
    pub fn assistant_placeholder() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: ChatRole::Assistant,
            content: String::new(),
            is_streaming: true,
        }
    }

    /// Append streamed content. Ignored once the message is frozen.
    pub fn append(&mut self, chunk: &str) -> bool {
        if !self.is_streaming {
            return false;
        }
        self.content.push_str(chunk);
        true
    }

    /// Stop accepting content.
    pub fn freeze(&mut self) {
        self.is_streaming = false;
    }
}

/// Wire shape of a message sent to the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl From<&ChatMessage> for ChatTurn {
    fn from(m: &ChatMessage) -> Self {
        Self {
            role: m.role,
            content: m.content.clone(),
        }
    }
}
