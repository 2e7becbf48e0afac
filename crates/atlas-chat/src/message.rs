//! Chat log entries.

use std::fmt;

use chrono::{DateTime, Utc};

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    /// Speaker label shown in the transcript.
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Assistant => "NUCLEUS",
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single message in the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    /// Client-side time the message was appended
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            timestamp,
        }
    }

    pub fn assistant(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            timestamp,
        }
    }

    /// Time of day for display, e.g. `14:03:27`.
    pub fn time_label(&self) -> String {
        self.timestamp
            .with_timezone(&chrono::Local)
            .format("%H:%M:%S")
            .to_string()
    }
}

/// Delivery state of the exchange a log entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// User message sent, reply outstanding
    Pending,
    /// Reply received
    Resolved,
    /// Request failed; the fallback reply was appended
    Failed,
}

/// A transcript message plus its delivery tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub message: ChatMessage,
    pub delivery: Delivery,
}
