//! Chat session state machine.
//!
//! ```text
//! Idle --begin--> Sending --resolve(Ok)--> Idle (+ reply)
//!                        --resolve(Err)-> Idle (+ fallback)
//! ```
//!
//! The user message is appended as soon as it is submitted and is never
//! removed. While a reply is outstanding further submissions are refused.

use atlas_api::{ApiError, AtlasBackend};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{ChatError, Result};
use crate::message::{ChatEntry, ChatMessage, ChatRole, Delivery};

/// First assistant message of every session.
pub const GREETING: &str = "Hello! I am NUCLEUS, your autonomous orchestrator. \
Ask me about the system status, processing pipeline, or any subjects.";

/// Assistant message appended when a send fails.
pub const ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// Transcript plus the pending flag for one chat screen.
#[derive(Debug, Clone)]
pub struct ChatSession {
    entries: Vec<ChatEntry>,
    /// Index of the user entry awaiting a reply
    pending: Option<usize>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    /// Start a session with the greeting.
    pub fn new() -> Self {
        let mut session = Self {
            entries: Vec::new(),
            pending: None,
        };
        let at = session.next_timestamp();
        session.entries.push(ChatEntry {
            message: ChatMessage::assistant(GREETING, at),
            delivery: Delivery::Resolved,
        });
        session
    }

    /// Whether a reply is outstanding.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Messages in append order.
    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.entries.iter().map(|entry| &entry.message)
    }

    /// Entries with their delivery tags.
    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Never earlier than the last appended message.
    fn next_timestamp(&self) -> DateTime<Utc> {
        let now = Utc::now();
        match self.entries.last() {
            Some(last) if last.message.timestamp > now => last.message.timestamp,
            _ => now,
        }
    }

    /// Submit `input`: append it as a user message and enter the sending state.
    ///
    /// Returns the text to send to the backend. Blank input and submissions
    /// while a reply is outstanding leave the session untouched.
    pub fn begin(&mut self, input: &str) -> Result<String> {
        let text = input.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyInput);
        }
        if self.is_pending() {
            debug!("chat submission ignored while a reply is outstanding");
            return Err(ChatError::Busy);
        }

        let at = self.next_timestamp();
        self.entries.push(ChatEntry {
            message: ChatMessage::user(text, at),
            delivery: Delivery::Pending,
        });
        self.pending = Some(self.entries.len() - 1);
        info!(chars = text.len(), "chat message submitted");
        Ok(text.to_string())
    }

    /// Complete the outstanding exchange with the backend result.
    ///
    /// Appends exactly one assistant message: the reply, or [`ERROR_REPLY`].
    pub fn resolve(&mut self, result: std::result::Result<String, ApiError>) -> Result<&ChatMessage> {
        let Some(index) = self.pending.take() else {
            warn!("chat reply received with nothing pending");
            return Err(ChatError::NotPending);
        };

        let (delivery, content) = match result {
            Ok(reply) => (Delivery::Resolved, reply),
            Err(e) => {
                warn!(error = %e, "chat request failed");
                (Delivery::Failed, ERROR_REPLY.to_string())
            }
        };

        if let Some(user) = self.entries.get_mut(index) {
            user.delivery = delivery;
        }
        let at = self.next_timestamp();
        self.entries.push(ChatEntry {
            message: ChatMessage::assistant(content, at),
            delivery,
        });

        Ok(&self.entries[self.entries.len() - 1].message)
    }

    /// Submit `input`, wait for the backend, and record the reply.
    pub async fn send(&mut self, backend: &dyn AtlasBackend, input: &str) -> Result<&ChatMessage> {
        let text = self.begin(input)?;
        let result = backend.chat(&text).await;
        self.resolve(result)
    }

    /// Number of messages from `role`.
    pub fn count(&self, role: ChatRole) -> usize {
        self.messages().filter(|m| m.role == role).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_api::MockBackend;

    fn network_error() -> ApiError {
        ApiError::Network {
            endpoint: "/api/nucleus/chat".into(),
            message: "connection reset".into(),
        }
    }

    #[test]
    fn test_opens_with_greeting() {
        let session = ChatSession::new();
        assert_eq!(session.len(), 1);
        let first = session.messages().next().unwrap();
        assert_eq!(first.role, ChatRole::Assistant);
        assert_eq!(first.content, GREETING);
        assert!(!session.is_pending());
    }

    #[test]
    fn test_blank_input_is_noop() {
        let mut session = ChatSession::new();
        for input in ["", "   ", "\n\t "] {
            assert_eq!(session.begin(input), Err(ChatError::EmptyInput));
        }
        assert_eq!(session.len(), 1);
        assert!(!session.is_pending());
    }

    #[test]
    fn test_begin_appends_and_blocks() {
        let mut session = ChatSession::new();
        assert_eq!(session.begin("  status?  ").unwrap(), "status?");
        assert!(session.is_pending());
        assert_eq!(session.len(), 2);
        assert_eq!(session.entries()[1].delivery, Delivery::Pending);

        assert_eq!(session.begin("again"), Err(ChatError::Busy));
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn test_success_appends_reply() {
        let mut session = ChatSession::new();
        session.begin("hi").unwrap();
        let reply = session.resolve(Ok("X".to_string())).unwrap();
        assert_eq!(reply.content, "X");
        assert!(!session.is_pending());

        let entries = session.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].message.role, ChatRole::User);
        assert_eq!(entries[1].delivery, Delivery::Resolved);
        assert_eq!(entries[2].message.role, ChatRole::Assistant);
    }

    #[test]
    fn test_failure_appends_fallback_and_keeps_user_message() {
        let mut session = ChatSession::new();
        session.begin("hi").unwrap();
        session.resolve(Err(network_error())).unwrap();

        assert!(!session.is_pending());
        let entries = session.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].message.content, "hi");
        assert_eq!(entries[1].delivery, Delivery::Failed);
        assert_eq!(entries[2].message.content, ERROR_REPLY);
    }

    #[test]
    fn test_resolve_without_pending_is_rejected() {
        let mut session = ChatSession::new();
        assert_eq!(session.resolve(Ok("late".into())).unwrap_err(), ChatError::NotPending);
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn test_timestamps_never_decrease() {
        let mut session = ChatSession::new();
        for i in 0..20 {
            session.begin(&format!("message {i}")).unwrap();
            session.resolve(Ok(format!("reply {i}"))).unwrap();
        }
        let stamps: Vec<_> = session.messages().map(|m| m.timestamp).collect();
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn test_send_through_backend() {
        let backend = MockBackend::new().with_chat_reply("All engines idle.");
        let mut session = ChatSession::new();

        let reply = session.send(&backend, "status").await.unwrap();
        assert_eq!(reply.content, "All engines idle.");
        assert_eq!(session.count(ChatRole::User), 1);
        assert_eq!(backend.calls(), vec!["chat status".to_string()]);
    }
}
