//! Error types for the chat session.

use thiserror::Error;

/// Reasons a chat operation was not performed.
///
/// None of these are failures the user needs to see: the session state is
/// unchanged when one is returned.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ChatError {
    /// Input was empty or whitespace-only
    #[error("Message is empty")]
    EmptyInput,

    /// A previous message is still awaiting its reply
    #[error("Still waiting for the previous reply")]
    Busy,

    /// A reply arrived with no message awaiting one
    #[error("No message is awaiting a reply")]
    NotPending,
}

impl ChatError {
    /// Hint for the status line, if the error is worth showing.
    pub fn suggested_action(&self) -> Option<&'static str> {
        match self {
            Self::Busy => Some("Wait for NUCLEUS to answer before sending again."),
            Self::EmptyInput | Self::NotPending => None,
        }
    }
}

/// Result type for chat operations.
pub type Result<T> = std::result::Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_busy_has_hint() {
        assert!(ChatError::Busy.suggested_action().is_some());
        assert!(ChatError::EmptyInput.suggested_action().is_none());
        assert!(ChatError::NotPending.suggested_action().is_none());
    }
}
