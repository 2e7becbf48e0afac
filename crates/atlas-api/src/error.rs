//! Error types for backend API calls.

use thiserror::Error;

/// Backend API errors.
///
/// Callers never propagate these further than the screen that issued the
/// request: a failed refresh keeps the previous snapshot, a failed chat send
/// becomes a fixed assistant message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The request could not complete (DNS, connect, reset, ...)
    #[error("Network error calling {endpoint}: {message}")]
    Network { endpoint: String, message: String },

    /// The request exceeded the configured timeout
    #[error("Request to {endpoint} timed out after {timeout_secs}s")]
    Timeout { endpoint: String, timeout_secs: u64 },

    /// The backend answered with a non-success status
    #[error("HTTP {status} from {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The response body was not valid JSON
    #[error("Invalid JSON from {endpoint}: {message}")]
    Parse { endpoint: String, message: String },

    /// The HTTP client could not be built
    #[error("HTTP client configuration error: {0}")]
    Client(String),
}

impl ApiError {
    /// Classify a reqwest failure for `endpoint`.
    pub fn from_reqwest(endpoint: &str, err: &reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                endpoint: endpoint.to_string(),
                timeout_secs,
            }
        } else if err.is_decode() {
            Self::Parse {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        } else {
            Self::Network {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// Check if this error is a network-level failure.
    pub fn is_network_error(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Timeout { .. })
    }

    /// Check if the body could not be parsed.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    /// Endpoint the failed request targeted, if known.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Network { endpoint, .. }
            | Self::Timeout { endpoint, .. }
            | Self::Status { endpoint, .. }
            | Self::Parse { endpoint, .. } => Some(endpoint),
            Self::Client(_) => None,
        }
    }

    /// Short text for the status line.
    pub fn friendly_message(&self) -> String {
        match self {
            Self::Network { .. } => "Backend unreachable. Showing last known data.".to_string(),
            Self::Timeout { timeout_secs, .. } => {
                format!("Backend timed out after {}s. Showing last known data.", timeout_secs)
            }
            Self::Status { status, .. } => {
                format!("Backend returned HTTP {}. Showing last known data.", status)
            }
            Self::Parse { .. } => "Backend sent malformed data. Showing last known data.".to_string(),
            Self::Client(msg) => format!("HTTP client error: {}", msg),
        }
    }
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;
