//! Error types for Atlas operations.
//!
//! This module defines [`AtlasError`], the error enum for everything outside
//! the HTTP layer: configuration, filesystem, logging and terminal setup.
//! Backend failures live in `atlas_api::ApiError` and never reach this type;
//! they degrade to stale or placeholder data at the screen that asked.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`AtlasError`].
pub type Result<T> = std::result::Result<T, AtlasError>;

/// Error type for dashboard setup and configuration.
#[derive(Debug, Error)]
pub enum AtlasError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration file could not be read
    #[error("Configuration not readable at {path}")]
    ConfigUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is invalid YAML
    #[error("Invalid configuration at {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    /// Configuration validation failed
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String },

    // =========================================================================
    // I/O Errors
    // =========================================================================
    /// Directory creation failed
    #[error("Failed to create directory: {path}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Runtime / TUI Errors
    // =========================================================================
    /// Async runtime could not be started
    #[error("Failed to start async runtime: {message}")]
    RuntimeInit { message: String },

    /// Terminal initialization failed
    #[error("Terminal initialization failed: {message}")]
    TerminalInit { message: String },

    /// Internal error (bug in Atlas)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AtlasError {
    /// Create a ConfigInvalid error
    pub fn config_invalid(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a ConfigValidation error
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a TerminalInit error
    pub fn terminal_init(source: impl std::fmt::Display) -> Self {
        Self::TerminalInit {
            message: source.to_string(),
        }
    }

    /// Returns true if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigUnreadable { .. } | Self::ConfigInvalid { .. } | Self::ConfigValidation { .. }
        )
    }

    /// Returns actionable guidance for the user
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            Self::ConfigUnreadable { .. } => Some("Check file permissions on ~/.atlas/config.yaml"),
            Self::ConfigInvalid { .. } => {
                Some("Check YAML syntax in ~/.atlas/config.yaml or delete it to use defaults")
            }
            Self::ConfigValidation { .. } => {
                Some("Intervals and max_results must be positive; backend_url must be http(s)")
            }
            Self::DirectoryCreation { .. } => Some("Pass --log-dir to write logs elsewhere"),
            Self::TerminalInit { .. } => Some("Try running in a different terminal"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_invalid_error() {
        let err = AtlasError::config_invalid("/home/user/.atlas/config.yaml", "bad indent");
        assert!(err.to_string().contains("Invalid configuration"));
        assert!(err.to_string().contains("bad indent"));
        assert!(err.is_config_error());
        assert!(err.guidance().is_some_and(|g| g.contains("YAML syntax")));
    }

    #[test]
    fn test_error_classification() {
        assert!(AtlasError::config_validation("zero interval").is_config_error());
        assert!(!AtlasError::internal("bug").is_config_error());
        assert_eq!(AtlasError::internal("bug").guidance(), None);
    }

    #[test]
    fn test_terminal_init_error() {
        let io = std::io::Error::new(std::io::ErrorKind::Unsupported, "not a tty");
        let err = AtlasError::terminal_init(io);
        assert!(err.to_string().contains("not a tty"));
        assert!(!err.is_config_error());
        assert_eq!(err.guidance(), Some("Try running in a different terminal"));
    }
}
