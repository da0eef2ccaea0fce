//! Error types and result aliases for Monstera operations.
//!
//! Provides a unified error type that covers configuration, transport and
//! API failures with actionable error messages.

use thiserror::Error;

use crate::types::{ApiFailure, ErrorKind};

/// Unified error type for all Monstera operations
#[derive(Error, Debug)]
pub enum MonsteraError {
    // Resolution errors
    #[error("Unknown client preset '{name}'")]
    UnknownPreset { name: String },

    #[error("Unknown environment '{name}'")]
    UnknownEnvironment { name: String },

    #[error("Invalid API version '{input}': {reason}")]
    InvalidVersion { input: String, reason: String },

    // Config errors
    #[error("Failed to parse monstera.toml: {message} at line {line}, column {column}")]
    TomlParse {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    // Session errors
    #[error("Token is not a well-formed JWT: {reason}")]
    InvalidToken { reason: String },

    // Transport errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error(transparent)]
    Api(#[from] ApiFailure),

    #[error("Failed to decode response: {message}")]
    Decode {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for Monstera operations
pub type MonsteraResult<T> = Result<T, MonsteraError>;

impl MonsteraError {
    /// Create a network error from any error type
    pub fn network<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create a decode error from any error type
    pub fn decode<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Decode {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Normalized API failure carried by this error, if any
    pub fn api_failure(&self) -> Option<&ApiFailure> {
        match self {
            MonsteraError::Api(failure) => Some(failure),
            _ => None,
        }
    }

    /// Failure category, when the error came back from an API call
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            MonsteraError::Api(failure) => Some(failure.kind),
            MonsteraError::Network { .. } => Some(ErrorKind::NetworkError),
            _ => None,
        }
    }

    /// True for cancelled requests, which callers should not surface to users
    pub fn is_abort(&self) -> bool {
        self.kind() == Some(ErrorKind::Abort)
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            MonsteraError::Network { .. } | MonsteraError::Io { .. } => true,
            MonsteraError::Api(failure) => failure.kind.is_retryable(),
            _ => false,
        }
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            MonsteraError::UnknownPreset { .. } => Some(
                "Use one of: default, auth, admin, public, upload, batch, realtime",
            ),
            MonsteraError::UnknownEnvironment { .. } => {
                Some("Use one of: development, staging, production")
            }
            MonsteraError::Network { .. } => Some("Check your internet connection and try again"),
            MonsteraError::InvalidToken { .. } => Some("Sign in again to obtain a fresh session"),
            MonsteraError::Api(failure) => match failure.kind {
                ErrorKind::Unauthorized => Some("Your session has expired; sign in again"),
                ErrorKind::Forbidden => Some("Ask an administrator for access to this resource"),
                ErrorKind::Validation => Some("Check the submitted fields and try again"),
                ErrorKind::RateLimited => Some("Wait a moment before retrying"),
                ErrorKind::NetworkError | ErrorKind::Timeout => {
                    Some("Check your internet connection and try again")
                }
                _ => None,
            },
            _ => None,
        }
    }
}
