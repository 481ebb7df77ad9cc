//! Error types for Parley.

use std::time::Duration;
use thiserror::Error;

/// A shared error type for the whole Parley workspace.
///
/// Variants follow the failure taxonomy of a dialogue session: configuration
/// problems are fatal at startup, validation problems are rejected before any
/// mutation, and persistence/backend problems are surfaced with the session
/// left in its last known-good state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParleyError {
    /// Missing or malformed persona, preset, user, or scene source
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Rejected input (empty sender, role, or content; inactive session)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Session log resource could not be created, read, or written
    #[error("Persistence error while {operation} at {path}: {message}")]
    Persistence {
        operation: String,
        path: String,
        message: String,
    },

    /// Existing content could not be decoded (or encoded)
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Text-generation backend failure
    #[error("Generation error: {0}")]
    Generation(String),

    /// Summarization backend failure during compaction
    #[error("Summarization error: {0}")]
    Summarization(String),

    /// Weather service failure
    #[error("Weather error: {0}")]
    Weather(String),

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Backend call exceeded its deadline
    #[error("Timed out after {deadline:?} while {operation}")]
    Timeout {
        operation: String,
        deadline: Duration,
    },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ParleyError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a Persistence error for an operation on a resource
    pub fn persistence(
        operation: impl Into<String>,
        path: impl std::fmt::Display,
        message: impl std::fmt::Display,
    ) -> Self {
        Self::Persistence {
            operation: operation.into(),
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    /// Creates a JSON Serialization error
    pub fn json(message: impl std::fmt::Display) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: message.to_string(),
        }
    }

    /// Creates a Generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Creates a Summarization error
    pub fn summarization(message: impl Into<String>) -> Self {
        Self::Summarization(message.into())
    }

    /// Creates a Weather error
    pub fn weather(message: impl Into<String>) -> Self {
        Self::Weather(message.into())
    }

    /// Creates a Timeout error
    pub fn timeout(operation: impl Into<String>, deadline: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            deadline,
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a persistence error
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }

    /// Check if this is a serialization (decode) error
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }

    /// Check if this is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns true for errors a caller may retry by repeating the operation.
    ///
    /// Validation and configuration errors are never retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Persistence { .. }
                | Self::Generation(_)
                | Self::Summarization(_)
                | Self::Weather(_)
                | Self::Timeout { .. }
        )
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ParleyError {
    fn from(err: std::io::Error) -> Self {
        Self::Persistence {
            operation: "performing I/O".to_string(),
            path: "<unknown>".to_string(),
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ParleyError {
    fn from(err: serde_json::Error) -> Self {
        Self::json(err)
    }
}

impl From<toml::de::Error> for ParleyError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, ParleyError>`.
pub type Result<T> = std::result::Result<T, ParleyError>;
