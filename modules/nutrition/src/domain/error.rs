use thiserror::Error;

use crate::domain::repo::PersistenceError;

/// Domain-specific errors using thiserror
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Unknown user or wrong password; deliberately not told apart.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("User not found: '{username}'")]
    UserNotFound { username: String },

    /// A session whose user no longer resolves to the same id.
    #[error("Session for '{username}' no longer matches a user")]
    SessionInvalid { username: String },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Database unavailable: {message}")]
    ConnectionUnavailable { message: String },

    #[error("Write failed: {message}")]
    WriteFailed { message: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn user_not_found(username: impl Into<String>) -> Self {
        Self::UserNotFound {
            username: username.into(),
        }
    }

    pub fn session_invalid(username: impl Into<String>) -> Self {
        Self::SessionInvalid {
            username: username.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Classify a failed read.
    pub fn from_read(err: PersistenceError) -> Self {
        match err {
            PersistenceError::Connection { message } => Self::ConnectionUnavailable { message },
            PersistenceError::Query { message } => Self::Database { message },
        }
    }

    /// Classify a failed write.
    pub fn from_write(err: PersistenceError) -> Self {
        match err {
            PersistenceError::Connection { message } => Self::ConnectionUnavailable { message },
            PersistenceError::Query { message } => Self::WriteFailed { message },
        }
    }
}
