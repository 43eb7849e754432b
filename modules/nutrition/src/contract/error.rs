use thiserror::Error;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NutritionError {
    /// Wrong credentials, or a session that no longer resolves to its user.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The database could not be reached; retrying later may succeed.
    #[error("Service temporarily unavailable")]
    Unavailable,

    #[error("Internal error")]
    Internal,
}

impl NutritionError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<crate::domain::error::DomainError> for NutritionError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            InvalidCredentials | SessionInvalid { .. } => Self::InvalidCredentials,
            UserNotFound { username } => Self::not_found(format!("user '{username}'")),
            Validation { field, message } => Self::validation(format!("{field}: {message}")),
            ConnectionUnavailable { .. } => Self::Unavailable,
            WriteFailed { .. } | Database { .. } => Self::Internal,
        }
    }
}
