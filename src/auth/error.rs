use thiserror::Error;

use crate::config::ConfigError;
use crate::database::DatabaseError;

/// Failures raised by the credential service
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    #[error("Role {0} may not access this resource")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Password hashing error: {0}")]
    Hashing(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl AuthError {
    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        AuthError::Unauthenticated(reason.into())
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        AuthError::Validation(reason.into())
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
