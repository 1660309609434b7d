//! Domain-level error types.

use thiserror::Error;

use crate::ports::AuthError;

/// Domain errors - failures of a single user action.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Entity not found: {entity_type} with id {id:?}")]
    NotFound { entity_type: &'static str, id: String },

    #[error("Forbidden")]
    Forbidden,

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Document store errors, as reported by the realtime backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Invalid path: {0:?}")]
    InvalidPath(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => DomainError::Unavailable(msg),
            StoreError::NotFound(path) => DomainError::NotFound {
                entity_type: "record",
                id: path,
            },
            StoreError::InvalidPath(path) => {
                DomainError::Validation(format!("invalid record path {path:?}"))
            }
            StoreError::Serialization(msg) => DomainError::Internal(msg),
        }
    }
}
