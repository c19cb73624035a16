//! Domain-level error types.

use thiserror::Error;

use crate::validation::ValidationErrors;

/// Domain errors - business logic failures.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("User already liked this post")]
    AlreadyLiked,

    #[error("User has not yet liked this post")]
    NotLiked,

    #[error("Comment does not exist")]
    CommentNotFound,

    #[error("Concurrent modification: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// A row points at something that does not exist, e.g. a post whose
    /// author account is gone.
    #[error("Missing referenced entity: {0}")]
    MissingReference(String),

    /// The stored version no longer matches the one the write was based on.
    #[error("Version conflict")]
    Conflict,
}

impl From<RepoError> for DomainError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Connection(msg) | RepoError::Query(msg) => DomainError::StoreUnavailable(msg),
            RepoError::Constraint(msg) => DomainError::Duplicate(msg),
            RepoError::MissingReference(_) => DomainError::Unauthorized,
            RepoError::Conflict => DomainError::Conflict("stale version".to_string()),
            RepoError::NotFound => DomainError::Internal("entity vanished mid-operation".to_string()),
        }
    }
}
