//! Domain-level error types.

use thiserror::Error;

/// Domain errors - business logic failures.
///
/// Form validation and authorization failures are not errors: they are recovered
/// locally as [`crate::Outcome`] variants. What remains here is what the caller cannot
/// recover from inside the request.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The entity is absent, or present but not visible to the viewer.
    #[error("Entity not found: {entity_type} {key}")]
    NotFound { entity_type: &'static str, key: String },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Repository(#[from] RepoError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity_type: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            key: key.to_string(),
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

    /// A unique constraint rejected the write.
    #[error("Constraint violation: {0}")]
    Constraint(String),
}
