//! Domain errors - failures reported by the account store

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    /// An account with this username already exists
    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    /// The store could not complete the operation
    #[error("Database error: {0}")]
    DatabaseError(String),
}
