//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation.

use async_trait::async_trait;

use crate::entities::Account;
use crate::error::DomainError;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Account Repository
// ============================================================================

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Find account by username
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<Account>>;

    /// Create a new account
    ///
    /// Fails with `DomainError::UsernameTaken` if the username exists.
    async fn create(&self, username: &str, password_hash: &str) -> RepoResult<Account>;

    /// Get password hash for authentication
    async fn get_password_hash(&self, id: i64) -> RepoResult<Option<String>>;

    /// Total number of accounts
    async fn count(&self) -> RepoResult<i64>;
}
