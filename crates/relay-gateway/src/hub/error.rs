//! Hub error types

use thiserror::Error;

use crate::connection::RegistryError;

/// Hub error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    /// The connection could not be registered
    #[error("Registration failed: {0}")]
    Registry(#[from] RegistryError),
}

impl HubError {
    /// Check if the hub refused the connection for capacity
    pub fn is_capacity(&self) -> bool {
        matches!(self, Self::Registry(RegistryError::Full { .. }))
    }
}
