//! Connection registry
//!
//! The set of handles currently eligible to receive broadcasts. The lock is
//! held only for the set operation itself, never across an `.await`.

use parking_lot::Mutex;
use relay_core::ConnectionId;
use std::collections::HashMap;
use std::sync::Arc;

use super::{ConnectionHandle, RegistryError};

/// Concurrency-safe set of active connections
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// Active connections by ID
    connections: Mutex<HashMap<ConnectionId, Arc<ConnectionHandle>>>,

    /// Maximum number of members, if bounded
    limit: Option<usize>,
}

impl ConnectionRegistry {
    /// Create an unbounded registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry that refuses members beyond `limit`
    #[must_use]
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            limit,
        }
    }

    /// Insert a handle
    ///
    /// Returns `Ok(false)` if this handle is already present. The capacity
    /// check and the insert happen under the same lock.
    pub fn add(&self, handle: &Arc<ConnectionHandle>) -> Result<bool, RegistryError> {
        let mut connections = self.connections.lock();

        if let Some(existing) = connections.get(&handle.id()) {
            if Arc::ptr_eq(existing, handle) {
                return Ok(false);
            }
            return Err(RegistryError::Inconsistent(handle.id()));
        }

        if let Some(limit) = self.limit {
            if connections.len() >= limit {
                return Err(RegistryError::Full { limit });
            }
        }

        connections.insert(handle.id(), Arc::clone(handle));
        Ok(true)
    }

    /// Remove a handle by ID; returns false if it was not present
    pub fn remove(&self, id: &ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Point-in-time copy of the membership
    pub fn snapshot(&self) -> Vec<Arc<ConnectionHandle>> {
        self.connections.lock().values().cloned().collect()
    }

    /// Get a handle by ID
    pub fn get(&self, id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.connections.lock().get(id).cloned()
    }

    /// Check if a handle is registered
    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.lock().contains_key(id)
    }

    /// Number of registered handles
    pub fn len(&self) -> usize {
        self.connections.lock().len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.connections.lock().is_empty()
    }

    /// Configured capacity limit
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Check if another handle could be added right now
    pub fn has_capacity(&self) -> bool {
        self.limit.map_or(true, |limit| self.len() < limit)
    }
}
