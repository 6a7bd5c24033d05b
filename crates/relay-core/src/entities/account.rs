//! Account entity - a login identity known to the account store

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Account entity
///
/// The password hash is never part of the entity; repositories expose it
/// through a dedicated lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create a new Account
    pub fn new(id: i64, username: String) -> Self {
        Self {
            id,
            username,
            created_at: Utc::now(),
        }
    }
}
