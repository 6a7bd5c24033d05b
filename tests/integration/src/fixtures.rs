//! Test fixtures and data generators
//!
//! Provides reusable test data for integration tests.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Login / register request body
#[derive(Debug, Clone, Serialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

impl CredentialsRequest {
    pub fn unique() -> Self {
        Self {
            username: format!("testuser{}", unique_suffix()),
            password: "TestPass123!".to_string(),
        }
    }

    pub fn with_password(&self, password: &str) -> Self {
        Self {
            username: self.username.clone(),
            password: password.to_string(),
        }
    }
}

/// Response body of the login endpoints
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
}
