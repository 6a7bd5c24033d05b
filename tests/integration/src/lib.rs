//! Integration test utilities for the relay server
//!
//! This crate provides helpers for running end-to-end tests against
//! the HTTP endpoints and the WebSocket hub.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
