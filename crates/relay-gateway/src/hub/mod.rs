//! Broadcast hub
//!
//! Owns the connection registry and runs the per-connection lifecycle:
//! register, relay every received frame to all members, tear down.

mod broadcast;
mod config;
mod error;

pub use broadcast::{BroadcastHub, BroadcastReport};
pub use config::{EchoPolicy, HubConfig};
pub use error::HubError;
