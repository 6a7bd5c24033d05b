//! # relay-gateway
//!
//! WebSocket broadcast hub: every frame received from one connection is
//! relayed to every registered connection. Also serves the login endpoints
//! and the static client.

pub mod connection;
pub mod handlers;
pub mod hub;
pub mod login;
pub mod server;

pub use connection::{ConnectionHandle, ConnectionRegistry, ConnectionState, Transport};
pub use hub::{BroadcastHub, BroadcastReport, EchoPolicy, HubConfig, HubError};
pub use login::LoginGateway;
pub use server::{create_app, create_gateway_state, run, run_server, GatewayError, GatewayState};
