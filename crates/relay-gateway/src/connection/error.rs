//! Connection error types

use relay_core::ConnectionId;
use std::time::Duration;
use thiserror::Error;

/// Failure reported by the underlying frame transport
#[derive(Debug, Error)]
pub enum TransportError {
    /// WebSocket protocol or I/O failure
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] axum::Error),

    /// The other end of the transport is gone
    #[error("Transport closed")]
    Closed,
}

/// Error returned by `ConnectionHandle::send`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// The handle was closed before or during the send
    #[error("Connection closed")]
    Closed,

    /// The transport rejected the frame
    #[error("Write failed: {0}")]
    Io(String),

    /// The write deadline elapsed before the frame was accepted
    #[error("Write deadline of {0:?} exceeded")]
    TimedOut(Duration),
}

impl SendError {
    /// Check if the handle was already closed
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Error returned by `ConnectionHandle::receive`
///
/// Peer close, protocol errors, end of stream and local close are all
/// reported the same way: the connection will never yield another frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecvError {
    #[error("Connection closed")]
    Closed,
}

/// Error returned by `ConnectionRegistry::add`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The configured connection limit is reached
    #[error("Connection limit of {limit} reached")]
    Full { limit: usize },

    /// A different handle is already stored under this id
    #[error("Registry already holds a different handle for {0}")]
    Inconsistent(ConnectionId),
}
