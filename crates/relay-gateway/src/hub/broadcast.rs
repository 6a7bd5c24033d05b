//! Broadcast hub
//!
//! One `serve` call runs per connection, on the task that accepted it. Every
//! frame read by that loop is fanned out over a snapshot of the registry
//! before the next frame is read, which keeps per-sender FIFO order.

use futures::future::join_all;
use relay_core::{ConnectionId, Frame};
use std::sync::Arc;

use super::{HubConfig, HubError};
use crate::connection::{
    ConnectionHandle, ConnectionRegistry, ConnectionState, RegistryError, SendError, Transport,
};

/// Outcome of one fan-out pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Handles the frame was addressed to
    pub recipients: usize,
    /// Handles that accepted the frame
    pub delivered: usize,
    /// Handles removed because their send failed
    pub evicted: Vec<ConnectionId>,
}

impl BroadcastReport {
    /// Check if every recipient accepted the frame
    pub fn is_complete(&self) -> bool {
        self.delivered == self.recipients
    }
}

/// Relays frames between all registered connections
#[derive(Debug)]
pub struct BroadcastHub {
    registry: ConnectionRegistry,
    config: HubConfig,
}

impl BroadcastHub {
    /// Create a new hub
    #[must_use]
    pub fn new(config: HubConfig) -> Self {
        Self {
            registry: ConnectionRegistry::with_limit(config.max_connections),
            config,
        }
    }

    /// Create a new hub wrapped in Arc
    #[must_use]
    pub fn new_shared(config: HubConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    /// Wrap a transport in a handle using the hub's write deadline
    pub fn open(&self, transport: Transport) -> Arc<ConnectionHandle> {
        ConnectionHandle::new(transport, self.config.send_timeout)
    }

    /// Run the full lifecycle of one connection
    ///
    /// Registers the handle, relays its frames until it terminates, then
    /// removes and closes it. If registration fails the handle is closed and
    /// nothing is relayed.
    pub async fn serve(&self, handle: Arc<ConnectionHandle>) -> Result<(), HubError> {
        self.register(&handle)?;
        self.relay(&handle).await;
        self.teardown(&handle);
        Ok(())
    }

    /// Add a handle to the registry
    ///
    /// Returns `Ok(false)` if it was already registered. On failure the
    /// handle is closed.
    pub fn register(&self, handle: &Arc<ConnectionHandle>) -> Result<bool, HubError> {
        match self.registry.add(handle) {
            Ok(added) => {
                handle.advance(ConnectionState::Registered);
                if added {
                    tracing::info!(
                        connection_id = %handle.id(),
                        connections = self.registry.len(),
                        "Connection registered"
                    );
                }
                Ok(added)
            }
            Err(e) => {
                match &e {
                    RegistryError::Full { limit } => tracing::warn!(
                        connection_id = %handle.id(),
                        limit,
                        "Connection refused, hub at capacity"
                    ),
                    RegistryError::Inconsistent(id) => tracing::error!(
                        connection_id = %id,
                        "Registry holds a different handle under this id"
                    ),
                }
                debug_assert!(
                    !matches!(e, RegistryError::Inconsistent(_)),
                    "registry invariant violated: {e}"
                );

                handle.close();
                Err(e.into())
            }
        }
    }

    /// Receive loop: fan out every frame until the connection terminates
    async fn relay(&self, handle: &Arc<ConnectionHandle>) {
        handle.advance(ConnectionState::Relaying);

        loop {
            let received = match self.config.idle_timeout {
                Some(idle) => match tokio::time::timeout(idle, handle.receive()).await {
                    Ok(received) => received,
                    Err(_) => {
                        tracing::info!(
                            connection_id = %handle.id(),
                            idle_ms = idle.as_millis(),
                            "Closing idle connection"
                        );
                        break;
                    }
                },
                None => handle.receive().await,
            };

            let Ok(frame) = received else {
                tracing::debug!(connection_id = %handle.id(), "Receive loop ended");
                break;
            };

            tracing::trace!(
                connection_id = %handle.id(),
                kind = %frame.kind(),
                len = frame.len(),
                "Frame received"
            );

            self.broadcast(Some(&handle.id()), frame).await;
        }
    }

    /// Deliver a frame to every registered connection
    ///
    /// Sends run concurrently, each bounded by its handle's write deadline.
    /// Handles whose send fails are removed and closed; the others still
    /// receive the frame. `sender` only matters for the echo policy.
    pub async fn broadcast(&self, sender: Option<&ConnectionId>, frame: Frame) -> BroadcastReport {
        let recipients: Vec<_> = self
            .registry
            .snapshot()
            .into_iter()
            .filter(|handle| self.config.echo.delivers_to(&handle.id(), sender))
            .collect();

        let results = join_all(recipients.iter().map(|handle| handle.send(frame.clone()))).await;

        let mut report = BroadcastReport {
            recipients: recipients.len(),
            ..Default::default()
        };

        for (handle, result) in recipients.iter().zip(results) {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    self.evict(handle, &e);
                    report.evicted.push(handle.id());
                }
            }
        }

        if !report.evicted.is_empty() {
            tracing::debug!(
                recipients = report.recipients,
                delivered = report.delivered,
                evicted = report.evicted.len(),
                "Broadcast finished with evictions"
            );
        }

        report
    }

    /// Close one connection; its serve loop tears it down
    ///
    /// Returns false if no such connection is registered.
    pub fn disconnect(&self, id: &ConnectionId) -> bool {
        let Some(handle) = self.registry.get(id) else {
            return false;
        };

        self.registry.remove(id);
        handle.close();
        tracing::info!(connection_id = %id, "Connection disconnected");
        true
    }

    /// Close every connection, e.g. on shutdown
    ///
    /// Returns the number of connections closed.
    pub fn close_all(&self) -> usize {
        let handles = self.registry.snapshot();
        for handle in &handles {
            self.registry.remove(&handle.id());
            handle.close();
        }

        tracing::info!(closed = handles.len(), "Closed all connections");
        handles.len()
    }

    /// Number of registered connections
    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Check if a new connection would be accepted
    pub fn has_capacity(&self) -> bool {
        self.registry.has_capacity()
    }

    /// Get the registry
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Get the configuration
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    fn evict(&self, handle: &ConnectionHandle, error: &SendError) {
        self.registry.remove(&handle.id());
        handle.close();

        if error.is_closed() {
            tracing::debug!(connection_id = %handle.id(), "Dropped closed connection from registry");
        } else {
            tracing::warn!(connection_id = %handle.id(), error = %error, "Evicting connection after failed send");
        }
    }

    fn teardown(&self, handle: &ConnectionHandle) {
        handle.advance(ConnectionState::Closing);
        let removed = self.registry.remove(&handle.id());
        handle.close();

        tracing::info!(
            connection_id = %handle.id(),
            removed,
            connections = self.registry.len(),
            age_ms = handle.age().as_millis(),
            "Connection torn down"
        );
    }
}
