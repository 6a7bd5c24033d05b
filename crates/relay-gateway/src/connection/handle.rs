//! Individual connection handle
//!
//! Wraps one live transport with serialized writes, bounded send latency and
//! an idempotent close that cancels in-flight operations.

use futures::{SinkExt, StreamExt};
use relay_core::{ConnectionId, Frame};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::transport::{FrameSink, FrameStream, Transport};
use super::{RecvError, SendError};

/// Connection lifecycle state
///
/// States only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Upgraded, not yet registered
    Connecting,
    /// Present in the registry, receive loop not started
    Registered,
    /// Receive loop running
    Relaying,
    /// Being torn down
    Closing,
    /// Transport released
    Closed,
}

/// A single live connection
pub struct ConnectionHandle {
    /// Unique connection ID
    id: ConnectionId,

    /// Write half; the lock serializes concurrent senders
    sink: Mutex<Option<FrameSink>>,

    /// Read half
    stream: Mutex<Option<FrameStream>>,

    /// Fired once by `close`
    shutdown: CancellationToken,

    /// Set by the first `close`
    closed: AtomicBool,

    /// Current lifecycle state
    state: parking_lot::Mutex<ConnectionState>,

    /// Upper bound for one `send`, lock wait included
    write_timeout: Duration,

    /// Connection creation time
    created_at: Instant,
}

impl ConnectionHandle {
    /// Create a handle over a transport with a fresh id
    pub fn new(transport: Transport, write_timeout: Duration) -> Arc<Self> {
        Self::with_id(ConnectionId::new(), transport, write_timeout)
    }

    /// Create a handle with a caller-chosen id
    pub fn with_id(id: ConnectionId, transport: Transport, write_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            id,
            sink: Mutex::new(Some(transport.sink)),
            stream: Mutex::new(Some(transport.stream)),
            shutdown: CancellationToken::new(),
            closed: AtomicBool::new(false),
            state: parking_lot::Mutex::new(ConnectionState::Connecting),
            write_timeout,
            created_at: Instant::now(),
        })
    }

    /// Get the connection ID
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Get the current state
    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Move to a later state; earlier or equal states are ignored
    pub fn advance(&self, next: ConnectionState) {
        let mut state = self.state.lock();
        if next > *state {
            *state = next;
        }
    }

    /// Check if `close` has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Get the write deadline
    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    /// Get connection age
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Transmit one frame
    ///
    /// Concurrent sends are serialized, so frames never interleave. The whole
    /// call, including the wait for the write lock, is bounded by the write
    /// deadline. A `close` racing this call makes it return
    /// `SendError::Closed` promptly.
    pub async fn send(&self, frame: Frame) -> Result<(), SendError> {
        if self.is_closed() {
            return Err(SendError::Closed);
        }

        let outcome = self.write(frame).await;

        // close() cannot take a sink that a send holds; the flag is set before
        // it tries, so whoever releases the lock last retires the sink
        if self.is_closed() {
            self.release_sink();
        }

        outcome
    }

    async fn write(&self, frame: Frame) -> Result<(), SendError> {
        let deadline = tokio::time::Instant::now() + self.write_timeout;

        let mut guard = tokio::select! {
            biased;
            () = self.shutdown.cancelled() => return Err(SendError::Closed),
            guard = tokio::time::timeout_at(deadline, self.sink.lock()) => match guard {
                Ok(guard) => guard,
                Err(_) => return Err(SendError::TimedOut(self.write_timeout)),
            },
        };

        let Some(sink) = guard.as_mut() else {
            return Err(SendError::Closed);
        };

        let outcome = tokio::select! {
            biased;
            () = self.shutdown.cancelled() => Err(SendError::Closed),
            result = tokio::time::timeout_at(deadline, sink.send(frame)) => match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(SendError::Io(e.to_string())),
                Err(_) => Err(SendError::TimedOut(self.write_timeout)),
            },
        };
        outcome
    }

    /// Wait for the next data frame
    ///
    /// Returns `RecvError::Closed` once the peer closes, the transport fails,
    /// the stream ends or `close` is called. After that every call fails the
    /// same way.
    pub async fn receive(&self) -> Result<Frame, RecvError> {
        if self.is_closed() {
            return Err(RecvError::Closed);
        }

        let mut guard = tokio::select! {
            biased;
            () = self.shutdown.cancelled() => return Err(RecvError::Closed),
            guard = self.stream.lock() => guard,
        };

        let Some(stream) = guard.as_mut() else {
            return Err(RecvError::Closed);
        };

        let item = tokio::select! {
            biased;
            () = self.shutdown.cancelled() => None,
            item = stream.next() => item,
        };

        match item {
            Some(Ok(frame)) => Ok(frame),
            Some(Err(e)) => {
                tracing::debug!(connection_id = %self.id, error = %e, "Transport error on receive");
                guard.take();
                Err(RecvError::Closed)
            }
            None => {
                guard.take();
                Err(RecvError::Closed)
            }
        }
    }

    /// Close the connection
    ///
    /// Idempotent and callable from any task. The first call cancels in-flight
    /// `send` and `receive`, drops the read half and closes the write half in
    /// the background. Returns true for the call that actually closed.
    pub fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }

        self.advance(ConnectionState::Closing);
        self.shutdown.cancel();

        // Halves held by an in-flight call are released by that call
        if let Ok(mut stream) = self.stream.try_lock() {
            stream.take();
        }
        self.release_sink();

        self.advance(ConnectionState::Closed);
        tracing::debug!(connection_id = %self.id, "Connection closed");

        true
    }

    /// Take the write half if no send holds it and close it
    fn release_sink(&self) {
        if let Ok(mut sink) = self.sink.try_lock() {
            if let Some(sink) = sink.take() {
                self.retire_sink(sink);
            }
        }
    }

    /// Close the write half without blocking the caller
    fn retire_sink(&self, mut sink: FrameSink) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let id = self.id;
        let write_timeout = self.write_timeout;
        runtime.spawn(async move {
            match tokio::time::timeout(write_timeout, sink.close()).await {
                Ok(Ok(())) => tracing::trace!(connection_id = %id, "Write half closed"),
                Ok(Err(e)) => {
                    tracing::debug!(connection_id = %id, error = %e, "Error closing write half");
                }
                Err(_) => tracing::debug!(connection_id = %id, "Timed out closing write half"),
            }
        });
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("write_timeout", &self.write_timeout)
            .field("created_at", &self.created_at)
            .finish()
    }
}
