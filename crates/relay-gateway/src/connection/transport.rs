//! Frame transports
//!
//! A `ConnectionHandle` does not talk to a WebSocket directly. It owns a
//! boxed frame sink and a boxed frame stream, so the same handle runs over an
//! axum WebSocket in production and over in-memory channels in tests.

use axum::extract::ws::{Message, WebSocket};
use futures::channel::mpsc;
use futures::future;
use futures::{Sink, SinkExt, Stream, StreamExt};
use relay_core::Frame;
use std::pin::Pin;

use super::TransportError;

/// Write half of a transport
pub type FrameSink = Pin<Box<dyn Sink<Frame, Error = TransportError> + Send>>;

/// Read half of a transport
///
/// Yields data frames only. Control frames are handled below this layer and
/// the stream ends when the peer closes.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Frame, TransportError>> + Send>>;

/// A bidirectional frame transport
pub struct Transport {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

impl Transport {
    /// Build a transport from any frame sink and stream
    pub fn new<S, R>(sink: S, stream: R) -> Self
    where
        S: Sink<Frame, Error = TransportError> + Send + 'static,
        R: Stream<Item = Result<Frame, TransportError>> + Send + 'static,
    {
        Self {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        }
    }

    /// Adapt an upgraded axum WebSocket
    ///
    /// Text and binary messages map to frames unchanged. Ping and pong are
    /// answered by axum and skipped here; a close message ends the stream.
    pub fn websocket(socket: WebSocket) -> Self {
        let (sink, stream) = socket.split();

        let sink = sink
            .sink_map_err(TransportError::from)
            .with(|frame: Frame| future::ready(Ok::<_, TransportError>(frame_to_message(frame))));

        let stream = stream
            .take_while(|message| future::ready(!matches!(message, Ok(Message::Close(_)))))
            .filter_map(|message| {
                future::ready(match message {
                    Ok(Message::Text(text)) => Some(Ok(Frame::Text(text.to_string()))),
                    Ok(Message::Binary(data)) => Some(Ok(Frame::Binary(data.to_vec()))),
                    Ok(_) => None,
                    Err(e) => Some(Err(TransportError::from(e))),
                })
            });

        Self::new(sink, stream)
    }

    /// Create an in-memory transport and the peer that drives it
    ///
    /// `buffer` bounds the frames queued in each direction.
    pub fn in_memory(buffer: usize) -> (Self, MemoryPeer) {
        let (inbound_tx, inbound_rx) = mpsc::channel(buffer);
        let (outbound_tx, outbound_rx) = mpsc::channel(buffer);

        let transport = Self::new(
            outbound_tx.sink_map_err(|_| TransportError::Closed),
            inbound_rx,
        );
        let peer = MemoryPeer {
            inbound: inbound_tx,
            outbound: outbound_rx,
        };

        (transport, peer)
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport").finish_non_exhaustive()
    }
}

fn frame_to_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(text) => Message::Text(text.into()),
        Frame::Binary(data) => Message::Binary(data.into()),
    }
}

/// Remote end of an in-memory transport
#[derive(Debug)]
pub struct MemoryPeer {
    inbound: mpsc::Sender<Result<Frame, TransportError>>,
    outbound: mpsc::Receiver<Frame>,
}

impl MemoryPeer {
    /// Deliver a frame to the handle's read half
    ///
    /// Returns false if the handle dropped its read half.
    pub async fn send(&mut self, frame: impl Into<Frame>) -> bool {
        self.inbound.send(Ok(frame.into())).await.is_ok()
    }

    /// Inject a transport error into the handle's read half
    pub async fn fail(&mut self, error: TransportError) -> bool {
        self.inbound.send(Err(error)).await.is_ok()
    }

    /// Wait for the next frame the handle wrote
    ///
    /// Returns `None` once the write half is closed.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.outbound.next().await
    }

    /// Take a frame the handle already wrote, without waiting
    pub fn try_recv(&mut self) -> Option<Frame> {
        self.outbound.try_recv().ok()
    }

    /// End the handle's read half, as a peer close would
    pub fn hang_up(&mut self) {
        self.inbound.close_channel();
    }

    /// Stop accepting frames; further writes by the handle fail
    pub fn stop_reading(&mut self) {
        self.outbound.close();
    }
}
