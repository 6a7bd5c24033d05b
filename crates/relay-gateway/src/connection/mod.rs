//! Connection management
//!
//! A `ConnectionHandle` owns one bidirectional frame transport; the
//! `ConnectionRegistry` tracks which handles are eligible for broadcasts.

mod error;
mod handle;
mod registry;
pub mod transport;

pub use error::{RecvError, RegistryError, SendError, TransportError};
pub use handle::{ConnectionHandle, ConnectionState};
pub use registry::ConnectionRegistry;
pub use transport::{FrameSink, FrameStream, Transport};
