//! Value objects - immutable types identified by their value

mod connection_id;
mod frame;

pub use connection_id::{ConnectionId, ConnectionIdParseError};
pub use frame::{Frame, FrameKind};
