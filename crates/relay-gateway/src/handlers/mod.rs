//! HTTP and WebSocket handlers

mod extract;
mod health;
mod login;
mod ws;

pub use extract::ValidatedJson;
pub use health::health_check;
pub use login::{login, register};
pub use ws::ws_handler;
