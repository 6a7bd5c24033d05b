//! Login gateway
//!
//! Account lookup and creation against the account store. Independent of the
//! broadcast hub.

mod dto;
mod error;
mod service;

pub use dto::{Credentials, LoginResponse};
pub use error::LoginError;
pub use service::{LoginGateway, LoginOutcome};
