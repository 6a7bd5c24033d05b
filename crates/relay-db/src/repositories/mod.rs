//! Repository implementations

mod account;
pub mod error;

pub use account::SqliteAccountRepository;
