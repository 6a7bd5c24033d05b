//! Domain traits (ports)

mod repositories;

pub use repositories::{AccountRepository, RepoResult};
