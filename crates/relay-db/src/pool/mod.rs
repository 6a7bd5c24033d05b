//! Connection pool management

mod sqlite;

pub use sqlite::{create_pool, run_migrations, DatabaseConfig};
pub use sqlx::SqlitePool;
