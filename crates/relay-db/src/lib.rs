//! # relay-db
//!
//! Database layer implementing the account repository with SQLite via SQLx.
//!
//! ## Overview
//!
//! - Connection pool management
//! - Schema bootstrap (`CREATE TABLE IF NOT EXISTS`)
//! - Database models with SQLx `FromRow` derives
//! - Entity ↔ Model mappers
//! - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relay_db::{create_pool, run_migrations, DatabaseConfig, SqliteAccountRepository};
//! use relay_core::AccountRepository;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&DatabaseConfig::in_memory()).await?;
//!     run_migrations(&pool).await?;
//!     let accounts = SqliteAccountRepository::new(pool);
//!
//!     let created = accounts.create("alice", "$argon2id$...").await?;
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use pool::{create_pool, run_migrations, DatabaseConfig, SqlitePool};
pub use repositories::SqliteAccountRepository;
