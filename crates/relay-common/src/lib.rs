//! # relay-common
//!
//! Shared utilities including configuration, error handling, password hashing, and telemetry.

pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::PasswordService;
pub use config::{
    AppConfig, AppSettings, ConfigError, CorsConfig, DatabaseConfig, Environment, HubSettings,
    LoginConfig, ServerConfig, StaticConfig,
};
pub use error::{AppError, ErrorResponse};
pub use telemetry::{init_tracing, LogFormat, TracingConfig, TracingError};
