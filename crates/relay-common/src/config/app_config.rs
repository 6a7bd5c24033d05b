//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub hub: HubSettings,
    pub login: LoginConfig,
    pub cors: CorsConfig,
    pub static_files: StaticConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => Ok(Self::Development),
            other => Err(ConfigError::InvalidValue("APP_ENV", other.to_string())),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Account store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Broadcast hub settings
#[derive(Debug, Clone, Deserialize)]
pub struct HubSettings {
    /// Write deadline for a single frame to a single peer
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
    /// Close connections that stay silent this long (disabled when unset)
    #[serde(default)]
    pub idle_timeout_secs: Option<u64>,
    /// Registry capacity, 0 means unbounded
    #[serde(default = "default_hub_max_connections")]
    pub max_connections: usize,
    /// Relay a frame back to the connection that sent it
    #[serde(default = "default_echo_to_sender")]
    pub echo_to_sender: bool,
}

/// Smallest accepted write deadline
pub const MIN_SEND_TIMEOUT_MS: u64 = 10;

impl HubSettings {
    /// Write deadline, never below `MIN_SEND_TIMEOUT_MS`
    #[must_use]
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms.max(MIN_SEND_TIMEOUT_MS))
    }

    /// Idle timeout; zero counts as disabled
    #[must_use]
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
    }

    /// Reject timeouts that would close connections immediately
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.send_timeout_ms < MIN_SEND_TIMEOUT_MS {
            return Err(ConfigError::InvalidValue(
                "HUB_SEND_TIMEOUT_MS",
                format!("{} (minimum is {MIN_SEND_TIMEOUT_MS})", self.send_timeout_ms),
            ));
        }
        if self.idle_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "HUB_IDLE_TIMEOUT_SECS",
                "0 (leave unset to disable)".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn connection_limit(&self) -> Option<usize> {
        (self.max_connections > 0).then_some(self.max_connections)
    }
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            send_timeout_ms: default_send_timeout_ms(),
            idle_timeout_secs: None,
            max_connections: default_hub_max_connections(),
            echo_to_sender: default_echo_to_sender(),
        }
    }
}

/// Login gateway configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginConfig {
    /// Register unknown usernames on login instead of rejecting them
    #[serde(default)]
    pub auto_register: bool,
}

/// CORS configuration
///
/// The same list restricts the `Origin` of WebSocket upgrades.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    /// Check an `Origin` header value against the allow-list
    ///
    /// An empty list allows every origin.
    #[must_use]
    pub fn allows(&self, origin: Option<&str>) -> bool {
        if self.allowed_origins.is_empty() {
            return true;
        }
        origin.is_some_and(|origin| self.allowed_origins.iter().any(|o| o == origin))
    }

    /// Check the `Origin` of a WebSocket upgrade
    ///
    /// A configured list behaves like `allows`. Without one, `same_origin_only`
    /// restricts browsers to the page's own host, which is what the HTTP CORS
    /// layer enforces in production. Requests without `Origin` are not from a
    /// browser and pass.
    #[must_use]
    pub fn allows_upgrade(
        &self,
        origin: Option<&str>,
        host: Option<&str>,
        same_origin_only: bool,
    ) -> bool {
        if !self.allowed_origins.is_empty() {
            return self.allows(origin);
        }
        if !same_origin_only {
            return true;
        }
        match origin {
            None => true,
            Some(origin) => {
                host.is_some_and(|host| origin_host(origin).eq_ignore_ascii_case(host))
            }
        }
    }
}

/// Strip the scheme from an `Origin` value
fn origin_host(origin: &str) -> &str {
    origin
        .split_once("://")
        .map_or(origin, |(_, rest)| rest)
        .trim_end_matches('/')
}

/// Static asset configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StaticConfig {
    #[serde(default = "default_static_dir")]
    pub dir: String,
}

// Default value functions
fn default_app_name() -> String {
    "relay".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_database_url() -> String {
    "sqlite://chat.db?mode=rwc".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_send_timeout_ms() -> u64 {
    2000
}

fn default_hub_max_connections() -> usize {
    1024
}

fn default_echo_to_sender() -> bool {
    true
}

fn default_static_dir() -> String {
    "public".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSettings {
                name: default_app_name(),
                env: default_env(),
            },
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
            },
            database: DatabaseConfig {
                url: default_database_url(),
                max_connections: default_max_connections(),
            },
            hub: HubSettings::default(),
            login: LoginConfig::default(),
            cors: CorsConfig::default(),
            static_files: StaticConfig {
                dir: default_static_dir(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is set to a value that cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Unset variables fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let config = Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env: parse_var(&lookup, "APP_ENV")?.unwrap_or_default(),
            },
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or_else(default_host),
                port: parse_var(&lookup, "SERVER_PORT")?.unwrap_or_else(default_port),
            },
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").unwrap_or_else(default_database_url),
                max_connections: parse_var(&lookup, "DATABASE_MAX_CONNECTIONS")?
                    .unwrap_or_else(default_max_connections),
            },
            hub: HubSettings {
                send_timeout_ms: parse_var(&lookup, "HUB_SEND_TIMEOUT_MS")?
                    .unwrap_or_else(default_send_timeout_ms),
                idle_timeout_secs: parse_var(&lookup, "HUB_IDLE_TIMEOUT_SECS")?,
                max_connections: parse_var(&lookup, "HUB_MAX_CONNECTIONS")?
                    .unwrap_or_else(default_hub_max_connections),
                echo_to_sender: parse_flag(&lookup, "HUB_ECHO_TO_SENDER")?
                    .unwrap_or_else(default_echo_to_sender),
            },
            login: LoginConfig {
                auto_register: parse_flag(&lookup, "LOGIN_AUTO_REGISTER")?.unwrap_or(false),
            },
            cors: CorsConfig {
                allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                    .map(|s| {
                        s.split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            static_files: StaticConfig {
                dir: lookup("STATIC_DIR").unwrap_or_else(default_static_dir),
            },
        };

        config.hub.validate()?;
        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&'static str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        _ => Ok(None),
    }
}

fn parse_flag<F>(lookup: &F, key: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "" => Ok(None),
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue(key, raw)),
        },
        None => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
