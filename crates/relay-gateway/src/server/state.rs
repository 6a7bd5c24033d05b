//! Gateway state
//!
//! Application state shared by all handlers.

use crate::hub::BroadcastHub;
use crate::login::LoginGateway;
use relay_common::AppConfig;
use std::sync::Arc;

/// Gateway application state
#[derive(Clone)]
pub struct GatewayState {
    /// Broadcast hub owning every live connection
    hub: Arc<BroadcastHub>,
    /// Account lookup and creation
    login: Arc<LoginGateway>,
    /// Application configuration
    config: Arc<AppConfig>,
}

impl GatewayState {
    /// Create a new gateway state
    pub fn new(hub: Arc<BroadcastHub>, login: LoginGateway, config: AppConfig) -> Self {
        Self {
            hub,
            login: Arc::new(login),
            config: Arc::new(config),
        }
    }

    /// Get the broadcast hub
    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    /// Get the login gateway
    pub fn login(&self) -> &LoginGateway {
        &self.login
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("hub", &self.hub)
            .field("login", &self.login)
            .field("config", &"AppConfig")
            .finish()
    }
}
