//! Hub configuration

use relay_common::HubSettings;
use relay_core::ConnectionId;
use std::time::Duration;

/// Whether a frame is relayed back to the connection that sent it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EchoPolicy {
    /// Every member receives the frame, sender included
    #[default]
    IncludeSender,
    /// Every member except the sender receives the frame
    ExcludeSender,
}

impl EchoPolicy {
    /// Build the policy from an "echo to sender" flag
    pub fn from_flag(echo_to_sender: bool) -> Self {
        if echo_to_sender {
            Self::IncludeSender
        } else {
            Self::ExcludeSender
        }
    }

    /// Check if `recipient` should get a frame sent by `sender`
    pub fn delivers_to(self, recipient: &ConnectionId, sender: Option<&ConnectionId>) -> bool {
        match self {
            Self::IncludeSender => true,
            Self::ExcludeSender => sender != Some(recipient),
        }
    }
}

/// Broadcast hub configuration
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Write deadline for each handle created by the hub
    pub send_timeout: Duration,
    /// Close connections that send nothing for this long
    pub idle_timeout: Option<Duration>,
    /// Maximum number of registered connections
    pub max_connections: Option<usize>,
    /// Echo policy for fan-out
    pub echo: EchoPolicy,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            send_timeout: Duration::from_secs(2),
            idle_timeout: None,
            max_connections: Some(1024),
            echo: EchoPolicy::IncludeSender,
        }
    }
}

impl HubConfig {
    /// Set the write deadline
    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    /// Set the idle timeout
    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Set the connection limit (`None` = unbounded)
    pub fn with_max_connections(mut self, max_connections: Option<usize>) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Set the echo policy
    pub fn with_echo(mut self, echo: EchoPolicy) -> Self {
        self.echo = echo;
        self
    }
}

impl From<&HubSettings> for HubConfig {
    fn from(settings: &HubSettings) -> Self {
        Self {
            send_timeout: settings.send_timeout(),
            idle_timeout: settings.idle_timeout(),
            max_connections: settings.connection_limit(),
            echo: EchoPolicy::from_flag(settings.echo_to_sender),
        }
    }
}
