//! Connection state
//!
//! Lifecycle of the gateway link as seen by callers.

use serde::{Deserialize, Serialize};

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No connection and none in progress
    Disconnected,
    /// Socket dial and Hello handshake in progress
    Connecting,
    /// Identify or Resume sent, waiting for Ready or Resumed
    Identifying,
    /// Session established; events are flowing
    Connected,
    /// Connection lost; waiting out the backoff delay
    Reconnecting,
}

impl ConnectionState {
    /// Human-readable name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::Identifying => "Identifying",
            Self::Connected => "Connected",
            Self::Reconnecting => "Reconnecting",
        }
    }

    /// Whether a session is established
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::Disconnected
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
