//! Application error types
//!
//! The error surface callers of the client see. Internal layers (gateway,
//! REST) have their own error enums and convert into this one at the facade
//! boundary.

use std::fmt;

use crate::config::ConfigError;

/// Client-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Authentication errors - fatal, never retried
    #[error("Authentication failed: the token was rejected")]
    AuthenticationFailed,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    // Lifecycle errors
    #[error("Client is already connected")]
    AlreadyConnected,

    #[error("Client is not connected")]
    NotConnected,

    // Registration errors
    #[error("Unknown gateway event: {0}")]
    UnknownEvent(String),

    // Waiter errors
    #[error("Timed out waiting for a matching event")]
    WaitTimeout,

    // Gateway errors that escaped the reconnect loop
    #[error("Gateway error: {0}")]
    Gateway(String),

    // REST seam errors
    #[error("REST error: {0}")]
    Rest(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    // Internal errors
    #[error("Internal client error")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    /// Check if this error is terminal: no reconnect can recover it
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed | Self::InvalidToken(_) | Self::Config(_)
        )
    }

    /// Get error code for structured logging
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "AUTHENTICATION_FAILED",
            Self::InvalidToken(_) => "INVALID_TOKEN",
            Self::AlreadyConnected => "ALREADY_CONNECTED",
            Self::NotConnected => "NOT_CONNECTED",
            Self::UnknownEvent(_) => "UNKNOWN_EVENT",
            Self::WaitTimeout => "WAIT_TIMEOUT",
            Self::Gateway(_) => "GATEWAY_ERROR",
            Self::Rest(_) => "REST_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Create an unknown-event registration error
    #[must_use]
    pub fn unknown_event(name: impl fmt::Display) -> Self {
        Self::UnknownEvent(name.to_string())
    }

    /// Create a gateway error from any displayable cause
    #[must_use]
    pub fn gateway(msg: impl fmt::Display) -> Self {
        Self::Gateway(msg.to_string())
    }

    /// Create a REST error from any displayable cause
    #[must_use]
    pub fn rest(msg: impl fmt::Display) -> Self {
        Self::Rest(msg.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Result type alias for client operations
pub type AppResult<T> = Result<T, AppError>;
