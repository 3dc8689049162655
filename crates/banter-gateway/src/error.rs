//! Gateway error types
//!
//! Errors raised while establishing or driving the WebSocket connection.
//! The reconnect loop consumes most of these internally; only fatal errors
//! and errors raised after the loop has given up cross the facade boundary,
//! converted into [`AppError`].

use banter_common::error::AppError;
use tokio_tungstenite::tungstenite;

use crate::protocol::CloseCode;

/// Errors produced by the gateway connection
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The socket opened but the Hello/Identify exchange did not complete
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// The gateway rejected the token
    #[error("Authentication failed: the gateway rejected the token")]
    AuthenticationFailed,

    /// The connection closed, with the close code when a frame carried one
    #[error("Connection closed{}", .0.map_or_else(String::new, |c| format!(" (code {c})")))]
    Closed(Option<u16>),

    /// Underlying WebSocket transport error
    #[error("Transport error: {0}")]
    Transport(#[from] tungstenite::Error),

    /// A frame could not be serialized or deserialized
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The outbound channel closed while the connection was still up
    #[error("Outbound send channel closed")]
    SendChannelClosed,

    /// No Hello frame arrived within the configured window
    #[error("Timed out waiting for Hello")]
    HelloTimeout,
}

impl GatewayError {
    /// Create a handshake error from any displayable cause
    #[must_use]
    pub fn handshake(msg: impl std::fmt::Display) -> Self {
        Self::Handshake(msg.to_string())
    }

    /// Check if this error is terminal: no reconnect can recover it
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::AuthenticationFailed)
    }

    /// Get the close code associated with this error, if any
    #[must_use]
    pub fn close_code(&self) -> Option<u16> {
        match self {
            Self::Closed(code) => *code,
            Self::AuthenticationFailed => Some(CloseCode::AuthenticationFailed.as_u16()),
            _ => None,
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::AuthenticationFailed => AppError::AuthenticationFailed,
            other => AppError::gateway(other),
        }
    }
}
