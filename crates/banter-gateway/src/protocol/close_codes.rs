//! WebSocket close codes
//!
//! Application close codes the gateway sends when it terminates a
//! connection, with the classification the reconnect loop acts on.

use serde::{Deserialize, Serialize};

/// Gateway WebSocket close codes
///
/// Codes in the 4000 range are application codes; 1000/1001 clean closes
/// and missing close frames are classified by the connection runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum CloseCode {
    /// Unknown error, try resuming
    UnknownError = 4000,
    /// We sent an invalid opcode
    UnknownOpcode = 4001,
    /// We sent a payload the gateway could not decode
    DecodeError = 4002,
    /// We sent a payload before identifying
    NotAuthenticated = 4003,
    /// The token was rejected
    AuthenticationFailed = 4004,
    /// We sent Identify twice on one connection
    AlreadyAuthenticated = 4005,
    /// The sequence sent with Resume was invalid
    InvalidSeq = 4007,
    /// We sent payloads too quickly
    RateLimited = 4008,
    /// The session timed out
    SessionTimeout = 4009,
    /// We requested an unsupported API version
    InvalidApiVersion = 4012,
}

impl CloseCode {
    /// Create a `CloseCode` from a raw u16 value
    #[must_use]
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            4000 => Some(Self::UnknownError),
            4001 => Some(Self::UnknownOpcode),
            4002 => Some(Self::DecodeError),
            4003 => Some(Self::NotAuthenticated),
            4004 => Some(Self::AuthenticationFailed),
            4005 => Some(Self::AlreadyAuthenticated),
            4007 => Some(Self::InvalidSeq),
            4008 => Some(Self::RateLimited),
            4009 => Some(Self::SessionTimeout),
            4012 => Some(Self::InvalidApiVersion),
            _ => None,
        }
    }

    /// Get the raw u16 value
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Check if this close code ends the connection for good
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::AuthenticationFailed)
    }

    /// Check if this close code makes the held session unusable
    ///
    /// After these the client must reconnect with a fresh Identify rather
    /// than a Resume.
    #[must_use]
    pub const fn invalidates_session(self) -> bool {
        matches!(
            self,
            Self::InvalidSeq | Self::SessionTimeout | Self::InvalidApiVersion
        )
    }

    /// Check if the session may be resumed after this close code
    #[must_use]
    pub const fn can_resume(self) -> bool {
        !self.is_fatal() && !self.invalidates_session()
    }

    /// Get the description for this close code
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::UnknownError => "Unknown error occurred",
            Self::UnknownOpcode => "Invalid opcode sent",
            Self::DecodeError => "Invalid payload encoding",
            Self::NotAuthenticated => "Not authenticated",
            Self::AuthenticationFailed => "Authentication failed",
            Self::AlreadyAuthenticated => "Already authenticated",
            Self::InvalidSeq => "Invalid resume sequence number",
            Self::RateLimited => "Rate limited",
            Self::SessionTimeout => "Session timeout",
            Self::InvalidApiVersion => "Invalid API version",
        }
    }

    /// Get the name of this close code
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UnknownError => "UnknownError",
            Self::UnknownOpcode => "UnknownOpcode",
            Self::DecodeError => "DecodeError",
            Self::NotAuthenticated => "NotAuthenticated",
            Self::AuthenticationFailed => "AuthenticationFailed",
            Self::AlreadyAuthenticated => "AlreadyAuthenticated",
            Self::InvalidSeq => "InvalidSeq",
            Self::RateLimited => "RateLimited",
            Self::SessionTimeout => "SessionTimeout",
            Self::InvalidApiVersion => "InvalidApiVersion",
        }
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.as_u16(), self.description())
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.as_u16()
    }
}
