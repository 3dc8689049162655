//! Gateway operation codes
//!
//! Every frame carries one of these in its `op` field. The numbering is
//! fixed by the gateway protocol and must not be reordered.

use serde::de::{Error as DeError, Unexpected};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Gateway operation codes
///
/// Direction notes are from this client's point of view: "receive" ops
/// arrive from the gateway, "send" ops are written by us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    /// An event was dispatched to us (receive)
    Dispatch = 0,
    /// Keepalive ping carrying the last seen sequence (send, or on request)
    Heartbeat = 1,
    /// Authenticate a fresh session (send)
    Identify = 2,
    /// Update our presence status (send)
    PresenceUpdate = 3,
    /// Resume a dropped session (send)
    Resume = 4,
    /// The gateway asks us to disconnect and resume (receive)
    Reconnect = 5,
    /// Our session is invalid; `d` says whether it can be resumed (receive)
    InvalidSession = 7,
    /// First frame after connect, carries the heartbeat interval (receive)
    Hello = 10,
    /// The gateway acknowledged our heartbeat (receive)
    HeartbeatAck = 11,
}

impl OpCode {
    /// Create an `OpCode` from a raw integer value
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Dispatch),
            1 => Some(Self::Heartbeat),
            2 => Some(Self::Identify),
            3 => Some(Self::PresenceUpdate),
            4 => Some(Self::Resume),
            5 => Some(Self::Reconnect),
            7 => Some(Self::InvalidSession),
            10 => Some(Self::Hello),
            11 => Some(Self::HeartbeatAck),
            _ => None,
        }
    }

    /// Get the raw integer value
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// True for ops this client writes to the socket
    #[must_use]
    pub const fn is_send(self) -> bool {
        matches!(
            self,
            Self::Heartbeat | Self::Identify | Self::PresenceUpdate | Self::Resume
        )
    }

    /// True for ops the gateway may deliver to us
    ///
    /// Heartbeat appears on both sides: the gateway can request an
    /// immediate beat by sending op 1 itself.
    #[must_use]
    pub const fn is_receive(self) -> bool {
        matches!(
            self,
            Self::Dispatch
                | Self::Heartbeat
                | Self::Reconnect
                | Self::InvalidSession
                | Self::Hello
                | Self::HeartbeatAck
        )
    }
}

impl Serialize for OpCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for OpCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        Self::from_u8(value).ok_or_else(|| {
            D::Error::invalid_value(Unexpected::Unsigned(u64::from(value)), &"a known gateway op code")
        })
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Dispatch => "Dispatch",
            Self::Heartbeat => "Heartbeat",
            Self::Identify => "Identify",
            Self::PresenceUpdate => "PresenceUpdate",
            Self::Resume => "Resume",
            Self::Reconnect => "Reconnect",
            Self::InvalidSession => "InvalidSession",
            Self::Hello => "Hello",
            Self::HeartbeatAck => "HeartbeatAck",
        };
        write!(f, "{} ({})", name, self.as_u8())
    }
}
