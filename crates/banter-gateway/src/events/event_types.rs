//! Gateway event types
//!
//! Event names carried in the `t` field of dispatch frames. Dispatch frames
//! naming an event outside this enumeration are skipped by the receive loop.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Recognized gateway dispatch events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    // Connection events
    /// Session established after Identify
    Ready,
    /// Session re-established after Resume
    Resumed,

    // Guild events
    /// Guild available, joined, or created
    GuildCreate,
    /// Guild settings changed
    GuildUpdate,
    /// Left guild, kicked, or guild deleted
    GuildDelete,

    // Channel events
    /// Channel created
    ChannelCreate,
    /// Channel updated
    ChannelUpdate,
    /// Channel deleted
    ChannelDelete,

    // Message events
    /// New message
    MessageCreate,
    /// Message edited
    MessageUpdate,
    /// Message deleted
    MessageDelete,

    // Reaction events
    /// Reaction added
    MessageReactionAdd,
    /// Reaction removed
    MessageReactionRemove,

    // Member events
    /// User joined a guild
    GuildMemberAdd,
    /// User left a guild
    GuildMemberRemove,

    // Presence events
    /// User status changed
    PresenceUpdate,
    /// User started typing
    TypingStart,

    // User events
    /// The logged-in account was updated
    UserUpdate,
}

impl EventType {
    /// Get the wire name of the event type
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::Resumed => "RESUMED",
            Self::GuildCreate => "GUILD_CREATE",
            Self::GuildUpdate => "GUILD_UPDATE",
            Self::GuildDelete => "GUILD_DELETE",
            Self::ChannelCreate => "CHANNEL_CREATE",
            Self::ChannelUpdate => "CHANNEL_UPDATE",
            Self::ChannelDelete => "CHANNEL_DELETE",
            Self::MessageCreate => "MESSAGE_CREATE",
            Self::MessageUpdate => "MESSAGE_UPDATE",
            Self::MessageDelete => "MESSAGE_DELETE",
            Self::MessageReactionAdd => "MESSAGE_REACTION_ADD",
            Self::MessageReactionRemove => "MESSAGE_REACTION_REMOVE",
            Self::GuildMemberAdd => "GUILD_MEMBER_ADD",
            Self::GuildMemberRemove => "GUILD_MEMBER_REMOVE",
            Self::PresenceUpdate => "PRESENCE_UPDATE",
            Self::TypingStart => "TYPING_START",
            Self::UserUpdate => "USER_UPDATE",
        }
    }

    /// Parse an event type from its wire name
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "READY" => Some(Self::Ready),
            "RESUMED" => Some(Self::Resumed),
            "GUILD_CREATE" => Some(Self::GuildCreate),
            "GUILD_UPDATE" => Some(Self::GuildUpdate),
            "GUILD_DELETE" => Some(Self::GuildDelete),
            "CHANNEL_CREATE" => Some(Self::ChannelCreate),
            "CHANNEL_UPDATE" => Some(Self::ChannelUpdate),
            "CHANNEL_DELETE" => Some(Self::ChannelDelete),
            "MESSAGE_CREATE" => Some(Self::MessageCreate),
            "MESSAGE_UPDATE" => Some(Self::MessageUpdate),
            "MESSAGE_DELETE" => Some(Self::MessageDelete),
            "MESSAGE_REACTION_ADD" => Some(Self::MessageReactionAdd),
            "MESSAGE_REACTION_REMOVE" => Some(Self::MessageReactionRemove),
            "GUILD_MEMBER_ADD" => Some(Self::GuildMemberAdd),
            "GUILD_MEMBER_REMOVE" => Some(Self::GuildMemberRemove),
            "PRESENCE_UPDATE" => Some(Self::PresenceUpdate),
            "TYPING_START" => Some(Self::TypingStart),
            "USER_UPDATE" => Some(Self::UserUpdate),
            _ => None,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<EventType> for String {
    fn from(event: EventType) -> Self {
        event.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_as_str() {
        assert_eq!(EventType::Ready.as_str(), "READY");
        assert_eq!(EventType::MessageCreate.as_str(), "MESSAGE_CREATE");
        assert_eq!(EventType::MessageReactionAdd.as_str(), "MESSAGE_REACTION_ADD");
    }

    #[test]
    fn test_event_type_from_str() {
        assert_eq!(EventType::from_str("READY"), Some(EventType::Ready));
        assert_eq!(
            EventType::from_str("MESSAGE_CREATE"),
            Some(EventType::MessageCreate)
        );
        assert_eq!(EventType::from_str("TYPING_START"), Some(EventType::TypingStart));
        assert_eq!(EventType::from_str("NO_SUCH_EVENT"), None);
        assert_eq!(EventType::from_str("message_create"), None);
    }

    #[test]
    fn test_roundtrip_all_wire_names() {
        let all = [
            EventType::Ready,
            EventType::Resumed,
            EventType::GuildCreate,
            EventType::GuildUpdate,
            EventType::GuildDelete,
            EventType::ChannelCreate,
            EventType::ChannelUpdate,
            EventType::ChannelDelete,
            EventType::MessageCreate,
            EventType::MessageUpdate,
            EventType::MessageDelete,
            EventType::MessageReactionAdd,
            EventType::MessageReactionRemove,
            EventType::GuildMemberAdd,
            EventType::GuildMemberRemove,
            EventType::PresenceUpdate,
            EventType::TypingStart,
            EventType::UserUpdate,
        ];
        for event in all {
            assert_eq!(EventType::from_str(event.as_str()), Some(event));
        }
    }

    #[test]
    fn test_event_type_serialization() {
        let json = serde_json::to_string(&EventType::MessageCreate).unwrap();
        assert_eq!(json, "\"MESSAGE_CREATE\"");

        let parsed: EventType = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, EventType::MessageCreate);
    }

    #[test]
    fn test_event_type_display() {
        assert_eq!(format!("{}", EventType::Ready), "READY");
        assert_eq!(EventType::GuildMemberRemove.to_string(), "GUILD_MEMBER_REMOVE");
    }
}
