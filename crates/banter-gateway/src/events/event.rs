//! Typed events
//!
//! The decoded event enum handed to listeners and waiters. Diff-style
//! variants carry the previous cached snapshot next to the new value; the
//! snapshots are captured by the built-in bookkeeping handlers as they
//! mutate the cache, so `before` is `None` for entities never seen.

use banter_core::{Channel, CurrentUser, Guild, Message, Snowflake, User};
use serde::{Deserialize, Serialize};

use super::EventType;

/// A decoded gateway event
#[derive(Debug, Clone)]
pub enum Event {
    /// Session established; carries the initial state snapshot
    Ready(ReadyData),
    /// Session resumed after a reconnect
    Resumed,

    /// Guild became available, was joined, or was created
    GuildCreate(Guild),
    /// Guild settings changed
    GuildUpdate {
        before: Option<Guild>,
        after: Guild,
    },
    /// Guild removed; `guild` is the last cached snapshot if any
    GuildDelete {
        id: Snowflake,
        unavailable: bool,
        guild: Option<Guild>,
    },

    /// Channel created
    ChannelCreate(Channel),
    /// Channel updated
    ChannelUpdate {
        before: Option<Channel>,
        after: Channel,
    },
    /// Channel deleted
    ChannelDelete(Channel),

    /// New message
    MessageCreate(Message),
    /// Message edited; `before` is the last cached snapshot if any
    MessageUpdate {
        before: Option<Message>,
        after: Message,
    },
    /// Message deleted; `message` is the last cached snapshot if any
    MessageDelete {
        id: Snowflake,
        channel_id: Snowflake,
        message: Option<Message>,
    },

    /// Reaction added to a message
    MessageReactionAdd(ReactionEvent),
    /// Reaction removed from a message
    MessageReactionRemove(ReactionEvent),

    /// User joined a guild
    GuildMemberAdd(MemberEvent),
    /// User left a guild
    GuildMemberRemove(MemberEvent),

    /// A user's presence changed
    PresenceUpdate(PresenceEvent),
    /// A user started typing
    TypingStart {
        channel_id: Snowflake,
        guild_id: Option<Snowflake>,
        user_id: Snowflake,
        timestamp: i64,
    },

    /// The logged-in account was updated
    UserUpdate {
        before: Option<User>,
        after: User,
    },
}

impl Event {
    /// The event type this variant corresponds to
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::Ready(_) => EventType::Ready,
            Self::Resumed => EventType::Resumed,
            Self::GuildCreate(_) => EventType::GuildCreate,
            Self::GuildUpdate { .. } => EventType::GuildUpdate,
            Self::GuildDelete { .. } => EventType::GuildDelete,
            Self::ChannelCreate(_) => EventType::ChannelCreate,
            Self::ChannelUpdate { .. } => EventType::ChannelUpdate,
            Self::ChannelDelete(_) => EventType::ChannelDelete,
            Self::MessageCreate(_) => EventType::MessageCreate,
            Self::MessageUpdate { .. } => EventType::MessageUpdate,
            Self::MessageDelete { .. } => EventType::MessageDelete,
            Self::MessageReactionAdd(_) => EventType::MessageReactionAdd,
            Self::MessageReactionRemove(_) => EventType::MessageReactionRemove,
            Self::GuildMemberAdd(_) => EventType::GuildMemberAdd,
            Self::GuildMemberRemove(_) => EventType::GuildMemberRemove,
            Self::PresenceUpdate(_) => EventType::PresenceUpdate,
            Self::TypingStart { .. } => EventType::TypingStart,
            Self::UserUpdate { .. } => EventType::UserUpdate,
        }
    }
}

/// READY payload: the initial session snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyData {
    /// Gateway protocol version
    #[serde(default)]
    pub v: u8,

    /// The account this session is logged in as
    pub user: CurrentUser,

    /// Guilds the account is in, possibly as unavailable stubs
    #[serde(default)]
    pub guilds: Vec<Guild>,

    /// Session ID used for resuming
    pub session_id: String,

    /// Gateway URL to reconnect to when resuming
    #[serde(default)]
    pub resume_gateway_url: Option<String>,
}

/// MESSAGE_REACTION_ADD / MESSAGE_REACTION_REMOVE payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionEvent {
    pub user_id: Snowflake,
    pub channel_id: Snowflake,
    pub message_id: Snowflake,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    pub emoji: String,
}

/// GUILD_MEMBER_ADD / GUILD_MEMBER_REMOVE payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberEvent {
    pub guild_id: Snowflake,
    pub user: User,
}

/// PRESENCE_UPDATE payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceEvent {
    pub user: UserRef,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    /// online, idle, dnd, or offline
    pub status: String,
}

/// Partial user carrying just the id
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UserRef {
    pub id: Snowflake,
}
