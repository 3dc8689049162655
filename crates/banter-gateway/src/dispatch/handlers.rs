//! Built-in bookkeeping handlers
//!
//! The finite dispatch table: one arm per recognized event, decoding the
//! raw payload and applying its cache mutation. Upserts capture the
//! previous snapshot so diff events carry before/after pairs; removals
//! capture the removed value.

use banter_cache::CacheStore;
use banter_core::{Channel, CurrentUser, Guild, Message, Snowflake, User};
use serde::Deserialize;
use serde_json::Value;

use crate::error::GatewayError;
use crate::events::{Event, EventType, MemberEvent, PresenceEvent, ReactionEvent, ReadyData};

/// GUILD_CREATE wire payload: a guild with its channels embedded
#[derive(Debug, Deserialize)]
struct GuildCreateData {
    #[serde(flatten)]
    guild: Guild,
    #[serde(default)]
    channels: Vec<Channel>,
}

/// GUILD_DELETE wire payload
#[derive(Debug, Deserialize)]
struct GuildDeleteData {
    id: Snowflake,
    #[serde(default)]
    unavailable: bool,
}

/// MESSAGE_DELETE wire payload
#[derive(Debug, Deserialize)]
struct MessageDeleteData {
    id: Snowflake,
    channel_id: Snowflake,
}

/// TYPING_START wire payload
#[derive(Debug, Deserialize)]
struct TypingStartData {
    channel_id: Snowflake,
    #[serde(default)]
    guild_id: Option<Snowflake>,
    user_id: Snowflake,
    timestamp: i64,
}

/// Decode a dispatch payload and apply its cache bookkeeping
///
/// Returns the typed event handed to waiters and listeners. A decode
/// failure means the frame was malformed; the caller logs it and moves on.
pub(crate) fn apply(
    cache: &CacheStore,
    event_type: EventType,
    data: Value,
) -> Result<Event, GatewayError> {
    match event_type {
        EventType::Ready => {
            let ready: ReadyData = serde_json::from_value(data)?;
            cache.set_current_user(ready.user.clone());
            for guild in &ready.guilds {
                cache.upsert_guild(guild.clone());
            }
            Ok(Event::Ready(ready))
        }
        EventType::Resumed => Ok(Event::Resumed),

        EventType::GuildCreate => {
            let payload: GuildCreateData = serde_json::from_value(data)?;
            cache.upsert_guild(payload.guild.clone());
            for channel in payload.channels {
                cache.upsert_channel(channel);
            }
            Ok(Event::GuildCreate(payload.guild))
        }
        EventType::GuildUpdate => {
            let after: Guild = serde_json::from_value(data)?;
            let before = cache.upsert_guild(after.clone());
            Ok(Event::GuildUpdate { before, after })
        }
        EventType::GuildDelete => {
            let payload: GuildDeleteData = serde_json::from_value(data)?;
            let guild = cache.remove_guild(payload.id);
            Ok(Event::GuildDelete {
                id: payload.id,
                unavailable: payload.unavailable,
                guild,
            })
        }

        EventType::ChannelCreate => {
            let channel: Channel = serde_json::from_value(data)?;
            cache.upsert_channel(channel.clone());
            Ok(Event::ChannelCreate(channel))
        }
        EventType::ChannelUpdate => {
            let after: Channel = serde_json::from_value(data)?;
            let before = cache.upsert_channel(after.clone());
            Ok(Event::ChannelUpdate { before, after })
        }
        EventType::ChannelDelete => {
            let channel: Channel = serde_json::from_value(data)?;
            cache.remove_channel(channel.id);
            Ok(Event::ChannelDelete(channel))
        }

        EventType::MessageCreate => {
            let message: Message = serde_json::from_value(data)?;
            if let Some(author) = &message.author {
                cache.upsert_user(author.clone());
            }
            cache.upsert_message(message.clone());
            Ok(Event::MessageCreate(message))
        }
        EventType::MessageUpdate => {
            // Last write wins: the payload replaces the cached copy wholesale
            let after: Message = serde_json::from_value(data)?;
            let before = cache.upsert_message(after.clone());
            Ok(Event::MessageUpdate { before, after })
        }
        EventType::MessageDelete => {
            let payload: MessageDeleteData = serde_json::from_value(data)?;
            let message = cache.remove_message(payload.id);
            Ok(Event::MessageDelete {
                id: payload.id,
                channel_id: payload.channel_id,
                message,
            })
        }

        EventType::MessageReactionAdd => {
            let reaction: ReactionEvent = serde_json::from_value(data)?;
            Ok(Event::MessageReactionAdd(reaction))
        }
        EventType::MessageReactionRemove => {
            let reaction: ReactionEvent = serde_json::from_value(data)?;
            Ok(Event::MessageReactionRemove(reaction))
        }

        EventType::GuildMemberAdd => {
            let member: MemberEvent = serde_json::from_value(data)?;
            cache.upsert_user(member.user.clone());
            Ok(Event::GuildMemberAdd(member))
        }
        EventType::GuildMemberRemove => {
            let member: MemberEvent = serde_json::from_value(data)?;
            Ok(Event::GuildMemberRemove(member))
        }

        EventType::PresenceUpdate => {
            let presence: PresenceEvent = serde_json::from_value(data)?;
            Ok(Event::PresenceUpdate(presence))
        }
        EventType::TypingStart => {
            let typing: TypingStartData = serde_json::from_value(data)?;
            Ok(Event::TypingStart {
                channel_id: typing.channel_id,
                guild_id: typing.guild_id,
                user_id: typing.user_id,
                timestamp: typing.timestamp,
            })
        }

        EventType::UserUpdate => {
            let current: CurrentUser = serde_json::from_value(data)?;
            let before = cache.current_user().map(User::from);
            cache.set_current_user(current.clone());
            let after = User::from(current);
            cache.upsert_user(after.clone());
            Ok(Event::UserUpdate { before, after })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banter_cache::CacheConfig;
    use serde_json::json;

    fn cache() -> CacheStore {
        CacheStore::new(CacheConfig::default())
    }

    #[test]
    fn test_ready_populates_current_user_and_guilds() {
        let cache = cache();
        let event = apply(
            &cache,
            EventType::Ready,
            json!({
                "v": 10,
                "user": {"id": "1", "username": "me", "bot": true},
                "guilds": [{"id": "42", "unavailable": true}, {"id": "43", "unavailable": true}],
                "session_id": "s1"
            }),
        )
        .unwrap();

        assert!(matches!(event, Event::Ready(_)));
        assert_eq!(cache.current_user().unwrap().id, Snowflake::new(1));
        assert_eq!(cache.guild_count(), 2);
        assert!(cache.get_guild(Snowflake::new(42)).is_some());
    }

    #[test]
    fn test_guild_create_caches_embedded_channels() {
        let cache = cache();
        let event = apply(
            &cache,
            EventType::GuildCreate,
            json!({
                "id": "42",
                "name": "Test Guild",
                "channels": [
                    {"id": "100", "type": 0, "guild_id": "42", "name": "general"},
                    {"id": "101", "type": 2, "guild_id": "42", "name": "voice"}
                ]
            }),
        )
        .unwrap();

        match event {
            Event::GuildCreate(guild) => assert_eq!(guild.name, "Test Guild"),
            other => panic!("expected GuildCreate, got {other:?}"),
        }
        assert_eq!(cache.channel_count(), 2);
        assert_eq!(cache.guild_channels(Snowflake::new(42)).len(), 2);
    }

    #[test]
    fn test_guild_update_captures_before() {
        let cache = cache();
        apply(&cache, EventType::GuildCreate, json!({"id": "42", "name": "Old"})).unwrap();

        let event = apply(
            &cache,
            EventType::GuildUpdate,
            json!({"id": "42", "name": "New"}),
        )
        .unwrap();

        match event {
            Event::GuildUpdate { before, after } => {
                assert_eq!(before.unwrap().name, "Old");
                assert_eq!(after.name, "New");
            }
            other => panic!("expected GuildUpdate, got {other:?}"),
        }
    }

    #[test]
    fn test_guild_delete_returns_removed_snapshot() {
        let cache = cache();
        apply(&cache, EventType::GuildCreate, json!({"id": "42", "name": "Doomed"})).unwrap();

        let event = apply(
            &cache,
            EventType::GuildDelete,
            json!({"id": "42", "unavailable": false}),
        )
        .unwrap();

        match event {
            Event::GuildDelete { id, unavailable, guild } => {
                assert_eq!(id, Snowflake::new(42));
                assert!(!unavailable);
                assert_eq!(guild.unwrap().name, "Doomed");
            }
            other => panic!("expected GuildDelete, got {other:?}"),
        }
        assert_eq!(cache.guild_count(), 0);
    }

    #[test]
    fn test_message_create_caches_message_and_author() {
        let cache = cache();
        let event = apply(
            &cache,
            EventType::MessageCreate,
            json!({
                "id": "555",
                "channel_id": "10",
                "author": {"id": "7", "username": "alice"},
                "content": "hi"
            }),
        )
        .unwrap();

        assert!(matches!(event, Event::MessageCreate(_)));
        assert!(cache.get_message(Snowflake::new(555)).is_some());
        assert_eq!(cache.get_user(Snowflake::new(7)).unwrap().username, "alice");
        assert_eq!(cache.channel_history(Snowflake::new(10)).len(), 1);
    }

    #[test]
    fn test_message_update_is_last_write_wins() {
        let cache = cache();
        apply(
            &cache,
            EventType::MessageCreate,
            json!({
                "id": "555",
                "channel_id": "10",
                "author": {"id": "7", "username": "alice"},
                "content": "original"
            }),
        )
        .unwrap();

        // Edits arrive as partial payloads; the cached copy is replaced, not merged
        let event = apply(
            &cache,
            EventType::MessageUpdate,
            json!({"id": "555", "channel_id": "10", "content": "edited"}),
        )
        .unwrap();

        match event {
            Event::MessageUpdate { before, after } => {
                assert_eq!(before.unwrap().content, "original");
                assert_eq!(after.content, "edited");
                assert!(after.author.is_none());
            }
            other => panic!("expected MessageUpdate, got {other:?}"),
        }
        let cached = cache.get_message(Snowflake::new(555)).unwrap();
        assert_eq!(cached.content, "edited");
        assert!(cached.author.is_none());
    }

    #[test]
    fn test_message_delete_returns_removed_snapshot() {
        let cache = cache();
        apply(
            &cache,
            EventType::MessageCreate,
            json!({"id": "555", "channel_id": "10", "content": "bye"}),
        )
        .unwrap();

        let event = apply(
            &cache,
            EventType::MessageDelete,
            json!({"id": "555", "channel_id": "10"}),
        )
        .unwrap();

        match event {
            Event::MessageDelete { id, channel_id, message } => {
                assert_eq!(id, Snowflake::new(555));
                assert_eq!(channel_id, Snowflake::new(10));
                assert_eq!(message.unwrap().content, "bye");
            }
            other => panic!("expected MessageDelete, got {other:?}"),
        }
        assert!(cache.channel_history(Snowflake::new(10)).is_empty());
    }

    #[test]
    fn test_delete_of_uncached_message_yields_none() {
        let cache = cache();
        let event = apply(
            &cache,
            EventType::MessageDelete,
            json!({"id": "999", "channel_id": "10"}),
        )
        .unwrap();

        match event {
            Event::MessageDelete { message, .. } => assert!(message.is_none()),
            other => panic!("expected MessageDelete, got {other:?}"),
        }
    }

    #[test]
    fn test_channel_delete_purges_cache() {
        let cache = cache();
        apply(
            &cache,
            EventType::ChannelCreate,
            json!({"id": "100", "type": 0, "name": "general"}),
        )
        .unwrap();
        apply(
            &cache,
            EventType::MessageCreate,
            json!({"id": "1", "channel_id": "100", "content": "x"}),
        )
        .unwrap();

        apply(
            &cache,
            EventType::ChannelDelete,
            json!({"id": "100", "type": 0, "name": "general"}),
        )
        .unwrap();

        assert_eq!(cache.channel_count(), 0);
        assert!(cache.get_message(Snowflake::new(1)).is_none());
    }

    #[test]
    fn test_member_add_caches_user() {
        let cache = cache();
        let event = apply(
            &cache,
            EventType::GuildMemberAdd,
            json!({"guild_id": "42", "user": {"id": "8", "username": "bob"}}),
        )
        .unwrap();

        assert!(matches!(event, Event::GuildMemberAdd(_)));
        assert_eq!(cache.get_user(Snowflake::new(8)).unwrap().username, "bob");
    }

    #[test]
    fn test_user_update_swaps_current_user() {
        let cache = cache();
        apply(
            &cache,
            EventType::Ready,
            json!({"user": {"id": "1", "username": "old-name"}, "session_id": "s"}),
        )
        .unwrap();

        let event = apply(
            &cache,
            EventType::UserUpdate,
            json!({"id": "1", "username": "new-name"}),
        )
        .unwrap();

        match event {
            Event::UserUpdate { before, after } => {
                assert_eq!(before.unwrap().username, "old-name");
                assert_eq!(after.username, "new-name");
            }
            other => panic!("expected UserUpdate, got {other:?}"),
        }
        assert_eq!(cache.current_user().unwrap().username, "new-name");
    }

    #[test]
    fn test_typing_start_decodes_inline_fields() {
        let cache = cache();
        let event = apply(
            &cache,
            EventType::TypingStart,
            json!({"channel_id": "10", "user_id": "7", "timestamp": 1700000000}),
        )
        .unwrap();

        match event {
            Event::TypingStart { channel_id, guild_id, user_id, timestamp } => {
                assert_eq!(channel_id, Snowflake::new(10));
                assert!(guild_id.is_none());
                assert_eq!(user_id, Snowflake::new(7));
                assert_eq!(timestamp, 1_700_000_000);
            }
            other => panic!("expected TypingStart, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_payload_is_an_error() {
        let cache = cache();
        let result = apply(&cache, EventType::MessageCreate, json!({"content": "no ids"}));
        assert!(matches!(result, Err(GatewayError::Decode(_))));

        let result = apply(&cache, EventType::Ready, json!("not an object"));
        assert!(result.is_err());
    }
}
