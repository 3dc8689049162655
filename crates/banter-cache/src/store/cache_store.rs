//! Arena-style entity cache
//!
//! Uses `DashMap` so the gateway receive loop can write while handler tasks
//! read concurrently.

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;

use banter_core::{Channel, CurrentUser, Guild, Message, Snowflake, User};

/// Cache tuning knobs
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Per-channel message history cap; 0 disables message caching
    pub messages_per_channel: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            messages_per_channel: 100,
        }
    }
}

/// Current-state snapshots of remote entities, keyed by snowflake ID
///
/// `upsert_*` returns the previous snapshot (for before/after diffs),
/// `remove_*` returns the removed snapshot, and `get_*` never fails -
/// absence is `None`.
pub struct CacheStore {
    config: CacheConfig,

    /// Account the client is logged in as
    current_user: RwLock<Option<CurrentUser>>,

    /// Users by ID
    users: DashMap<Snowflake, User>,

    /// Guilds by ID
    guilds: DashMap<Snowflake, Guild>,

    /// Channels by ID (guild channels and DMs share one namespace)
    channels: DashMap<Snowflake, Channel>,

    /// Messages by ID
    messages: DashMap<Snowflake, Message>,

    /// Per-channel message IDs in arrival order, oldest first
    channel_messages: DashMap<Snowflake, VecDeque<Snowflake>>,
}

impl CacheStore {
    /// Create a new cache store
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            current_user: RwLock::new(None),
            users: DashMap::new(),
            guilds: DashMap::new(),
            channels: DashMap::new(),
            messages: DashMap::new(),
            channel_messages: DashMap::new(),
        }
    }

    /// Create a new cache store wrapped in Arc
    #[must_use]
    pub fn new_shared(config: CacheConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    // ------------------------------------------------------------------
    // Current user
    // ------------------------------------------------------------------

    /// Store the logged-in account snapshot
    pub fn set_current_user(&self, user: CurrentUser) {
        *self.current_user.write() = Some(user);
    }

    /// Get the logged-in account snapshot, if a session has been established
    pub fn current_user(&self) -> Option<CurrentUser> {
        self.current_user.read().clone()
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Insert or overwrite a user, returning the previous snapshot
    pub fn upsert_user(&self, user: User) -> Option<User> {
        self.users.insert(user.id, user)
    }

    /// Remove a user by ID
    pub fn remove_user(&self, id: Snowflake) -> Option<User> {
        self.users.remove(&id).map(|(_, user)| user)
    }

    /// Look up a user by ID
    pub fn get_user(&self, id: Snowflake) -> Option<User> {
        self.users.get(&id).map(|r| r.clone())
    }

    /// Snapshot of all cached users
    pub fn users(&self) -> Vec<User> {
        self.users.iter().map(|r| r.clone()).collect()
    }

    /// Number of cached users
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    // ------------------------------------------------------------------
    // Guilds
    // ------------------------------------------------------------------

    /// Insert or overwrite a guild, returning the previous snapshot
    pub fn upsert_guild(&self, guild: Guild) -> Option<Guild> {
        self.guilds.insert(guild.id, guild)
    }

    /// Remove a guild by ID
    pub fn remove_guild(&self, id: Snowflake) -> Option<Guild> {
        self.guilds.remove(&id).map(|(_, guild)| guild)
    }

    /// Look up a guild by ID
    pub fn get_guild(&self, id: Snowflake) -> Option<Guild> {
        self.guilds.get(&id).map(|r| r.clone())
    }

    /// Snapshot of all cached guilds
    pub fn guilds(&self) -> Vec<Guild> {
        self.guilds.iter().map(|r| r.clone()).collect()
    }

    /// Number of cached guilds
    pub fn guild_count(&self) -> usize {
        self.guilds.len()
    }

    // ------------------------------------------------------------------
    // Channels
    // ------------------------------------------------------------------

    /// Insert or overwrite a channel, returning the previous snapshot
    pub fn upsert_channel(&self, channel: Channel) -> Option<Channel> {
        self.channels.insert(channel.id, channel)
    }

    /// Remove a channel by ID, dropping its cached message history
    pub fn remove_channel(&self, id: Snowflake) -> Option<Channel> {
        let removed = self.channels.remove(&id).map(|(_, channel)| channel);

        if removed.is_some() {
            if let Some((_, order)) = self.channel_messages.remove(&id) {
                for message_id in order {
                    self.messages.remove(&message_id);
                }
            }
        }

        removed
    }

    /// Look up a channel by ID
    pub fn get_channel(&self, id: Snowflake) -> Option<Channel> {
        self.channels.get(&id).map(|r| r.clone())
    }

    /// Snapshot of all cached channels
    pub fn channels(&self) -> Vec<Channel> {
        self.channels.iter().map(|r| r.clone()).collect()
    }

    /// Snapshot of cached DM channels
    pub fn dm_channels(&self) -> Vec<Channel> {
        self.channels
            .iter()
            .filter(|r| r.is_dm())
            .map(|r| r.clone())
            .collect()
    }

    /// Snapshot of cached channels belonging to a guild
    pub fn guild_channels(&self, guild_id: Snowflake) -> Vec<Channel> {
        self.channels
            .iter()
            .filter(|r| r.guild_id == Some(guild_id))
            .map(|r| r.clone())
            .collect()
    }

    /// Number of cached channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    /// Insert or overwrite a message, returning the previous snapshot
    ///
    /// First sightings enter the per-channel history; when the history
    /// exceeds the configured cap the oldest message of that channel is
    /// evicted. Overwrites (edits) do not re-enter the history.
    pub fn upsert_message(&self, message: Message) -> Option<Message> {
        if self.config.messages_per_channel == 0 {
            return None;
        }

        let id = message.id;
        let channel_id = message.channel_id;
        let previous = self.messages.insert(id, message);

        if previous.is_none() {
            let mut evicted = Vec::new();
            {
                let mut order = self.channel_messages.entry(channel_id).or_default();
                order.push_back(id);
                while order.len() > self.config.messages_per_channel {
                    if let Some(oldest) = order.pop_front() {
                        evicted.push(oldest);
                    }
                }
            }
            for oldest in evicted {
                self.messages.remove(&oldest);
                tracing::trace!(
                    message_id = %oldest,
                    channel_id = %channel_id,
                    "Evicted oldest cached message"
                );
            }
        }

        previous
    }

    /// Remove a message by ID
    pub fn remove_message(&self, id: Snowflake) -> Option<Message> {
        let removed = self.messages.remove(&id).map(|(_, message)| message);

        if let Some(ref message) = removed {
            self.channel_messages.alter(&message.channel_id, |_, mut order| {
                order.retain(|mid| *mid != id);
                order
            });
            self.channel_messages.retain(|_, order| !order.is_empty());
        }

        removed
    }

    /// Look up a message by ID
    pub fn get_message(&self, id: Snowflake) -> Option<Message> {
        self.messages.get(&id).map(|r| r.clone())
    }

    /// Snapshot of all cached messages
    pub fn messages(&self) -> Vec<Message> {
        self.messages.iter().map(|r| r.clone()).collect()
    }

    /// Cached history of one channel, oldest first
    pub fn channel_history(&self, channel_id: Snowflake) -> Vec<Message> {
        self.channel_messages
            .get(&channel_id)
            .map(|order| {
                order
                    .iter()
                    .filter_map(|id| self.messages.get(id).map(|r| r.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of cached messages
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    // ------------------------------------------------------------------
    // Whole-store operations
    // ------------------------------------------------------------------

    /// Empty every map, including the current user
    pub fn clear(&self) {
        *self.current_user.write() = None;
        self.users.clear();
        self.guilds.clear();
        self.channels.clear();
        self.messages.clear();
        self.channel_messages.clear();
        tracing::debug!("Cache cleared");
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("users", &self.users.len())
            .field("guilds", &self.guilds.len())
            .field("channels", &self.channels.len())
            .field("messages", &self.messages.len())
            .finish()
    }
}
