//! User entities - other users and the logged-in account

use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// A user as seen in gateway payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Snowflake,
    pub username: String,
    #[serde(default)]
    pub discriminator: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl User {
    /// Get the full tag: username#discriminator
    pub fn tag(&self) -> String {
        format!("{}#{}", self.username, self.discriminator)
    }

    /// Get avatar URL or default avatar URL
    pub fn avatar_url(&self) -> String {
        match &self.avatar {
            Some(hash) => format!("/avatars/{}/{}.png", self.id, hash),
            None => format!("/embed/avatars/{}.png", self.default_avatar_index()),
        }
    }

    /// Get default avatar index (0-4) based on discriminator
    fn default_avatar_index(&self) -> u8 {
        self.discriminator.parse::<u16>().unwrap_or(0) as u8 % 5
    }

    /// Check if this is a bot account
    #[inline]
    pub fn is_bot(&self) -> bool {
        self.bot
    }

    /// When the account was created, derived from its ID
    pub fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.id.created_at()
    }
}

/// The account this client is logged in as
///
/// Returned by the login call and by the Ready payload. Carries the bot flag
/// the facade reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: Snowflake,
    pub username: String,
    #[serde(default)]
    pub discriminator: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl CurrentUser {
    /// Get the full tag: username#discriminator
    pub fn tag(&self) -> String {
        format!("{}#{}", self.username, self.discriminator)
    }

    /// Check if the logged-in account is a bot
    #[inline]
    pub fn is_bot(&self) -> bool {
        self.bot
    }
}

impl From<CurrentUser> for User {
    fn from(current: CurrentUser) -> Self {
        Self {
            id: current.id,
            username: current.username,
            discriminator: current.discriminator,
            avatar: current.avatar,
            bot: current.bot,
        }
    }
}
