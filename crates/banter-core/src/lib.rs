//! # banter-core
//!
//! Domain layer containing entities and value objects shared by the gateway,
//! cache, and client crates. This crate has zero dependencies on network or
//! runtime infrastructure.

pub mod entities;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{Channel, ChannelType, CurrentUser, Guild, Message, User};
pub use value_objects::{Intents, Snowflake, SnowflakeParseError};
