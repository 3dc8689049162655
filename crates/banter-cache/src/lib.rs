//! # banter-cache
//!
//! In-memory cache of the entities the gateway reports: users, guilds,
//! channels, and a bounded per-channel message history.
//!
//! The store is arena-style: every entity is addressed by its snowflake ID,
//! a later snapshot for the same ID replaces the cached one wholesale
//! (last-write-wins, no merge), and relationships are resolved by ID lookup
//! rather than references between entries.
//!
//! Writes come from the single gateway receive loop; reads may happen
//! concurrently from any handler task and tolerate slightly stale snapshots.

pub mod store;

pub use store::{CacheConfig, CacheStore};
