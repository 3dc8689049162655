//! Domain entities - typed snapshots of remote objects
//!
//! Entities are decoded straight from gateway payloads and cached by ID.
//! They are snapshots, not live handles: a later event for the same ID
//! replaces the cached value wholesale.

mod channel;
mod guild;
mod message;
mod user;

pub use channel::{Channel, ChannelType};
pub use guild::Guild;
pub use message::Message;
pub use user::{CurrentUser, User};
