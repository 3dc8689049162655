//! Gateway events
//!
//! The recognized dispatch event names and the typed event enum handed to
//! listeners and waiters.

mod event;
mod event_types;

pub use event::{Event, MemberEvent, PresenceEvent, ReactionEvent, ReadyData, UserRef};
pub use event_types::EventType;
