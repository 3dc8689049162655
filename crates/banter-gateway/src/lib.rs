//! # banter-gateway
//!
//! Client side of the WebSocket gateway: protocol frames, the connection
//! state machine with resume and reconnect, and typed event dispatch.

pub mod connection;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod protocol;
