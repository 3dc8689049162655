//! Gateway protocol definitions
//!
//! The wire format spoken over the WebSocket: op codes, the frame envelope,
//! handshake payloads, and close codes with their reconnect classification.

mod close_codes;
mod messages;
mod opcodes;
mod payloads;

pub use close_codes::CloseCode;
pub use messages::GatewayMessage;
pub use opcodes::OpCode;
pub use payloads::{
    HelloPayload, IdentifyPayload, IdentifyProperties, PresenceUpdatePayload, ResumePayload,
};
