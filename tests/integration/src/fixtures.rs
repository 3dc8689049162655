//! Test fixtures and frame builders
//!
//! Scripted gateway frames reused across integration tests. READY frames
//! deliberately omit `resume_gateway_url` so a reconnecting client comes
//! back to the same scripted server.

use std::sync::atomic::{AtomicU64, Ordering};

use banter_gateway::protocol::{GatewayMessage, HelloPayload};
use serde_json::json;

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Hello frame with a heartbeat interval in milliseconds
pub fn hello_frame(heartbeat_interval_ms: u64) -> GatewayMessage {
    GatewayMessage::hello(HelloPayload::with_interval(heartbeat_interval_ms))
}

/// READY dispatch establishing a session
pub fn ready_frame(session_id: &str, seq: u64, user_id: i64, guild_ids: &[i64]) -> GatewayMessage {
    let guilds: Vec<_> = guild_ids
        .iter()
        .map(|id| json!({"id": id.to_string(), "name": format!("guild-{id}")}))
        .collect();

    GatewayMessage::dispatch(
        "READY",
        seq,
        json!({
            "v": 10,
            "user": {
                "id": user_id.to_string(),
                "username": format!("bot-{user_id}"),
                "bot": true,
            },
            "guilds": guilds,
            "session_id": session_id,
        }),
    )
}

/// RESUMED dispatch acknowledging a successful resume
pub fn resumed_frame(seq: u64) -> GatewayMessage {
    GatewayMessage::dispatch("RESUMED", seq, json!({}))
}

/// MESSAGE_CREATE dispatch with a unique message ID
pub fn message_frame(seq: u64, channel_id: i64, content: &str) -> GatewayMessage {
    GatewayMessage::dispatch(
        "MESSAGE_CREATE",
        seq,
        json!({
            "id": unique_suffix().to_string(),
            "channel_id": channel_id.to_string(),
            "author": {"id": "900", "username": "someone"},
            "content": content,
        }),
    )
}

/// GUILD_CREATE dispatch
pub fn guild_frame(seq: u64, guild_id: i64, name: &str) -> GatewayMessage {
    GatewayMessage::dispatch(
        "GUILD_CREATE",
        seq,
        json!({"id": guild_id.to_string(), "name": name}),
    )
}
