//! Handshake payload definitions
//!
//! Payload bodies carried in the `d` field of non-dispatch frames: the
//! inbound Hello and the outbound Identify, Resume, and Presence Update.

use banter_core::Intents;
use serde::{Deserialize, Serialize};

/// Payload for op 10 (Hello)
///
/// First frame the gateway sends after the socket opens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval: u64,
}

impl HelloPayload {
    /// Heartbeat interval assumed when none was negotiated (45 seconds)
    pub const DEFAULT_HEARTBEAT_INTERVAL: u64 = 45_000;

    /// Create a Hello payload with the default interval
    #[must_use]
    pub fn new() -> Self {
        Self {
            heartbeat_interval: Self::DEFAULT_HEARTBEAT_INTERVAL,
        }
    }

    /// Create a Hello payload with a custom interval
    #[must_use]
    pub fn with_interval(heartbeat_interval: u64) -> Self {
        Self { heartbeat_interval }
    }
}

impl Default for HelloPayload {
    fn default() -> Self {
        Self::new()
    }
}

/// Payload for op 2 (Identify)
///
/// Sent once per fresh connection to authenticate and declare which event
/// categories we want.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyPayload {
    /// Authentication token
    pub token: String,

    /// Event-category subscription bits
    pub intents: Intents,

    /// Client properties reported to the gateway
    pub properties: IdentifyProperties,
}

impl IdentifyPayload {
    /// Create an Identify payload with default client properties
    #[must_use]
    pub fn new(token: impl Into<String>, intents: Intents) -> Self {
        Self {
            token: token.into(),
            intents,
            properties: IdentifyProperties::default(),
        }
    }
}

/// Client connection properties
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyProperties {
    /// Operating system
    pub os: String,

    /// Library name reported as the browser
    pub browser: String,

    /// Library name reported as the device
    pub device: String,
}

impl IdentifyProperties {
    /// Create properties describing this library on the current OS
    #[must_use]
    pub fn new() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            browser: "banter".to_string(),
            device: "banter".to_string(),
        }
    }

    /// Set operating system
    #[must_use]
    pub fn with_os(mut self, os: impl Into<String>) -> Self {
        self.os = os.into();
        self
    }

    /// Set browser name
    #[must_use]
    pub fn with_browser(mut self, browser: impl Into<String>) -> Self {
        self.browser = browser.into();
        self
    }

    /// Set device name
    #[must_use]
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }
}

impl Default for IdentifyProperties {
    fn default() -> Self {
        Self::new()
    }
}

/// Payload for op 3 (Presence Update)
///
/// Sent to change the status other users see.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceUpdatePayload {
    /// New status (online, idle, dnd, offline)
    pub status: String,
}

impl PresenceUpdatePayload {
    /// Statuses the gateway accepts
    pub const VALID_STATUSES: &'static [&'static str] = &["online", "idle", "dnd", "offline"];

    /// Create a presence update payload
    #[must_use]
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }

    /// Check if the status is one the gateway accepts
    #[must_use]
    pub fn is_valid_status(&self) -> bool {
        Self::VALID_STATUSES.contains(&self.status.as_str())
    }
}

/// Payload for op 4 (Resume)
///
/// Sent instead of Identify to pick a dropped session back up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumePayload {
    /// Authentication token
    pub token: String,

    /// Session ID to resume
    pub session_id: String,

    /// Last received sequence number
    pub seq: u64,
}

impl ResumePayload {
    /// Create a Resume payload
    #[must_use]
    pub fn new(token: impl Into<String>, session_id: impl Into<String>, seq: u64) -> Self {
        Self {
            token: token.into(),
            session_id: session_id.into(),
            seq,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hello_payload() {
        let hello = HelloPayload::new();
        assert_eq!(hello.heartbeat_interval, 45_000);

        let custom = HelloPayload::with_interval(30_000);
        assert_eq!(custom.heartbeat_interval, 30_000);
    }

    #[test]
    fn test_hello_payload_decode() {
        let hello: HelloPayload =
            serde_json::from_str(r#"{"heartbeat_interval": 41250}"#).unwrap();
        assert_eq!(hello.heartbeat_interval, 41_250);
    }

    #[test]
    fn test_identify_defaults() {
        let identify = IdentifyPayload::new("token123", Intents::DEFAULT);
        assert_eq!(identify.token, "token123");
        assert_eq!(identify.properties.os, std::env::consts::OS);
        assert_eq!(identify.properties.browser, "banter");
        assert_eq!(identify.properties.device, "banter");
    }

    #[test]
    fn test_identify_serializes_intents_as_number() {
        let identify = IdentifyPayload::new("tok", Intents::GUILDS | Intents::GUILD_MESSAGES);
        let json = serde_json::to_value(&identify).unwrap();
        assert_eq!(json["intents"], serde_json::json!(513));
        assert_eq!(json["token"], serde_json::json!("tok"));
    }

    #[test]
    fn test_identify_properties_builder() {
        let props = IdentifyProperties::new()
            .with_os("windows")
            .with_browser("custom-client")
            .with_device("desktop");

        assert_eq!(props.os, "windows");
        assert_eq!(props.browser, "custom-client");
        assert_eq!(props.device, "desktop");
    }

    #[test]
    fn test_presence_update_validation() {
        assert!(PresenceUpdatePayload::new("online").is_valid_status());
        assert!(PresenceUpdatePayload::new("dnd").is_valid_status());
        assert!(!PresenceUpdatePayload::new("busy").is_valid_status());
    }

    #[test]
    fn test_resume_payload_serialization() {
        let payload = ResumePayload::new("token123", "session456", 42);

        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("session456"));
        assert!(json.contains("42"));
    }
}
