//! Payload definitions
//!
//! The `d` field of the frames the client sends or reads.

use bot_core::{Activity, Intents, Presence, Snowflake, Status};
use serde::{Deserialize, Serialize};

/// Payload for op 10 (Hello)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval: u64,
}

/// Payload for op 2 (Identify)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifyPayload {
    pub token: String,
    pub intents: Intents,
    pub properties: IdentifyProperties,
    pub presence: PresenceUpdatePayload,
}

/// Client connection properties
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyProperties {
    pub os: String,
    pub browser: String,
    pub device: String,
}

impl IdentifyProperties {
    pub fn new(
        os: impl Into<String>,
        browser: impl Into<String>,
        device: impl Into<String>,
    ) -> Self {
        Self {
            os: os.into(),
            browser: browser.into(),
            device: device.into(),
        }
    }
}

impl Default for IdentifyProperties {
    /// Host OS plus this library's name
    fn default() -> Self {
        Self::new(
            std::env::consts::OS,
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_NAME"),
        )
    }
}

/// Payload for op 3 (Presence Update), also embedded in Identify
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceUpdatePayload {
    /// Unix time in milliseconds since the client went idle, or null
    pub since: Option<i64>,
    pub activities: Vec<Activity>,
    pub status: Status,
    pub afk: bool,
}

impl From<Presence> for PresenceUpdatePayload {
    fn from(presence: Presence) -> Self {
        Self {
            since: presence.since,
            activities: presence.activities,
            status: presence.status,
            afk: presence.afk,
        }
    }
}

/// Payload of the READY dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadyPayload {
    /// Gateway protocol version
    pub v: u8,
    pub user: ReadyUser,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_gateway_url: Option<String>,
    pub application: ReadyApplication,
}

/// Bot user as reported in READY
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyUser {
    pub id: Snowflake,
    pub username: String,
    #[serde(default)]
    pub bot: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyApplication {
    pub id: Snowflake,
}
