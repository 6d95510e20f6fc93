//! Presence and activity value objects
//!
//! Sent inside Identify and with op 3 (Presence Update).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Online status shown for the bot user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Online,
    /// Do not disturb
    Dnd,
    Idle,
    Invisible,
    Offline,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Online => write!(f, "online"),
            Self::Dnd => write!(f, "dnd"),
            Self::Idle => write!(f, "idle"),
            Self::Invisible => write!(f, "invisible"),
            Self::Offline => write!(f, "offline"),
        }
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "online" => Ok(Self::Online),
            "dnd" => Ok(Self::Dnd),
            "idle" => Ok(Self::Idle),
            "invisible" => Ok(Self::Invisible),
            "offline" => Ok(Self::Offline),
            _ => Err(format!("Invalid status: {s}")),
        }
    }
}

/// Activity type, serialized as its integer code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ActivityKind {
    /// "Playing {name}"
    Game = 0,
    /// "Streaming {name}", requires a url
    Streaming = 1,
    /// "Listening to {name}"
    Listening = 2,
    /// "Watching {name}"
    Watching = 3,
    Custom = 4,
    /// "Competing in {name}"
    Competing = 5,
}

impl ActivityKind {
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Game),
            1 => Some(Self::Streaming),
            2 => Some(Self::Listening),
            3 => Some(Self::Watching),
            4 => Some(Self::Custom),
            5 => Some(Self::Competing),
            _ => None,
        }
    }
}

impl Serialize for ActivityKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(*self as u8)
    }
}

impl<'de> Deserialize<'de> for ActivityKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        Self::from_u8(value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid activity type: {value}")))
    }
}

/// A single activity entry in a presence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: ActivityKind,

    /// Stream url, only honoured for `Streaming`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Activity {
    pub fn playing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ActivityKind::Game,
            url: None,
        }
    }

    pub fn streaming(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ActivityKind::Streaming,
            url: Some(url.into()),
        }
    }

    pub fn listening(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ActivityKind::Listening,
            url: None,
        }
    }

    pub fn watching(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ActivityKind::Watching,
            url: None,
        }
    }

    pub fn competing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ActivityKind::Competing,
            url: None,
        }
    }
}

/// Presence snapshot: what the session announces about itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presence {
    /// Unix time (ms) since the client went idle/afk
    pub since: Option<i64>,
    pub afk: bool,
    pub status: Status,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

impl Presence {
    /// Presence with `since` stamped to the current time
    pub fn now(status: Status) -> Self {
        Self {
            since: Some(chrono::Utc::now().timestamp_millis()),
            afk: false,
            status,
            activities: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_afk(mut self, afk: bool) -> Self {
        self.afk = afk;
        self
    }

    #[must_use]
    pub fn with_activity(mut self, activity: Activity) -> Self {
        self.activities.push(activity);
        self
    }

    /// Refresh `since` to the current time, keeping everything else
    #[must_use]
    pub fn restamped(mut self) -> Self {
        self.since = Some(chrono::Utc::now().timestamp_millis());
        self
    }
}

impl Default for Presence {
    fn default() -> Self {
        Self::now(Status::Online)
    }
}
