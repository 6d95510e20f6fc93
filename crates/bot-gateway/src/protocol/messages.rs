//! Gateway message envelope
//!
//! Every frame is a JSON object `{"op", "d", "s", "t"}`. `t` is set exactly
//! when `op` is Dispatch; frames breaking that rule are rejected at decode.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::{HelloPayload, IdentifyPayload, OpCode, PresenceUpdatePayload, ReadyPayload};
use crate::events::GatewayEventType;

/// A frame that is not a valid envelope
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("Frame is not valid JSON envelope: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Dispatch frame without event name")]
    MissingEventName,

    #[error("Event name {0:?} on non-dispatch op")]
    UnexpectedEventName(String),
}

/// Gateway message envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMessage")]
pub struct GatewayMessage {
    /// Operation code
    pub op: OpCode,

    /// Payload, `null` when the op carries none
    pub d: Value,

    /// Sequence number, present on dispatches
    pub s: Option<u64>,

    /// Event name, present exactly on dispatches
    pub t: Option<String>,
}

/// Wire shape before the dispatch/event-name rule is checked
#[derive(Deserialize)]
struct RawMessage {
    op: OpCode,
    #[serde(default)]
    d: Value,
    #[serde(default)]
    s: Option<u64>,
    #[serde(default)]
    t: Option<String>,
}

impl TryFrom<RawMessage> for GatewayMessage {
    type Error = EnvelopeError;

    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        match (raw.op, raw.t) {
            (OpCode::Dispatch, None) => Err(EnvelopeError::MissingEventName),
            (op, Some(t)) if op != OpCode::Dispatch => Err(EnvelopeError::UnexpectedEventName(t)),
            (op, t) => Ok(Self {
                op,
                d: raw.d,
                s: raw.s,
                t,
            }),
        }
    }
}

impl GatewayMessage {
    fn control(op: OpCode, d: Value) -> Self {
        Self {
            op,
            d,
            s: None,
            t: None,
        }
    }

    // === Client Messages ===

    /// Create a Heartbeat message (op=1) carrying the last seen sequence
    #[must_use]
    pub fn heartbeat(last_sequence: Option<u64>) -> Self {
        Self::control(
            OpCode::Heartbeat,
            last_sequence.map_or(Value::Null, Value::from),
        )
    }

    /// Create an Identify message (op=2)
    pub fn identify(payload: &IdentifyPayload) -> Result<Self, serde_json::Error> {
        Ok(Self::control(
            OpCode::Identify,
            serde_json::to_value(payload)?,
        ))
    }

    /// Create a Presence Update message (op=3)
    pub fn presence_update(payload: &PresenceUpdatePayload) -> Result<Self, serde_json::Error> {
        Ok(Self::control(
            OpCode::PresenceUpdate,
            serde_json::to_value(payload)?,
        ))
    }

    // === Server Messages ===

    /// Create a Dispatch message (op=0)
    #[must_use]
    pub fn dispatch(event_type: impl Into<String>, sequence: u64, data: Value) -> Self {
        Self {
            op: OpCode::Dispatch,
            d: data,
            s: Some(sequence),
            t: Some(event_type.into()),
        }
    }

    /// Create a Hello message (op=10)
    #[must_use]
    pub fn hello(heartbeat_interval: u64) -> Self {
        Self::control(
            OpCode::Hello,
            serde_json::json!({ "heartbeat_interval": heartbeat_interval }),
        )
    }

    /// Create a Heartbeat ACK message (op=11)
    #[must_use]
    pub fn heartbeat_ack() -> Self {
        Self::control(OpCode::HeartbeatAck, Value::Null)
    }

    /// Create a Reconnect message (op=7)
    #[must_use]
    pub fn reconnect() -> Self {
        Self::control(OpCode::Reconnect, Value::Null)
    }

    /// Create an Invalid Session message (op=9)
    #[must_use]
    pub fn invalid_session(resumable: bool) -> Self {
        Self::control(OpCode::InvalidSession, Value::Bool(resumable))
    }

    // === Parsing ===

    /// Try to parse as a Hello payload (op=10)
    pub fn as_hello(&self) -> Option<HelloPayload> {
        if self.op != OpCode::Hello {
            return None;
        }
        HelloPayload::deserialize(&self.d).ok()
    }

    /// Try to parse as a READY dispatch
    pub fn as_ready(&self) -> Option<ReadyPayload> {
        if self.event_type() != Some(GatewayEventType::Ready) {
            return None;
        }
        ReadyPayload::deserialize(&self.d).ok()
    }

    /// Try to parse as an Identify payload (op=2)
    pub fn as_identify(&self) -> Option<IdentifyPayload> {
        if self.op != OpCode::Identify {
            return None;
        }
        IdentifyPayload::deserialize(&self.d).ok()
    }

    /// Event type of a dispatch
    pub fn event_type(&self) -> Option<GatewayEventType> {
        self.t.as_deref().map(GatewayEventType::from_name)
    }

    // === Utilities ===

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize and validate a frame
    pub fn from_json(json: &str) -> Result<Self, EnvelopeError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl std::fmt::Display for GatewayMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(t) = &self.t {
            write!(f, "GatewayMessage(op={}, t={}", self.op, t)?;
            if let Some(s) = self.s {
                write!(f, ", s={s}")?;
            }
            write!(f, ")")
        } else {
            write!(f, "GatewayMessage(op={})", self.op)
        }
    }
}
