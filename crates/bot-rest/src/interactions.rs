//! Interaction responses
//!
//! `POST /interactions/{interaction_id}/{token}/callback`
//! `PATCH /webhooks/{application_id}/{token}/messages/@original`

use std::sync::Arc;

use bot_core::Snowflake;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::json;

use crate::client::RestTransport;
use crate::error::RestError;

/// Message flag: only the invoking user sees the reply
pub const EPHEMERAL: u64 = 1 << 6;

/// Interaction callback type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InteractionResponseKind {
    /// Acknowledge a ping
    Pong = 1,
    /// Reply with a message
    ChannelMessageWithSource = 4,
    /// Acknowledge now, edit the original response later
    DeferredChannelMessageWithSource = 5,
}

impl Serialize for InteractionResponseKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(*self as u8)
    }
}

impl<'de> Deserialize<'de> for InteractionResponseKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match u8::deserialize(deserializer)? {
            1 => Ok(Self::Pong),
            4 => Ok(Self::ChannelMessageWithSource),
            5 => Ok(Self::DeferredChannelMessageWithSource),
            other => Err(serde::de::Error::custom(format!(
                "invalid interaction callback type: {other}"
            ))),
        }
    }
}

/// Message body of a callback
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionCallbackData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
}

/// Body of `POST /interactions/{id}/{token}/callback`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: InteractionResponseKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<InteractionCallbackData>,
}

impl InteractionResponse {
    /// Plain text reply
    pub fn message(content: impl Into<String>) -> Self {
        Self {
            kind: InteractionResponseKind::ChannelMessageWithSource,
            data: Some(InteractionCallbackData {
                content: Some(content.into()),
                flags: None,
            }),
        }
    }

    /// Text reply only the invoking user can see
    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            kind: InteractionResponseKind::ChannelMessageWithSource,
            data: Some(InteractionCallbackData {
                content: Some(content.into()),
                flags: Some(EPHEMERAL),
            }),
        }
    }

    pub fn deferred() -> Self {
        Self {
            kind: InteractionResponseKind::DeferredChannelMessageWithSource,
            data: None,
        }
    }

    pub fn pong() -> Self {
        Self {
            kind: InteractionResponseKind::Pong,
            data: None,
        }
    }
}

#[derive(Clone)]
pub struct InteractionsApi {
    transport: Arc<dyn RestTransport>,
}

impl InteractionsApi {
    pub fn new(transport: Arc<dyn RestTransport>) -> Self {
        Self { transport }
    }

    /// Send the initial response to an interaction
    pub async fn create_response(
        &self,
        interaction_id: Snowflake,
        token: &str,
        response: &InteractionResponse,
    ) -> Result<(), RestError> {
        let body = serde_json::to_value(response)?;
        self.transport
            .post(
                &format!("/interactions/{interaction_id}/{token}/callback"),
                &body,
            )
            .await?;
        Ok(())
    }

    /// Replace the content of the original response (after a deferred ack)
    pub async fn edit_original(
        &self,
        application_id: Snowflake,
        token: &str,
        content: &str,
    ) -> Result<(), RestError> {
        self.transport
            .patch(
                &format!("/webhooks/{application_id}/{token}/messages/@original"),
                &json!({ "content": content }),
            )
            .await?;
        Ok(())
    }
}
