//! Channel messages
//!
//! `POST /channels/{channel_id}/messages`

use std::sync::Arc;

use bot_core::Snowflake;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::client::RestTransport;
use crate::error::RestError;

/// Message record returned after posting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    #[serde(default)]
    pub content: String,
}

#[derive(Clone)]
pub struct ChannelsApi {
    transport: Arc<dyn RestTransport>,
}

impl ChannelsApi {
    pub fn new(transport: Arc<dyn RestTransport>) -> Self {
        Self { transport }
    }

    /// Post a plain text message to a channel
    pub async fn create_message(
        &self,
        channel_id: Snowflake,
        content: impl Into<String>,
    ) -> Result<Message, RestError> {
        let value = self
            .transport
            .post(
                &format!("/channels/{channel_id}/messages"),
                &json!({ "content": content.into() }),
            )
            .await?;
        let message: Message = serde_json::from_value(value)?;

        debug!(channel = %channel_id, id = %message.id, "Message sent");
        Ok(message)
    }
}
