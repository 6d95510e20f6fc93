//! Global application command resource
//!
//! `GET/POST /applications/{application_id}/commands`
//! `DELETE /applications/{application_id}/commands/{command_id}`

use std::sync::Arc;

use bot_core::{CommandDeclaration, RemoteCommand, Snowflake};
use tracing::info;

use crate::client::RestTransport;
use crate::error::RestError;

#[derive(Clone)]
pub struct ApplicationCommandsApi {
    transport: Arc<dyn RestTransport>,
    application_id: Snowflake,
}

impl ApplicationCommandsApi {
    pub fn new(transport: Arc<dyn RestTransport>, application_id: Snowflake) -> Self {
        Self {
            transport,
            application_id,
        }
    }

    pub fn application_id(&self) -> Snowflake {
        self.application_id
    }

    fn collection(&self) -> String {
        format!("/applications/{}/commands", self.application_id)
    }

    /// All global commands currently registered for the application
    pub async fn list(&self) -> Result<Vec<RemoteCommand>, RestError> {
        let value = self.transport.get(&self.collection()).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Register one command; returns the stored record
    pub async fn create(&self, command: &CommandDeclaration) -> Result<RemoteCommand, RestError> {
        let body = serde_json::to_value(command)?;
        let value = self.transport.post(&self.collection(), &body).await?;
        let created: RemoteCommand = serde_json::from_value(value)?;

        info!(command = %created.key(), id = %created.id, "Application command created");
        Ok(created)
    }

    pub async fn delete(&self, command_id: Snowflake) -> Result<(), RestError> {
        self.transport
            .delete(&format!("{}/{}", self.collection(), command_id))
            .await?;

        info!(id = %command_id, "Application command deleted");
        Ok(())
    }
}
