//! Connection establishment

use async_trait::async_trait;
use tracing::{debug, info};

use super::transport::{Transport, WsTransport};
use crate::error::GatewayError;

/// Opens a transport to a gateway URL
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, GatewayError>;
}

/// Websocket connector (`ws://` and `wss://`)
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, GatewayError> {
        debug!(url, "Opening gateway connection");

        let (stream, response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| GatewayError::Connection(e.to_string()))?;

        info!(url, status = response.status().as_u16(), "Gateway connection opened");
        Ok(Box::new(WsTransport::new(stream)))
    }
}
