//! Duplex frame transport
//!
//! [`Transport`] moves raw text frames; decoding into envelopes happens in
//! the session. [`WsTransport`] is the websocket implementation.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::GatewayError;

/// One inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A text (or UTF-8 binary) data frame
    Text(String),
    /// Ping, pong or a binary frame that is not text
    Control,
}

/// Duplex connection carrying text frames
///
/// `send` may be called from several tasks at once; implementations
/// serialize writes. `receive` is only ever driven by one task.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, text: String) -> Result<(), GatewayError>;

    /// Next frame; close frames, stream end and I/O errors are `ConnectionLost`
    async fn receive(&self) -> Result<Inbound, GatewayError>;

    async fn close(&self) -> Result<(), GatewayError>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Websocket transport over `tokio-tungstenite`
pub struct WsTransport {
    writer: Mutex<SplitSink<WsStream, Message>>,
    reader: Mutex<SplitStream<WsStream>>,
}

impl WsTransport {
    pub fn new(stream: WsStream) -> Self {
        let (writer, reader) = stream.split();
        Self {
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
        }
    }
}

fn lost_from_close(frame: Option<CloseFrame<'_>>) -> GatewayError {
    match frame {
        Some(frame) => {
            let code = u16::from(frame.code);
            GatewayError::ConnectionLost {
                reason: if frame.reason.is_empty() {
                    format!("closed by remote with code {code}")
                } else {
                    frame.reason.into_owned()
                },
                close_code: Some(code),
            }
        }
        None => GatewayError::lost("closed by remote"),
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&self, text: String) -> Result<(), GatewayError> {
        self.writer
            .lock()
            .await
            .send(Message::Text(text))
            .await
            .map_err(|e| GatewayError::Send(e.to_string()))
    }

    async fn receive(&self) -> Result<Inbound, GatewayError> {
        let next = self.reader.lock().await.next().await;
        match next {
            Some(Ok(Message::Text(text))) => Ok(Inbound::Text(text)),
            Some(Ok(Message::Binary(bytes))) => {
                Ok(String::from_utf8(bytes).map_or(Inbound::Control, Inbound::Text))
            }
            Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {
                Ok(Inbound::Control)
            }
            Some(Ok(Message::Close(frame))) => Err(lost_from_close(frame)),
            Some(Err(e)) => Err(GatewayError::lost(e.to_string())),
            None => Err(GatewayError::lost("stream ended")),
        }
    }

    async fn close(&self) -> Result<(), GatewayError> {
        self.writer
            .lock()
            .await
            .close()
            .await
            .map_err(|e| GatewayError::Send(e.to_string()))
    }
}
