//! # bot-gateway
//!
//! Websocket gateway client: protocol envelope, session lifecycle with
//! heartbeating, and per-event handler dispatch.

pub mod connection;
pub mod error;
pub mod events;
pub mod protocol;

pub use connection::{
    Connector, GatewaySession, Inbound, SessionOptions, SessionState, Transport, WsConnector,
    WsTransport,
};
pub use error::{GatewayError, HandlerError, HandlerResult};
pub use events::{panic_message, EventHandler, EventListener, GatewayEventType};
pub use protocol::{
    CloseCode, EnvelopeError, GatewayMessage, HelloPayload, IdentifyPayload, IdentifyProperties,
    OpCode, PresenceUpdatePayload, ReadyPayload,
};
