//! Connection management
//!
//! Opening the websocket, moving frames over it, and the session that drives
//! one connection through Hello, Identify, heartbeats and dispatches.

mod connector;
mod session;
mod transport;

pub use connector::{Connector, WsConnector};
pub use session::{GatewaySession, SessionOptions, SessionState};
pub use transport::{Inbound, Transport, WsTransport};
