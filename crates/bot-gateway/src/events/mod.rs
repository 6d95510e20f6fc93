//! Gateway events
//!
//! Event names and the listener that routes dispatches to handlers.

mod event_types;
mod listener;

pub use event_types::GatewayEventType;
pub use listener::{panic_message, EventHandler, EventListener};
