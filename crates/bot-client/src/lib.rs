//! # bot-client
//!
//! Host-facing facade: build a [`Client`] with event handlers and
//! application commands, run it, and stop it through a [`ShutdownHandle`].

pub mod client;
pub mod error;

pub use client::{Client, ClientBuilder, ShutdownHandle};
pub use error::ClientError;

pub use bot_commands::{CommandArgs, CommandError, CommandResult, InvocationContext, SyncReport};
pub use bot_core::{
    Activity, CommandDeclaration, CommandKind, CommandOption, Incident, IncidentKind,
    IncidentSink, Intents, OptionKind, Presence, Snowflake, Status,
};
pub use bot_gateway::{GatewayEventType, GatewayMessage, HandlerError, HandlerResult};
pub use bot_rest::Message;
