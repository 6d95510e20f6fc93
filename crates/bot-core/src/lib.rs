//! # bot-core
//!
//! Domain layer for the gateway bot client: identifiers, intents, presence,
//! command declarations, interactions, and the incident vocabulary used to
//! report isolated failures to the host application.
//! This crate has no dependencies on networking (websocket, HTTP, runtime).

pub mod entities;
pub mod error;
pub mod events;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    CommandDeclaration, CommandKey, CommandKind, CommandOption, CommandOptionChoice,
    Interaction, InteractionData, InteractionKind, InteractionOption, OptionKind, RemoteCommand,
};
pub use error::DomainError;
pub use events::{Incident, IncidentKind, IncidentSink, TracingSink};
pub use value_objects::{Activity, ActivityKind, Intents, Presence, Snowflake, SnowflakeParseError, Status};
