//! # bot-rest
//!
//! Minimal REST collaborator: the JSON transport plus the resources the
//! gateway client needs (global application commands, interaction
//! callbacks and channel messages).

pub mod channels;
pub mod client;
pub mod commands;
pub mod error;
pub mod interactions;

pub use channels::{ChannelsApi, Message};
pub use client::{RestClient, RestTransport};
pub use reqwest::Method;
pub use commands::ApplicationCommandsApi;
pub use error::RestError;
pub use interactions::{
    InteractionCallbackData, InteractionResponse, InteractionResponseKind, InteractionsApi,
    EPHEMERAL,
};
