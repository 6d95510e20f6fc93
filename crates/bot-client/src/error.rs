//! Client error types

use bot_commands::CommandError;
use bot_common::AppError;
use bot_core::DomainError;
use bot_gateway::GatewayError;
use bot_rest::RestError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("REST error: {0}")]
    Rest(#[from] RestError),

    #[error("Invalid command: {0}")]
    Domain(#[from] DomainError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Gateway(e) => e.into(),
            ClientError::Rest(e) => e.into(),
            ClientError::Domain(e) => e.into(),
            ClientError::Command(e) => e.into(),
        }
    }
}
