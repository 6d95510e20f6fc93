//! Gateway error types

use bot_common::AppError;
use bot_core::DomainError;
use thiserror::Error;

use crate::protocol::{CloseCode, EnvelopeError};

/// Session-level errors
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Could not open the connection (network, DNS, TLS, handshake)
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The open connection ended
    #[error("Connection lost: {reason}")]
    ConnectionLost {
        reason: String,
        close_code: Option<u16>,
    },

    /// Write attempted on a closed connection
    #[error("Send failed: {0}")]
    Send(String),

    /// `run` called on a session that already ran
    #[error("Session already started")]
    AlreadyStarted,

    /// The remote side broke the protocol (e.g. no Hello)
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl GatewayError {
    pub fn lost(reason: impl Into<String>) -> Self {
        Self::ConnectionLost {
            reason: reason.into(),
            close_code: None,
        }
    }

    /// Known gateway close code carried by a lost connection
    pub fn close_code(&self) -> Option<CloseCode> {
        match self {
            Self::ConnectionLost {
                close_code: Some(code),
                ..
            } => CloseCode::from_u16(*code),
            _ => None,
        }
    }

    pub fn is_connection_lost(&self) -> bool {
        matches!(self, Self::ConnectionLost { .. })
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Connection(msg) => AppError::Connection(msg),
            GatewayError::ConnectionLost {
                close_code: Some(4004),
                ..
            } => AppError::InvalidToken,
            lost @ GatewayError::ConnectionLost { .. } => AppError::ConnectionLost(lost.to_string()),
            other => AppError::internal(other),
        }
    }
}

/// Error returned by an event handler
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Event payload did not have the expected shape
    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("Envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl HandlerError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Handler result type
pub type HandlerResult<T = ()> = Result<T, HandlerError>;
