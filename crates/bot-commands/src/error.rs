//! Command error types

use bot_common::AppError;
use bot_core::DomainError;
use bot_rest::RestError;
use thiserror::Error;

/// Errors raised by command handlers and the command machinery
#[derive(Debug, Error)]
pub enum CommandError {
    /// A second initial response to the same interaction
    #[error("Interaction already replied to")]
    AlreadyReplied,

    /// Editing the reply before any reply was sent
    #[error("Interaction has not been replied to yet")]
    NotReplied,

    #[error("Missing argument: {0}")]
    MissingArgument(String),

    #[error("Argument {name} is not a {expected}")]
    InvalidArgument {
        name: String,
        expected: &'static str,
    },

    #[error("REST error: {0}")]
    Rest(#[from] RestError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl CommandError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Problems with what the user typed, as opposed to our own failures
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::MissingArgument(_) | Self::InvalidArgument { .. })
    }
}

pub type CommandResult<T = ()> = Result<T, CommandError>;

impl From<CommandError> for AppError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Rest(e) => e.into(),
            CommandError::Domain(e) => AppError::Domain(e),
            e @ (CommandError::MissingArgument(_) | CommandError::InvalidArgument { .. }) => {
                AppError::validation(e)
            }
            other => AppError::internal(other),
        }
    }
}
