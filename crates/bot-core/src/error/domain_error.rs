//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::entities::CommandKey;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid command name {name:?}: {reason}")]
    InvalidCommandName { name: String, reason: String },

    #[error("Invalid description for command {0}")]
    InvalidDescription(CommandKey),

    #[error("Invalid option {option:?} on command {command}: {reason}")]
    InvalidOption {
        command: CommandKey,
        option: String,
        reason: String,
    },

    #[error("Malformed interaction: {0}")]
    MalformedInteraction(String),

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Command already registered: {0}")]
    DuplicateCommand(CommandKey),

    // =========================================================================
    // Lookup Errors
    // =========================================================================
    #[error("No such command: {0}")]
    NoSuchCommand(CommandKey),
}

impl DomainError {
    /// Get an error code string for reports
    pub fn code(&self) -> &'static str {
        match self {
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidCommandName { .. } => "INVALID_COMMAND_NAME",
            Self::InvalidDescription(_) => "INVALID_DESCRIPTION",
            Self::InvalidOption { .. } => "INVALID_OPTION",
            Self::MalformedInteraction(_) => "MALFORMED_INTERACTION",
            Self::DuplicateCommand(_) => "DUPLICATE_COMMAND",
            Self::NoSuchCommand(_) => "UNKNOWN_COMMAND",
        }
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::InvalidCommandName { .. }
                | Self::InvalidDescription(_)
                | Self::InvalidOption { .. }
        )
    }
}
