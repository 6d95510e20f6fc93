//! REST error types

use bot_common::AppError;
use thiserror::Error;

/// REST layer errors
#[derive(Debug, Error)]
pub enum RestError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid token: cannot be used as an Authorization header")]
    InvalidToken,

    #[error("Unauthorized: the token was rejected")]
    Unauthorized,

    #[error("Request failed with status {status}: {message}")]
    Status {
        status: u16,
        /// JSON error code from the response body, if any
        code: Option<u64>,
        message: String,
    },

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RestError {
    /// HTTP status of the failed request, if one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<RestError> for AppError {
    fn from(err: RestError) -> Self {
        match err {
            RestError::Unauthorized | RestError::InvalidToken => AppError::InvalidToken,
            other => AppError::Remote(other.to_string()),
        }
    }
}
