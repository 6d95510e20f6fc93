//! Authentication utilities
//!
//! Bot token handling for the gateway and REST API.

mod token;

pub use token::{BotToken, TokenKind};
