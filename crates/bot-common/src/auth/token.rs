//! Bot credentials
//!
//! The token is sent verbatim in Identify and as the `Authorization` header
//! of every REST request, so it never appears in `Debug` output.

use std::fmt;

/// How the token is presented to the REST API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenKind {
    /// `Authorization: Bot <token>`
    #[default]
    Bot,
    /// `Authorization: Bearer <token>` (OAuth2 client credentials)
    Bearer,
}

impl TokenKind {
    #[must_use]
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Bot => "Bot",
            Self::Bearer => "Bearer",
        }
    }
}

/// Secret bot token
#[derive(Clone, PartialEq, Eq)]
pub struct BotToken {
    secret: String,
    kind: TokenKind,
}

impl BotToken {
    pub fn new(secret: impl Into<String>, kind: TokenKind) -> Self {
        Self {
            secret: secret.into().trim().to_string(),
            kind,
        }
    }

    pub fn bot(secret: impl Into<String>) -> Self {
        Self::new(secret, TokenKind::Bot)
    }

    #[must_use]
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Raw secret, as sent in the Identify payload
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.secret
    }

    /// Value for the REST `Authorization` header
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.kind.scheme(), self.secret)
    }
}

impl fmt::Debug for BotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotToken")
            .field("kind", &self.kind)
            .field("secret", &"<redacted>")
            .finish()
    }
}
