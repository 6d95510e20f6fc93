//! Gateway close codes
//!
//! Sent by the remote side in the close frame when it ends the connection.

/// Application close codes (4000-4014) the gateway may end a session with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CloseCode {
    UnknownError = 4000,
    UnknownOpcode = 4001,
    DecodeError = 4002,
    /// Payload sent before Identify
    NotAuthenticated = 4003,
    /// Token rejected
    AuthenticationFailed = 4004,
    /// Identify sent twice
    AlreadyAuthenticated = 4005,
    /// Bad sequence on Resume
    InvalidSeq = 4007,
    RateLimited = 4008,
    SessionTimedOut = 4009,
    InvalidShard = 4010,
    ShardingRequired = 4011,
    InvalidApiVersion = 4012,
    InvalidIntents = 4013,
    /// Privileged intent requested without approval
    DisallowedIntents = 4014,
}

impl CloseCode {
    /// `None` for standard websocket codes and unassigned values
    #[must_use]
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            4000 => Some(Self::UnknownError),
            4001 => Some(Self::UnknownOpcode),
            4002 => Some(Self::DecodeError),
            4003 => Some(Self::NotAuthenticated),
            4004 => Some(Self::AuthenticationFailed),
            4005 => Some(Self::AlreadyAuthenticated),
            4007 => Some(Self::InvalidSeq),
            4008 => Some(Self::RateLimited),
            4009 => Some(Self::SessionTimedOut),
            4010 => Some(Self::InvalidShard),
            4011 => Some(Self::ShardingRequired),
            4012 => Some(Self::InvalidApiVersion),
            4013 => Some(Self::InvalidIntents),
            4014 => Some(Self::DisallowedIntents),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Whether a supervisor may open a new session after this code
    ///
    /// Codes caused by bad credentials or configuration will fail again.
    #[must_use]
    pub const fn should_reconnect(self) -> bool {
        !matches!(
            self,
            Self::AuthenticationFailed
                | Self::InvalidShard
                | Self::ShardingRequired
                | Self::InvalidApiVersion
                | Self::InvalidIntents
                | Self::DisallowedIntents
        )
    }

    /// What the client did wrong, as far as the gateway is concerned
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::UnknownError => "gateway error, cause unknown",
            Self::UnknownOpcode => "client sent an invalid op",
            Self::DecodeError => "client sent an undecodable payload",
            Self::NotAuthenticated => "client sent a payload before identifying",
            Self::AuthenticationFailed => "token rejected",
            Self::AlreadyAuthenticated => "client identified twice",
            Self::InvalidSeq => "resume sequence not recognised",
            Self::RateLimited => "client sent payloads too quickly",
            Self::SessionTimedOut => "session timed out",
            Self::InvalidShard => "invalid shard in identify",
            Self::ShardingRequired => "too many guilds for a single session",
            Self::InvalidApiVersion => "gateway version not supported",
            Self::InvalidIntents => "intents value not valid",
            Self::DisallowedIntents => "privileged intents not enabled for this bot",
        }
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason())
    }
}
