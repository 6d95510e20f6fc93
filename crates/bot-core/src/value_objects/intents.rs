//! Gateway intents bitflags
//!
//! Intents select which dispatch events the gateway sends to this session.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

bitflags! {
    /// Gateway intent flags, sent as an integer in the Identify payload
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Intents: u64 {
        const GUILDS                   = 1 << 0;
        /// Privileged
        const GUILD_MEMBERS            = 1 << 1;
        const GUILD_MODERATION         = 1 << 2;
        const GUILD_EXPRESSIONS        = 1 << 3;
        const GUILD_INTEGRATIONS       = 1 << 4;
        const GUILD_WEBHOOKS           = 1 << 5;
        const GUILD_INVITES            = 1 << 6;
        const GUILD_VOICE_STATES       = 1 << 7;
        /// Privileged
        const GUILD_PRESENCES          = 1 << 8;
        const GUILD_MESSAGES           = 1 << 9;
        const GUILD_MESSAGE_REACTIONS  = 1 << 10;
        const GUILD_MESSAGE_TYPING     = 1 << 11;
        const DIRECT_MESSAGES          = 1 << 12;
        const DIRECT_MESSAGE_REACTIONS = 1 << 13;
        const DIRECT_MESSAGE_TYPING    = 1 << 14;
        /// Privileged
        const MESSAGE_CONTENT          = 1 << 15;

        /// Baseline used when the host asks for nothing specific (16)
        const DEFAULT = Self::GUILD_INTEGRATIONS.bits();

        /// Everything needed to receive and read messages (55824)
        const MESSAGES = Self::GUILD_INTEGRATIONS.bits()
            | Self::GUILD_MESSAGES.bits()
            | Self::GUILD_MESSAGE_TYPING.bits()
            | Self::DIRECT_MESSAGES.bits()
            | Self::DIRECT_MESSAGE_TYPING.bits()
            | Self::MESSAGE_CONTENT.bits();

        /// Reaction add/remove in guilds and DMs (9232)
        const REACTIONS = Self::GUILD_INTEGRATIONS.bits()
            | Self::GUILD_MESSAGE_REACTIONS.bits()
            | Self::DIRECT_MESSAGE_REACTIONS.bits();
    }
}

impl Intents {
    /// Intents the gateway requires before it will deliver `event_name`
    ///
    /// Unknown events need nothing extra.
    pub fn required_for(event_name: &str) -> Self {
        match event_name {
            "MESSAGE_CREATE" | "MESSAGE_UPDATE" | "MESSAGE_DELETE" | "MESSAGE_DELETE_BULK"
            | "TYPING_START" => Self::MESSAGES,
            "MESSAGE_REACTION_ADD" | "MESSAGE_REACTION_REMOVE" | "MESSAGE_REACTION_REMOVE_ALL" => {
                Self::REACTIONS
            }
            _ => Self::empty(),
        }
    }

    /// Named preset: `default`, `messages` or `reactions`
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "default" => Some(Self::DEFAULT),
            "messages" => Some(Self::MESSAGES),
            "reactions" => Some(Self::REACTIONS),
            _ => None,
        }
    }

    /// Whether any privileged intent is requested
    #[inline]
    pub fn is_privileged(&self) -> bool {
        self.intersects(Self::GUILD_MEMBERS | Self::GUILD_PRESENCES | Self::MESSAGE_CONTENT)
    }
}

impl Default for Intents {
    fn default() -> Self {
        Intents::DEFAULT
    }
}

impl fmt::Display for Intents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

impl Serialize for Intents {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(self.bits())
    }
}

impl<'de> Deserialize<'de> for Intents {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = u64::deserialize(deserializer)?;
        Ok(Intents::from_bits_truncate(bits))
    }
}
