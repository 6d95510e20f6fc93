//! Application command declarations
//!
//! A command is declared locally, registered remotely, and handled locally.
//! Commands are identified by `(kind, name)`; names are unique per kind.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use validator::Validate;

use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Maximum options per command
pub const MAX_OPTIONS: usize = 25;
/// Maximum name length for commands and options
pub const MAX_NAME_LEN: usize = 32;
/// Maximum description length for chat-input commands and options
pub const MAX_DESCRIPTION_LEN: usize = 100;
/// Placeholder used when a chat-input command or option has no description
pub const NO_DESCRIPTION: &str = "No description";

// ============================================================================
// Kinds
// ============================================================================

/// Command type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum CommandKind {
    /// Slash command typed in the chat input
    #[default]
    ChatInput = 1,
    /// Context-menu command on a user
    User = 2,
    /// Context-menu command on a message
    Message = 3,
}

impl CommandKind {
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::ChatInput),
            2 => Some(Self::User),
            3 => Some(Self::Message),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ChatInput => "chat-input",
            Self::User => "user",
            Self::Message => "message",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for CommandKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for CommandKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        Self::from_u8(value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid command type: {value}")))
    }
}

/// Option (argument) type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OptionKind {
    SubCommand = 1,
    SubCommandGroup = 2,
    String = 3,
    /// Any integer between -2^53 and 2^53
    Integer = 4,
    Boolean = 5,
    User = 6,
    Channel = 7,
    Role = 8,
    Mentionable = 9,
    /// Any double between -2^53 and 2^53
    Number = 10,
    Attachment = 11,
}

impl OptionKind {
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::SubCommand),
            2 => Some(Self::SubCommandGroup),
            3 => Some(Self::String),
            4 => Some(Self::Integer),
            5 => Some(Self::Boolean),
            6 => Some(Self::User),
            7 => Some(Self::Channel),
            8 => Some(Self::Role),
            9 => Some(Self::Mentionable),
            10 => Some(Self::Number),
            11 => Some(Self::Attachment),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Sub-commands and groups nest options instead of carrying a value
    #[must_use]
    pub const fn is_sub_command(self) -> bool {
        matches!(self, Self::SubCommand | Self::SubCommandGroup)
    }

    /// Whether `choices` may be attached to options of this kind
    #[must_use]
    pub const fn supports_choices(self) -> bool {
        matches!(self, Self::String | Self::Integer | Self::Number)
    }
}

impl Serialize for OptionKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for OptionKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        Self::from_u8(value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid option type: {value}")))
    }
}

// ============================================================================
// Key
// ============================================================================

/// Identity of a command: names are unique per kind
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommandKey {
    pub kind: CommandKind,
    pub name: String,
}

impl CommandKey {
    pub fn new(kind: CommandKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for CommandKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

// ============================================================================
// Declaration
// ============================================================================

/// A fixed value the user picks from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOptionChoice {
    pub name: String,
    pub value: Value,
}

/// One declared option of a command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CommandOption {
    #[validate(length(min = 1, max = 32, message = "Option name must be 1-32 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 100, message = "Option description must be 1-100 characters"))]
    pub description: String,

    #[serde(rename = "type")]
    pub kind: OptionKind,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[validate(length(max = 25, message = "At most 25 choices"))]
    pub choices: Vec<CommandOptionChoice>,

    /// Nested options of a sub-command or group
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[validate(length(max = 25, message = "At most 25 nested options"), nested)]
    pub options: Vec<CommandOption>,
}

impl CommandOption {
    /// Create an optional option with the placeholder description
    pub fn new(name: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            name: name.into(),
            description: NO_DESCRIPTION.to_string(),
            kind,
            required: false,
            choices: Vec::new(),
            options: Vec::new(),
        }
    }

    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn choice(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.choices.push(CommandOptionChoice {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }
}

/// A locally declared command
///
/// Serializes to exactly the remote creation payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CommandDeclaration {
    #[validate(length(min = 1, max = 32, message = "Command name must be 1-32 characters"))]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(rename = "type", default)]
    pub kind: CommandKind,

    #[serde(default)]
    #[validate(length(max = 25, message = "At most 25 options"), nested)]
    pub options: Vec<CommandOption>,
}

impl CommandDeclaration {
    /// Slash command; an empty description falls back to the placeholder
    pub fn chat_input(name: impl Into<String>, description: impl Into<String>) -> Self {
        let description = description.into();
        Self {
            name: name.into(),
            description: if description.is_empty() {
                NO_DESCRIPTION.to_string()
            } else {
                description
            },
            kind: CommandKind::ChatInput,
            options: Vec::new(),
        }
    }

    /// User context-menu command
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            kind: CommandKind::User,
            options: Vec::new(),
        }
    }

    /// Message context-menu command
    pub fn message(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            kind: CommandKind::Message,
            options: Vec::new(),
        }
    }

    #[must_use]
    pub fn option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn key(&self) -> CommandKey {
        CommandKey::new(self.kind, self.name.clone())
    }

    /// Check every rule the remote registry enforces on creation
    pub fn check(&self) -> Result<(), DomainError> {
        self.validate()
            .map_err(|e| DomainError::ValidationError(format!("{}: {e}", self.key())))?;

        match self.kind {
            CommandKind::ChatInput => {
                check_chat_input_name(&self.name)?;
                let len = self.description.chars().count();
                if len == 0 || len > MAX_DESCRIPTION_LEN {
                    return Err(DomainError::InvalidDescription(self.key()));
                }
            }
            CommandKind::User | CommandKind::Message => {
                if !self.description.is_empty() {
                    return Err(DomainError::InvalidDescription(self.key()));
                }
                if !self.options.is_empty() {
                    return Err(DomainError::InvalidOption {
                        command: self.key(),
                        option: self.options[0].name.clone(),
                        reason: "context-menu commands take no options".to_string(),
                    });
                }
            }
        }

        check_options(&self.key(), &self.options)
    }
}

/// Names of slash commands and their options: `[-_\p{L}\p{N}]{1,32}`, lower case
fn check_chat_input_name(name: &str) -> Result<(), DomainError> {
    let len = name.chars().count();
    if len == 0 || len > MAX_NAME_LEN {
        return Err(DomainError::InvalidCommandName {
            name: name.to_string(),
            reason: "must be 1-32 characters".to_string(),
        });
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(DomainError::InvalidCommandName {
            name: name.to_string(),
            reason: format!("invalid character {c:?}"),
        });
    }
    if name.chars().any(char::is_uppercase) {
        return Err(DomainError::InvalidCommandName {
            name: name.to_string(),
            reason: "must be lower case".to_string(),
        });
    }
    Ok(())
}

fn check_options(command: &CommandKey, options: &[CommandOption]) -> Result<(), DomainError> {
    let invalid = |option: &CommandOption, reason: &str| DomainError::InvalidOption {
        command: command.clone(),
        option: option.name.clone(),
        reason: reason.to_string(),
    };

    let mut seen_optional = false;
    for (i, option) in options.iter().enumerate() {
        check_chat_input_name(&option.name).map_err(|_| invalid(option, "invalid name"))?;

        if options[..i].iter().any(|o| o.name == option.name) {
            return Err(invalid(option, "duplicate option name"));
        }
        if option.required && seen_optional {
            return Err(invalid(option, "required options must precede optional ones"));
        }
        seen_optional |= !option.required;

        if !option.choices.is_empty() && !option.kind.supports_choices() {
            return Err(invalid(option, "choices are only allowed on string/integer/number"));
        }
        if !option.options.is_empty() && !option.kind.is_sub_command() {
            return Err(invalid(option, "only sub-commands nest options"));
        }
        check_options(command, &option.options)?;
    }
    Ok(())
}

// ============================================================================
// Remote record
// ============================================================================

/// A command as stored in the remote registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteCommand {
    pub id: Snowflake,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<Snowflake>,

    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Missing on old records; those are slash commands
    #[serde(rename = "type", default)]
    pub kind: CommandKind,

    #[serde(default)]
    pub options: Vec<CommandOption>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Snowflake>,
}

impl RemoteCommand {
    pub fn key(&self) -> CommandKey {
        CommandKey::new(self.kind, self.name.clone())
    }
}
