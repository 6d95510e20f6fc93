//! Interactions - inbound invocations of registered commands
//!
//! Decoded from the payload of an `INTERACTION_CREATE` dispatch.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::command::{CommandKey, CommandKind, OptionKind};
use crate::value_objects::Snowflake;

/// Interaction type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum InteractionKind {
    Ping = 1,
    ApplicationCommand = 2,
    MessageComponent = 3,
    ApplicationCommandAutocomplete = 4,
    ModalSubmit = 5,
}

impl InteractionKind {
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Ping),
            2 => Some(Self::ApplicationCommand),
            3 => Some(Self::MessageComponent),
            4 => Some(Self::ApplicationCommandAutocomplete),
            5 => Some(Self::ModalSubmit),
            _ => None,
        }
    }
}

impl Serialize for InteractionKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(*self as u8)
    }
}

impl<'de> Deserialize<'de> for InteractionKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        Self::from_u8(value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid interaction type: {value}")))
    }
}

/// One option value as sent by the remote side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionOption {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: OptionKind,

    /// Absent for sub-commands and groups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<InteractionOption>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focused: Option<bool>,
}

/// Command data of an application-command interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionData {
    pub id: Snowflake,

    pub name: String,

    #[serde(rename = "type")]
    pub kind: CommandKind,

    #[serde(default)]
    pub options: Vec<InteractionOption>,

    /// User or message a context-menu command was invoked on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<Snowflake>,

    /// Users, members, roles, channels and attachments referenced by options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<Value>,
}

impl InteractionData {
    pub fn key(&self) -> CommandKey {
        CommandKey::new(self.kind, self.name.clone())
    }

    /// Every `(name, value)` pair, descending into sub-commands
    ///
    /// Also returns the sub-command path taken, outermost first.
    pub fn flatten_options(&self) -> (Vec<&str>, Vec<(&str, &Value)>) {
        let mut path = Vec::new();
        let mut values = Vec::new();
        collect_options(&self.options, &mut path, &mut values);
        (path, values)
    }
}

fn collect_options<'a>(
    options: &'a [InteractionOption],
    path: &mut Vec<&'a str>,
    values: &mut Vec<(&'a str, &'a Value)>,
) {
    for option in options {
        if option.kind.is_sub_command() {
            path.push(option.name.as_str());
            collect_options(&option.options, path, values);
        } else if let Some(value) = &option.value {
            values.push((option.name.as_str(), value));
        }
    }
}

/// An inbound interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: Snowflake,

    pub application_id: Snowflake,

    #[serde(rename = "type")]
    pub kind: InteractionKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<InteractionData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<Snowflake>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<Snowflake>,

    /// Guild member who invoked, when invoked in a guild
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<Value>,

    /// User who invoked, when invoked in a DM
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,

    /// Continuation token used to reply, valid for 15 minutes
    pub token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

impl Interaction {
    /// Command data, if this is an application-command invocation
    pub fn command_data(&self) -> Option<&InteractionData> {
        match self.kind {
            InteractionKind::ApplicationCommand => self.data.as_ref(),
            _ => None,
        }
    }

    /// Id of the invoking user, from `member.user` in guilds or `user` in DMs
    pub fn invoker_id(&self) -> Option<Snowflake> {
        let user = self
            .member
            .as_ref()
            .and_then(|m| m.get("user"))
            .or(self.user.as_ref())?;
        serde_json::from_value(user.get("id")?.clone()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn slash_interaction() -> Value {
        json!({
            "id": "900",
            "application_id": "5",
            "type": 2,
            "token": "tok",
            "guild_id": "77",
            "member": {"user": {"id": "42", "username": "alice"}},
            "data": {
                "id": "101",
                "name": "config",
                "type": 1,
                "options": [{
                    "name": "set",
                    "type": 1,
                    "options": [
                        {"name": "key", "type": 3, "value": "color"},
                        {"name": "value", "type": 4, "value": 7}
                    ]
                }]
            }
        })
    }

    #[test]
    fn test_decode_interaction() {
        let interaction: Interaction = serde_json::from_value(slash_interaction()).unwrap();

        assert_eq!(interaction.kind, InteractionKind::ApplicationCommand);
        assert_eq!(interaction.token, "tok");
        assert_eq!(interaction.invoker_id(), Some(Snowflake::new(42)));

        let data = interaction.command_data().unwrap();
        assert_eq!(data.key(), CommandKey::new(CommandKind::ChatInput, "config"));
    }

    #[test]
    fn test_flatten_sub_command_options() {
        let interaction: Interaction = serde_json::from_value(slash_interaction()).unwrap();
        let (path, values) = interaction.command_data().unwrap().flatten_options();

        assert_eq!(path, vec!["set"]);
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], ("key", &json!("color")));
        assert_eq!(values[1], ("value", &json!(7)));
    }

    #[test]
    fn test_non_command_interaction_has_no_command_data() {
        let mut raw = slash_interaction();
        raw["type"] = json!(3);
        let interaction: Interaction = serde_json::from_value(raw).unwrap();
        assert!(interaction.command_data().is_none());
    }

    #[test]
    fn test_dm_invoker() {
        let mut raw = slash_interaction();
        raw.as_object_mut().unwrap().remove("member");
        raw["user"] = json!({"id": "43"});
        let interaction: Interaction = serde_json::from_value(raw).unwrap();
        assert_eq!(interaction.invoker_id(), Some(Snowflake::new(43)));
    }
}
