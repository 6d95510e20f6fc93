//! Typed command arguments

use bot_core::{InteractionData, Snowflake};
use serde_json::Value;

use crate::error::{CommandError, CommandResult};

/// Option values of one invocation, by name
///
/// Values keep the JSON type the remote side sent; sub-command options are
/// flattened and the sub-command path is kept separately.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandArgs {
    path: Vec<String>,
    values: Vec<(String, Value)>,
    target_id: Option<Snowflake>,
}

impl CommandArgs {
    pub fn new<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            path: Vec::new(),
            values: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            target_id: None,
        }
    }

    pub fn from_data(data: &InteractionData) -> Self {
        let (path, values) = data.flatten_options();
        Self {
            path: path.into_iter().map(str::to_string).collect(),
            values: values
                .into_iter()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect(),
            target_id: data.target_id,
        }
    }

    /// Sub-command names taken, outermost first
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Innermost sub-command, if any
    pub fn sub_command(&self) -> Option<&str> {
        self.path.last().map(String::as_str)
    }

    /// User or message a context-menu command was invoked on
    pub fn target_id(&self) -> Option<Snowflake> {
        self.target_id
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find_map(|(key, value)| (key == name).then_some(value))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn str(&self, name: &str) -> CommandResult<&str> {
        self.typed(name, "string", Value::as_str)
    }

    pub fn i64(&self, name: &str) -> CommandResult<i64> {
        self.typed(name, "integer", Value::as_i64)
    }

    pub fn f64(&self, name: &str) -> CommandResult<f64> {
        self.typed(name, "number", Value::as_f64)
    }

    pub fn bool(&self, name: &str) -> CommandResult<bool> {
        self.typed(name, "boolean", Value::as_bool)
    }

    /// User, channel, role or mentionable option: ids arrive as strings
    pub fn snowflake(&self, name: &str) -> CommandResult<Snowflake> {
        self.typed(name, "snowflake", |value| match value {
            Value::String(s) => s.parse::<Snowflake>().ok(),
            Value::Number(n) => n.as_u64().map(Snowflake::new),
            _ => None,
        })
    }

    fn typed<'a, T>(
        &'a self,
        name: &str,
        expected: &'static str,
        convert: impl FnOnce(&'a Value) -> Option<T>,
    ) -> CommandResult<T> {
        let value = self
            .get(name)
            .ok_or_else(|| CommandError::MissingArgument(name.to_string()))?;
        convert(value).ok_or_else(|| CommandError::InvalidArgument {
            name: name.to_string(),
            expected,
        })
    }
}
