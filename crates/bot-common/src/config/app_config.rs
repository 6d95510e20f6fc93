//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file).

use std::env;
use std::time::Duration;

use bot_core::{Intents, Status};
use serde::Deserialize;

use crate::auth::{BotToken, TokenKind};

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub bot: BotConfig,
    pub gateway: GatewayConfig,
    pub rest: RestConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Identity and initial presence of the bot
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: BotToken,
    pub intents: Intents,
    pub status: Status,
    pub afk: bool,
}

/// Gateway connection settings
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base websocket URL, without query string
    pub url: String,
    pub version: u8,
    /// Unacknowledged heartbeats tolerated before the connection is declared dead
    pub max_missed_acks: Option<u32>,
}

impl GatewayConfig {
    /// Full connect URL: `<base>?v=<version>&encoding=json`
    #[must_use]
    pub fn connect_url(&self) -> String {
        format!("{}?v={}&encoding=json", self.url, self.version)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: default_gateway_url(),
            version: default_gateway_version(),
            max_missed_acks: Some(default_max_missed_acks()),
        }
    }
}

/// REST API settings
#[derive(Debug, Clone)]
pub struct RestConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl RestConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: default_rest_base_url(),
            timeout_secs: default_rest_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "gateway-bot".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_gateway_url() -> String {
    "wss://gateway.discord.gg/".to_string()
}

fn default_gateway_version() -> u8 {
    10
}

fn default_max_missed_acks() -> u32 {
    2
}

fn default_rest_base_url() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_rest_timeout_secs() -> u64 {
    15
}

fn default_user_agent() -> String {
    format!(
        "DiscordBot ({}, {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if `BOT_TOKEN` is missing or a value cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token_kind = match var("BOT_TOKEN_KIND") {
            Some(kind) => match kind.to_lowercase().as_str() {
                "bot" => TokenKind::Bot,
                "bearer" => TokenKind::Bearer,
                _ => return Err(ConfigError::InvalidValue("BOT_TOKEN_KIND", kind)),
            },
            None => TokenKind::Bot,
        };

        Ok(Self {
            app: AppSettings {
                name: var("APP_NAME").unwrap_or_else(default_app_name),
                env: var("APP_ENV")
                    .and_then(|s| match s.to_lowercase().as_str() {
                        "production" => Some(Environment::Production),
                        "staging" => Some(Environment::Staging),
                        "development" => Some(Environment::Development),
                        _ => None,
                    })
                    .unwrap_or_default(),
            },
            bot: BotConfig {
                token: BotToken::new(
                    var("BOT_TOKEN").ok_or(ConfigError::MissingVar("BOT_TOKEN"))?,
                    token_kind,
                ),
                intents: match var("BOT_INTENTS") {
                    Some(raw) => parse_intents(&raw)?,
                    None => Intents::default(),
                },
                status: match var("BOT_STATUS") {
                    Some(raw) => raw
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("BOT_STATUS", raw))?,
                    None => Status::default(),
                },
                afk: parse_or("BOT_AFK", var("BOT_AFK"), false)?,
            },
            gateway: GatewayConfig {
                url: var("GATEWAY_URL").unwrap_or_else(default_gateway_url),
                version: parse_or(
                    "GATEWAY_VERSION",
                    var("GATEWAY_VERSION"),
                    default_gateway_version(),
                )?,
                max_missed_acks: match parse_or(
                    "GATEWAY_MAX_MISSED_ACKS",
                    var("GATEWAY_MAX_MISSED_ACKS"),
                    default_max_missed_acks(),
                )? {
                    0 => None,
                    n => Some(n),
                },
            },
            rest: RestConfig {
                base_url: var("REST_BASE_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or_else(default_rest_base_url),
                timeout_secs: parse_or(
                    "REST_TIMEOUT_SECS",
                    var("REST_TIMEOUT_SECS"),
                    default_rest_timeout_secs(),
                )?,
                user_agent: var("REST_USER_AGENT").unwrap_or_else(default_user_agent),
            },
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(default),
    }
}

/// Intents as a preset name, a raw integer, or a `|`-separated mix of both
fn parse_intents(raw: &str) -> Result<Intents, ConfigError> {
    raw.split('|')
        .map(str::trim)
        .try_fold(Intents::empty(), |acc, part| {
            let intents = match Intents::preset(part) {
                Some(preset) => preset,
                None => part
                    .parse::<u64>()
                    .ok()
                    .and_then(Intents::from_bits)
                    .ok_or_else(|| ConfigError::InvalidValue("BOT_INTENTS", raw.to_string()))?,
            };
            Ok(acc | intents)
        })
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
