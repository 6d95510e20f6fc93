//! Subscriber setup for the bot process
//!
//! `RUST_LOG` wins when set. Otherwise the filter is built from
//! [`TracingConfig`], with the websocket/HTTP stack held at `warn`.

use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

use crate::config::Environment;

/// Transport crates that log every frame and handshake at debug/trace
const NOISY_TARGETS: &[&str] = &[
    "tungstenite",
    "tokio_tungstenite",
    "reqwest",
    "hyper",
    "hyper_util",
    "rustls",
];

/// How log output is filtered and rendered
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level for the bot's own targets when `RUST_LOG` is unset
    pub level: Level,
    /// One JSON object per line instead of human readable text
    pub json: bool,
    /// Log span open/close (session and dispatch spans)
    pub span_events: bool,
    /// Source location on every line
    pub file_line: bool,
    /// Hold the websocket/HTTP crates at `warn`
    pub quiet_transport: bool,
    pub target: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json: false,
            span_events: false,
            file_line: false,
            quiet_transport: true,
            target: true,
        }
    }
}

impl TracingConfig {
    /// Debug level, span events and source locations; transport crates stay quiet
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            span_events: true,
            file_line: true,
            ..Self::default()
        }
    }

    /// JSON at info for log shippers
    #[must_use]
    pub fn production() -> Self {
        Self {
            json: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn for_environment(env: Environment) -> Self {
        match env {
            Environment::Development => Self::development(),
            Environment::Staging => Self::default(),
            Environment::Production => Self::production(),
        }
    }

    /// Filter directives used when `RUST_LOG` is unset, e.g. `debug,tungstenite=warn`
    pub fn directives(&self) -> String {
        let mut directives = self.level.to_string().to_lowercase();
        if self.quiet_transport {
            for target in NOISY_TARGETS {
                directives.push_str(&format!(",{target}=warn"));
            }
        }
        directives
    }

    fn span_events(&self) -> FmtSpan {
        if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.directives()))
    }
}

/// Install the default subscriber
///
/// # Panics
/// If a global subscriber is already installed.
pub fn init_tracing() {
    init_tracing_with_config(TracingConfig::default());
}

/// # Panics
/// If a global subscriber is already installed.
pub fn init_tracing_with_config(config: TracingConfig) {
    if let Err(e) = install(&config) {
        panic!("failed to install tracing subscriber: {e}");
    }
}

/// Install the default subscriber unless one is already set
pub fn try_init_tracing() -> Result<(), TracingError> {
    try_init_tracing_with_config(TracingConfig::default())
}

pub fn try_init_tracing_with_config(config: TracingConfig) -> Result<(), TracingError> {
    install(&config).map_err(|_| TracingError::AlreadyInitialized)
}

fn install(config: &TracingConfig) -> Result<(), TryInitError> {
    let registry = tracing_subscriber::registry().with(config.env_filter());
    let layer = fmt::layer()
        .with_file(config.file_line)
        .with_line_number(config.file_line)
        .with_target(config.target)
        .with_span_events(config.span_events());

    if config.json {
        registry.with(layer.json().with_current_span(true)).try_init()
    } else {
        registry.with(layer).try_init()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("A global tracing subscriber is already installed")]
    AlreadyInitialized,
}
