//! Value objects - immutable types that represent domain concepts

mod intents;
mod presence;
mod snowflake;

pub use intents::Intents;
pub use presence::{Activity, ActivityKind, Presence, Status};
pub use snowflake::{Snowflake, SnowflakeParseError};
