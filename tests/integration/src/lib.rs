//! Integration test utilities for the gateway bot client
//!
//! An in-process fake of the remote side (websocket gateway plus the REST
//! routes the client uses), payload fixtures, and small async helpers.

pub mod fake_discord;
pub mod fixtures;
pub mod helpers;

pub use fake_discord::{FakeConfig, FakeDiscord};
pub use fixtures::*;
pub use helpers::*;
