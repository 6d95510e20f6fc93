//! Payload fixtures
//!
//! JSON shapes the remote side sends, reduced to the fields the client reads.

use serde_json::{json, Value};

/// READY dispatch payload for `application_id`
pub fn ready_payload(application_id: u64) -> Value {
    json!({
        "v": 10,
        "user": {"id": "10", "username": "helper", "bot": true},
        "guilds": [],
        "session_id": "fake-session",
        "resume_gateway_url": "ws://127.0.0.1/resume",
        "application": {"id": application_id.to_string(), "flags": 0}
    })
}

/// A command record as the remote registry stores it
pub fn remote_command(id: u64, application_id: u64, name: &str, kind: u8) -> Value {
    json!({
        "id": id.to_string(),
        "application_id": application_id.to_string(),
        "version": "1",
        "type": kind,
        "name": name,
        "description": "registered earlier",
        "options": []
    })
}

/// MESSAGE_CREATE dispatch payload
pub fn message_create(id: u64, content: &str) -> Value {
    json!({
        "id": id.to_string(),
        "channel_id": "33",
        "author": {"id": "42", "username": "alice"},
        "content": content
    })
}

/// INTERACTION_CREATE payload invoking slash command `name`
pub fn slash_invocation(interaction_id: u64, application_id: u64, name: &str, options: Value) -> Value {
    json!({
        "id": interaction_id.to_string(),
        "application_id": application_id.to_string(),
        "type": 2,
        "token": format!("token-{interaction_id}"),
        "channel_id": "33",
        "member": {"user": {"id": "42", "username": "alice"}},
        "data": {
            "id": "777",
            "name": name,
            "type": 1,
            "options": options
        }
    })
}
