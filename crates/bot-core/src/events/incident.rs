//! Incident reports
//!
//! The gateway session and the command layer never let a single bad frame,
//! a missing command or a failing handler take the bot down. Instead they
//! hand an [`Incident`] to the host-supplied [`IncidentSink`].

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Incident taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentKind {
    /// Could not open the connection
    Connection,
    /// Connection dropped, closed by the remote side, or went zombie
    ConnectionLost,
    /// Write on a closed connection
    Send,
    /// Inbound frame that is not a valid envelope, skipped
    DecodeSkip,
    /// Invocation for a command that is not registered locally
    NoSuchCommand,
    /// An event or command handler returned an error or panicked
    HandlerError,
    /// A remote command operation failed during reconciliation
    SyncError,
}

impl IncidentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connection => "CONNECTION",
            Self::ConnectionLost => "CONNECTION_LOST",
            Self::Send => "SEND",
            Self::DecodeSkip => "DECODE_SKIP",
            Self::NoSuchCommand => "NO_SUCH_COMMAND",
            Self::HandlerError => "HANDLER_ERROR",
            Self::SyncError => "SYNC_ERROR",
        }
    }

    /// Whether the session cannot continue after this incident
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Connection | Self::ConnectionLost)
    }
}

impl fmt::Display for IncidentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reported failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub kind: IncidentKind,
    /// Offending identifier: event name, command key, close code...
    pub subject: Option<String>,
    pub detail: String,
    pub occurred_at: DateTime<Utc>,
}

impl Incident {
    pub fn new(kind: IncidentKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            subject: None,
            detail: detail.into(),
            occurred_at: Utc::now(),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

impl fmt::Display for Incident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subject {
            Some(subject) => write!(f, "[{}] {}: {}", self.kind, subject, self.detail),
            None => write!(f, "[{}] {}", self.kind, self.detail),
        }
    }
}

/// Receiver of incident reports
///
/// Called inline from the session loops, so implementations must not block.
pub trait IncidentSink: Send + Sync {
    fn report(&self, incident: Incident);
}

impl<T: IncidentSink + ?Sized> IncidentSink for Arc<T> {
    fn report(&self, incident: Incident) {
        (**self).report(incident);
    }
}

/// Default sink: logs every incident through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl IncidentSink for TracingSink {
    fn report(&self, incident: Incident) {
        let subject = incident.subject.as_deref().unwrap_or("-");
        match incident.kind {
            IncidentKind::Connection | IncidentKind::ConnectionLost | IncidentKind::HandlerError => {
                tracing::error!(
                    kind = %incident.kind,
                    subject,
                    detail = %incident.detail,
                    "incident"
                );
            }
            IncidentKind::Send | IncidentKind::NoSuchCommand | IncidentKind::SyncError => {
                tracing::warn!(
                    kind = %incident.kind,
                    subject,
                    detail = %incident.detail,
                    "incident"
                );
            }
            IncidentKind::DecodeSkip => {
                tracing::debug!(
                    kind = %incident.kind,
                    subject,
                    detail = %incident.detail,
                    "incident"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<Incident>>);

    impl IncidentSink for Collect {
        fn report(&self, incident: Incident) {
            self.0.lock().unwrap().push(incident);
        }
    }

    #[test]
    fn test_incident_display() {
        let incident =
            Incident::new(IncidentKind::NoSuchCommand, "not registered").with_subject("chat-input:ping");
        assert_eq!(
            incident.to_string(),
            "[NO_SUCH_COMMAND] chat-input:ping: not registered"
        );

        let incident = Incident::new(IncidentKind::DecodeSkip, "expected value");
        assert_eq!(incident.to_string(), "[DECODE_SKIP] expected value");
    }

    #[test]
    fn test_sink_through_arc() {
        let sink = Arc::new(Collect::default());
        let dyn_sink: Arc<dyn IncidentSink> = sink.clone();
        dyn_sink.report(Incident::new(IncidentKind::SyncError, "boom"));
        TracingSink.report(Incident::new(IncidentKind::HandlerError, "ignored"));

        let seen = sink.0.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].kind, IncidentKind::SyncError);
    }

    #[test]
    fn test_fatal_kinds() {
        assert!(IncidentKind::ConnectionLost.is_fatal());
        assert!(!IncidentKind::DecodeSkip.is_fatal());
        assert_eq!(
            serde_json::to_string(&IncidentKind::HandlerError).unwrap(),
            "\"HANDLER_ERROR\""
        );
    }
}
