//! Event listener
//!
//! Maps dispatch names to handler lists. Handlers for one event run in
//! registration order, one after another, on the session's dispatch worker;
//! a handler that fails or panics is reported and the next one still runs.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use bot_core::{Incident, IncidentKind, IncidentSink, TracingSink};
use dashmap::DashMap;
use futures::FutureExt;

use super::GatewayEventType;
use crate::error::HandlerResult;
use crate::protocol::GatewayMessage;

/// Handles one dispatched event
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: Arc<GatewayMessage>) -> HandlerResult;
}

#[async_trait]
impl<F, Fut> EventHandler for F
where
    F: Fn(Arc<GatewayMessage>) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    async fn handle(&self, event: Arc<GatewayMessage>) -> HandlerResult {
        (self)(event).await
    }
}

/// Registry of event handlers keyed by dispatch name
pub struct EventListener {
    handlers: DashMap<String, Vec<Arc<dyn EventHandler>>>,
    incidents: Arc<dyn IncidentSink>,
}

impl EventListener {
    pub fn new(incidents: Arc<dyn IncidentSink>) -> Self {
        Self {
            handlers: DashMap::new(),
            incidents,
        }
    }

    /// Append a handler for `event`
    ///
    /// Safe to call while the session is running; takes effect from the
    /// next dispatch of that event.
    pub fn on<H>(&self, event: impl Into<GatewayEventType>, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.on_shared(event, Arc::new(handler));
    }

    pub fn on_shared(&self, event: impl Into<GatewayEventType>, handler: Arc<dyn EventHandler>) {
        let name = String::from(event.into());
        tracing::debug!(event = %name, "Event handler registered");
        self.handlers.entry(name).or_default().push(handler);
    }

    /// Number of handlers registered for `event`
    pub fn handler_count(&self, event: impl Into<GatewayEventType>) -> usize {
        let name = String::from(event.into());
        self.handlers.get(&name).map_or(0, |h| h.len())
    }

    /// Names with at least one handler
    pub fn registered_events(&self) -> Vec<String> {
        self.handlers
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Run every handler registered for the envelope's event name
    ///
    /// Returns the number of handlers that completed successfully.
    pub async fn dispatch(&self, event: Arc<GatewayMessage>) -> usize {
        let Some(name) = event.t.as_deref() else {
            return 0;
        };

        // Snapshot so no map guard is held across an await
        let handlers = match self.handlers.get(name) {
            Some(entry) => entry.value().clone(),
            None => {
                tracing::trace!(event = name, "No handler registered");
                return 0;
            }
        };

        let mut succeeded = 0;
        for handler in handlers {
            match AssertUnwindSafe(handler.handle(event.clone()))
                .catch_unwind()
                .await
            {
                Ok(Ok(())) => succeeded += 1,
                Ok(Err(e)) => {
                    self.incidents.report(
                        Incident::new(IncidentKind::HandlerError, e.to_string()).with_subject(name),
                    );
                }
                Err(panic) => {
                    self.incidents.report(
                        Incident::new(IncidentKind::HandlerError, panic_message(&*panic))
                            .with_subject(name),
                    );
                }
            }
        }
        succeeded
    }
}

impl Default for EventListener {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

/// Best-effort text of a panic payload
pub fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("handler panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("handler panicked: {s}")
    } else {
        "handler panicked".to_string()
    }
}
