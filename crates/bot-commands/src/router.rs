//! Invocation router
//!
//! Turns INTERACTION_CREATE dispatches into command handler calls.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use bot_core::{Incident, IncidentKind, IncidentSink, Interaction};
use bot_gateway::{panic_message, EventHandler, GatewayMessage, HandlerResult};
use futures::FutureExt;
use tracing::{debug, info};

use crate::args::CommandArgs;
use crate::context::{InteractionResponder, InvocationContext};
use crate::registry::CommandRegistry;

/// What happened to one interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The handler ran and returned `Ok`
    Handled,
    /// The handler returned an error or panicked
    Failed,
    UnknownCommand,
    /// Not an application-command interaction
    Ignored,
}

pub struct InvocationRouter {
    registry: Arc<CommandRegistry>,
    responder: Arc<dyn InteractionResponder>,
    incidents: Arc<dyn IncidentSink>,
}

impl InvocationRouter {
    pub fn new(
        registry: Arc<CommandRegistry>,
        responder: Arc<dyn InteractionResponder>,
        incidents: Arc<dyn IncidentSink>,
    ) -> Self {
        Self {
            registry,
            responder,
            incidents,
        }
    }

    /// Find and run the handler for `interaction`
    ///
    /// Failures are reported to the incident sink, never returned.
    pub async fn route(&self, interaction: Interaction) -> RouteOutcome {
        let Some(data) = interaction.command_data() else {
            debug!(kind = ?interaction.kind, "Non-command interaction ignored");
            return RouteOutcome::Ignored;
        };

        let key = data.key();
        let Some(command) = self.registry.get(&key) else {
            self.incidents.report(
                Incident::new(IncidentKind::NoSuchCommand, "no local handler for invoked command")
                    .with_subject(key.to_string()),
            );
            return RouteOutcome::UnknownCommand;
        };

        let args = CommandArgs::from_data(data);
        let handler = command.handler.clone();
        let ctx = InvocationContext::new(Arc::new(interaction), self.responder.clone());

        info!(command = %key, interaction_id = %ctx.interaction_id(), "Command invoked");

        let detail = match AssertUnwindSafe(handler.invoke(ctx, args))
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => return RouteOutcome::Handled,
            Ok(Err(e)) => e.to_string(),
            Err(panic) => panic_message(&*panic),
        };

        self.incidents
            .report(Incident::new(IncidentKind::HandlerError, detail).with_subject(key.to_string()));
        RouteOutcome::Failed
    }
}

#[async_trait]
impl EventHandler for InvocationRouter {
    async fn handle(&self, event: Arc<GatewayMessage>) -> HandlerResult {
        let interaction: Interaction = serde_json::from_value(event.d.clone())?;
        self.route(interaction).await;
        Ok(())
    }
}
