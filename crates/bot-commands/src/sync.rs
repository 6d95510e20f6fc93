//! Command synchronization
//!
//! Reconciles the local registry with the remote one: create what is missing
//! remotely, then delete remote commands nothing local declares. Commands on
//! both sides are left alone, even if their metadata differs.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use bot_core::{
    CommandDeclaration, CommandKey, Incident, IncidentKind, IncidentSink, RemoteCommand, Snowflake,
};
use bot_gateway::{EventHandler, EventListener, GatewayEventType, GatewayMessage, HandlerResult};
use bot_rest::{ApplicationCommandsApi, RestError, RestTransport};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::CommandError;
use crate::registry::CommandRegistry;
use crate::router::InvocationRouter;

/// Remote command registry
#[async_trait]
pub trait CommandStore: Send + Sync {
    async fn fetch(&self) -> Result<Vec<RemoteCommand>, RestError>;

    async fn create(&self, command: &CommandDeclaration) -> Result<RemoteCommand, RestError>;

    async fn delete(&self, command: &RemoteCommand) -> Result<(), RestError>;
}

#[async_trait]
impl CommandStore for ApplicationCommandsApi {
    async fn fetch(&self) -> Result<Vec<RemoteCommand>, RestError> {
        self.list().await
    }

    async fn create(&self, command: &CommandDeclaration) -> Result<RemoteCommand, RestError> {
        ApplicationCommandsApi::create(self, command).await
    }

    async fn delete(&self, command: &RemoteCommand) -> Result<(), RestError> {
        ApplicationCommandsApi::delete(self, command.id).await
    }
}

/// Outcome of one synchronization run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: Vec<CommandKey>,
    pub deleted: Vec<CommandKey>,
    pub unchanged: Vec<CommandKey>,
    /// Commands whose create or delete failed, with the reason
    pub failures: Vec<(CommandKey, String)>,
    /// Why the run stopped early; steps already taken are still listed
    pub aborted: Option<String>,
}

impl SyncReport {
    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    /// Every step ran and none failed
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.is_aborted()
    }
}

/// Run one reconciliation pass
///
/// Individual create/delete failures are reported and skipped. A failed
/// fetch stops the run there, since there is nothing to compare against;
/// the report then carries the reason in `aborted`.
pub async fn synchronize(
    registry: &CommandRegistry,
    store: &dyn CommandStore,
    incidents: &dyn IncidentSink,
) -> SyncReport {
    let mut report = SyncReport::default();
    if let Err(e) = reconcile(registry, store, incidents, &mut report).await {
        warn!(error = %e, created = report.created.len(), "Command synchronization aborted");
        report.aborted = Some(e.to_string());
        return report;
    }

    info!(
        created = report.created.len(),
        deleted = report.deleted.len(),
        unchanged = report.unchanged.len(),
        failed = report.failures.len(),
        "Commands synchronized"
    );
    report
}

async fn reconcile(
    registry: &CommandRegistry,
    store: &dyn CommandStore,
    incidents: &dyn IncidentSink,
    report: &mut SyncReport,
) -> Result<(), CommandError> {
    let remote = fetch(store, incidents).await?;
    let remote_keys: BTreeSet<CommandKey> = remote.iter().map(RemoteCommand::key).collect();

    for declaration in registry.declarations() {
        let key = declaration.key();
        if remote_keys.contains(&key) {
            report.unchanged.push(key);
            continue;
        }

        match store.create(declaration).await {
            Ok(created) => {
                info!(command = %key, id = %created.id, "Command created");
                report.created.push(key);
            }
            Err(e) => {
                failed(incidents, report, key, "create", &e);
            }
        }
    }

    // Refetch so the delete pass sees what the creates produced
    let remote = fetch(store, incidents).await?;
    for command in remote {
        let key = command.key();
        if registry.contains(&key) {
            continue;
        }

        match store.delete(&command).await {
            Ok(()) => {
                info!(command = %key, id = %command.id, "Command deleted");
                report.deleted.push(key);
            }
            Err(e) => {
                failed(incidents, report, key, "delete", &e);
            }
        }
    }
    Ok(())
}

async fn fetch(
    store: &dyn CommandStore,
    incidents: &dyn IncidentSink,
) -> Result<Vec<RemoteCommand>, CommandError> {
    store.fetch().await.map_err(|e| {
        incidents.report(
            Incident::new(IncidentKind::SyncError, format!("fetch failed: {e}"))
                .with_subject("commands"),
        );
        CommandError::Rest(e)
    })
}

fn failed(
    incidents: &dyn IncidentSink,
    report: &mut SyncReport,
    key: CommandKey,
    action: &str,
    error: &RestError,
) {
    warn!(command = %key, action, error = %error, "Command sync step failed");
    incidents.report(
        Incident::new(IncidentKind::SyncError, format!("{action} failed: {error}"))
            .with_subject(key.to_string()),
    );
    report.failures.push((key, format!("{action}: {error}")));
}

type StoreFactory = dyn Fn(Snowflake) -> Arc<dyn CommandStore> + Send + Sync;

/// Runs synchronization on the first READY, then starts routing invocations
///
/// Registered on READY. The run happens in its own task so later events
/// keep flowing, and happens at most once per handler.
pub struct CommandSyncHandler {
    registry: Arc<CommandRegistry>,
    store_for: Arc<StoreFactory>,
    router: Arc<InvocationRouter>,
    listener: Weak<EventListener>,
    incidents: Arc<dyn IncidentSink>,
    started: AtomicBool,
    report: Arc<watch::Sender<Option<SyncReport>>>,
}

impl CommandSyncHandler {
    pub fn new<F>(
        registry: Arc<CommandRegistry>,
        store_for: F,
        router: Arc<InvocationRouter>,
        listener: &Arc<EventListener>,
        incidents: Arc<dyn IncidentSink>,
    ) -> Self
    where
        F: Fn(Snowflake) -> Arc<dyn CommandStore> + Send + Sync + 'static,
    {
        let (report, _) = watch::channel(None);
        Self {
            registry,
            store_for: Arc::new(store_for),
            router,
            listener: Arc::downgrade(listener),
            incidents,
            started: AtomicBool::new(false),
            report: Arc::new(report),
        }
    }

    /// Synchronize through the REST application-commands resource
    pub fn over_rest(
        registry: Arc<CommandRegistry>,
        rest: Arc<dyn RestTransport>,
        router: Arc<InvocationRouter>,
        listener: &Arc<EventListener>,
        incidents: Arc<dyn IncidentSink>,
    ) -> Self {
        Self::new(
            registry,
            move |application_id| -> Arc<dyn CommandStore> {
                Arc::new(ApplicationCommandsApi::new(rest.clone(), application_id))
            },
            router,
            listener,
            incidents,
        )
    }

    /// Report of the finished or aborted run; `None` until it ends
    pub fn reports(&self) -> watch::Receiver<Option<SyncReport>> {
        self.report.subscribe()
    }
}

#[async_trait]
impl EventHandler for CommandSyncHandler {
    async fn handle(&self, event: Arc<GatewayMessage>) -> HandlerResult {
        let Some(ready) = event.as_ready() else {
            return Err(bot_gateway::HandlerError::failed("READY without application id"));
        };
        if self.started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let registry = self.registry.clone();
        let store = (self.store_for)(ready.application.id);
        let router = self.router.clone();
        let listener = self.listener.clone();
        let incidents = self.incidents.clone();
        let report = self.report.clone();

        tokio::spawn(async move {
            let outcome = synchronize(&registry, store.as_ref(), incidents.as_ref()).await;

            // Route even after an aborted run; commands from earlier runs may still exist remotely
            if let Some(listener) = listener.upgrade() {
                listener.on_shared(GatewayEventType::InteractionCreate, router);
            }
            report.send_replace(Some(outcome));
        });

        Ok(())
    }
}
