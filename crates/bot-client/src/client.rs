//! Client facade
//!
//! Wires a gateway session, the event listener, the REST client and the
//! command machinery together.

use std::sync::Arc;

use bot_commands::{
    CommandHandler, CommandRegistry, CommandSyncHandler, InvocationRouter, SyncReport,
};
use bot_common::{AppConfig, BotToken, GatewayConfig, RestConfig};
use bot_core::{CommandDeclaration, IncidentSink, Intents, Presence, Snowflake, TracingSink};
use bot_gateway::{
    Connector, EventHandler, EventListener, GatewayEventType, GatewaySession, SessionOptions,
};
use bot_rest::{ChannelsApi, InteractionsApi, Message, RestClient, RestTransport};
use tokio::sync::watch;
use tracing::info;

use crate::error::ClientError;

/// Builder for [`Client`]
pub struct ClientBuilder {
    options: SessionOptions,
    rest_config: RestConfig,
    registry: CommandRegistry,
    handlers: Vec<(GatewayEventType, Arc<dyn EventHandler>)>,
    incidents: Arc<dyn IncidentSink>,
    connector: Option<Arc<dyn Connector>>,
    rest: Option<Arc<dyn RestTransport>>,
}

impl ClientBuilder {
    pub fn new(token: BotToken) -> Self {
        Self::with_parts(
            SessionOptions::new(GatewayConfig::default().connect_url(), token),
            RestConfig::default(),
        )
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::with_parts(SessionOptions::from_config(config), config.rest.clone())
    }

    fn with_parts(options: SessionOptions, rest_config: RestConfig) -> Self {
        Self {
            options,
            rest_config,
            registry: CommandRegistry::new(),
            handlers: Vec::new(),
            incidents: Arc::new(TracingSink),
            connector: None,
            rest: None,
        }
    }

    /// Replace the requested intents
    ///
    /// Intents needed by registered handlers are still added on build.
    pub fn intents(mut self, intents: Intents) -> Self {
        self.options.intents = intents;
        self
    }

    pub fn presence(mut self, presence: Presence) -> Self {
        self.options.presence = presence;
        self
    }

    /// Full gateway URL, query string included
    pub fn gateway_url(mut self, url: impl Into<String>) -> Self {
        self.options.url = url.into();
        self
    }

    pub fn max_missed_acks(mut self, limit: Option<u32>) -> Self {
        self.options.max_missed_acks = limit;
        self
    }

    pub fn rest_config(mut self, config: RestConfig) -> Self {
        self.rest_config = config;
        self
    }

    pub fn incident_sink(mut self, incidents: Arc<dyn IncidentSink>) -> Self {
        self.incidents = incidents;
        self
    }

    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn rest_transport(mut self, rest: Arc<dyn RestTransport>) -> Self {
        self.rest = Some(rest);
        self
    }

    /// Handle a dispatch event
    pub fn on<H>(mut self, event: impl Into<GatewayEventType>, handler: H) -> Self
    where
        H: EventHandler + 'static,
    {
        self.handlers.push((event.into(), Arc::new(handler)));
        self
    }

    /// Declare an application command and its handler
    pub fn command<H>(mut self, declaration: CommandDeclaration, handler: H) -> Result<Self, ClientError>
    where
        H: CommandHandler + 'static,
    {
        self.registry.add(declaration, handler)?;
        Ok(self)
    }

    pub fn build(self) -> Result<Client, ClientError> {
        let mut options = self.options;
        for (event, _) in &self.handlers {
            options.intents |= Intents::required_for(event.as_str());
        }

        let listener = Arc::new(EventListener::new(self.incidents.clone()));
        for (event, handler) in self.handlers {
            listener.on_shared(event, handler);
        }

        let rest: Arc<dyn RestTransport> = match self.rest {
            Some(rest) => rest,
            None => Arc::new(RestClient::new(&self.rest_config, &options.token)?),
        };

        let mut sync_reports = None;
        if !self.registry.is_empty() {
            let registry = Arc::new(self.registry);
            let router = Arc::new(InvocationRouter::new(
                registry.clone(),
                Arc::new(InteractionsApi::new(rest.clone())),
                self.incidents.clone(),
            ));
            let sync = CommandSyncHandler::over_rest(
                registry,
                rest.clone(),
                router,
                &listener,
                self.incidents.clone(),
            );
            sync_reports = Some(sync.reports());
            listener.on(GatewayEventType::Ready, sync);
        }

        let mut session = GatewaySession::new(options, listener.clone())
            .with_incident_sink(self.incidents);
        if let Some(connector) = self.connector {
            session = session.with_connector(connector);
        }

        Ok(Client {
            session: Arc::new(session),
            listener,
            rest,
            sync_reports,
        })
    }
}

/// A bot connected to one gateway session
pub struct Client {
    session: Arc<GatewaySession>,
    listener: Arc<EventListener>,
    rest: Arc<dyn RestTransport>,
    sync_reports: Option<watch::Receiver<Option<SyncReport>>>,
}

impl Client {
    pub fn builder(token: BotToken) -> ClientBuilder {
        ClientBuilder::new(token)
    }

    pub fn from_config(config: &AppConfig) -> ClientBuilder {
        ClientBuilder::from_config(config)
    }

    /// Run the session until it ends or is shut down
    pub async fn run(&self) -> Result<(), ClientError> {
        info!(
            events = ?self.listener.registered_events(),
            "Starting client"
        );
        self.session.run().await?;
        info!("Client stopped");
        Ok(())
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            session: self.session.clone(),
        }
    }

    /// Register a handler while running
    pub fn on<H>(&self, event: impl Into<GatewayEventType>, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.listener.on(event, handler);
    }

    pub async fn update_presence(&self, presence: Presence) -> Result<(), ClientError> {
        self.session.update_presence(presence).await?;
        Ok(())
    }

    /// Post a text message to a channel over REST
    pub async fn send_message(
        &self,
        channel_id: Snowflake,
        content: impl Into<String>,
    ) -> Result<Message, ClientError> {
        let message = ChannelsApi::new(self.rest.clone())
            .create_message(channel_id, content)
            .await?;
        Ok(message)
    }

    pub fn session(&self) -> &Arc<GatewaySession> {
        &self.session
    }

    pub fn rest(&self) -> &Arc<dyn RestTransport> {
        &self.rest
    }

    /// Outcome of command synchronization, when commands were declared
    pub fn sync_reports(&self) -> Option<watch::Receiver<Option<SyncReport>>> {
        self.sync_reports.clone()
    }
}

/// Stops a running [`Client`] from elsewhere
#[derive(Clone)]
pub struct ShutdownHandle {
    session: Arc<GatewaySession>,
}

impl ShutdownHandle {
    pub async fn shutdown(&self) {
        info!("Shutdown requested");
        self.session.disconnect().await;
    }

    pub fn is_running(&self) -> bool {
        self.session.is_running()
    }
}
