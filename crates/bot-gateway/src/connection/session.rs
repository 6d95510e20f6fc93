//! Gateway session
//!
//! One connection's lifetime: connect, wait for Hello, Identify, then run the
//! heartbeat and receive loops side by side until either ends or
//! [`GatewaySession::disconnect`] is called. A session runs once; open a new
//! one to reconnect.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bot_common::{AppConfig, BotToken};
use bot_core::{Incident, IncidentKind, IncidentSink, Intents, Presence, Snowflake, TracingSink};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace, warn};

use super::connector::{Connector, WsConnector};
use super::transport::{Inbound, Transport};
use crate::error::GatewayError;
use crate::events::EventListener;
use crate::protocol::{
    GatewayMessage, HelloPayload, IdentifyPayload, IdentifyProperties, OpCode,
    PresenceUpdatePayload, ReadyPayload,
};

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Connecting,
    AwaitingHello,
    Identifying,
    Active,
    Closing,
    /// Terminal
    Closed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::AwaitingHello => "awaiting_hello",
            Self::Identifying => "identifying",
            Self::Active => "active",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }

    fn is_shutting_down(self) -> bool {
        matches!(self, Self::Closing | Self::Closed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the session announces and how strict it is about liveness
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Full connect URL including `?v=..&encoding=json`
    pub url: String,
    pub token: BotToken,
    pub intents: Intents,
    pub properties: IdentifyProperties,
    pub presence: Presence,
    /// Unacknowledged heartbeats tolerated; `None` disables the check
    pub max_missed_acks: Option<u32>,
}

impl SessionOptions {
    pub fn new(url: impl Into<String>, token: BotToken) -> Self {
        Self {
            url: url.into(),
            token,
            intents: Intents::default(),
            properties: IdentifyProperties::default(),
            presence: Presence::default(),
            max_missed_acks: Some(2),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            url: config.gateway.connect_url(),
            token: config.bot.token.clone(),
            intents: config.bot.intents,
            properties: IdentifyProperties::default(),
            presence: Presence::now(config.bot.status).with_afk(config.bot.afk),
            max_missed_acks: config.gateway.max_missed_acks,
        }
    }

    #[must_use]
    pub fn with_intents(mut self, intents: Intents) -> Self {
        self.intents = intents;
        self
    }

    #[must_use]
    pub fn with_presence(mut self, presence: Presence) -> Self {
        self.presence = presence;
        self
    }

    #[must_use]
    pub fn with_max_missed_acks(mut self, limit: Option<u32>) -> Self {
        self.max_missed_acks = limit;
        self
    }
}

/// A single gateway connection
pub struct GatewaySession {
    options: SessionOptions,
    connector: Arc<dyn Connector>,
    listener: Arc<EventListener>,
    incidents: Arc<dyn IncidentSink>,

    state: RwLock<SessionState>,
    /// Present from connect until the connection is closed
    transport: RwLock<Option<Arc<dyn Transport>>>,
    running: AtomicBool,
    identified: AtomicBool,
    shutdown: watch::Sender<bool>,

    /// Last sequence number seen on an inbound frame
    sequence: Mutex<Option<u64>>,
    awaiting_ack: AtomicBool,
    missed_acks: AtomicU32,
    heartbeats_sent: AtomicU64,

    presence: RwLock<Presence>,
    ready: RwLock<Option<ReadyPayload>>,
}

impl GatewaySession {
    pub fn new(options: SessionOptions, listener: Arc<EventListener>) -> Self {
        let (shutdown, _) = watch::channel(false);
        let presence = options.presence.clone();
        Self {
            options,
            connector: Arc::new(WsConnector),
            listener,
            incidents: Arc::new(TracingSink),
            state: RwLock::new(SessionState::Idle),
            transport: RwLock::new(None),
            running: AtomicBool::new(false),
            identified: AtomicBool::new(false),
            shutdown,
            sequence: Mutex::new(None),
            awaiting_ack: AtomicBool::new(false),
            missed_acks: AtomicU32::new(0),
            heartbeats_sent: AtomicU64::new(0),
            presence: RwLock::new(presence),
            ready: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    #[must_use]
    pub fn with_incident_sink(mut self, incidents: Arc<dyn IncidentSink>) -> Self {
        self.incidents = incidents;
        self
    }

    // === Accessors ===

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn sequence(&self) -> Option<u64> {
        *self.sequence.lock()
    }

    pub fn heartbeats_sent(&self) -> u64 {
        self.heartbeats_sent.load(Ordering::SeqCst)
    }

    pub fn listener(&self) -> &Arc<EventListener> {
        &self.listener
    }

    /// READY payload, once received
    pub fn ready(&self) -> Option<ReadyPayload> {
        self.ready.read().clone()
    }

    pub fn application_id(&self) -> Option<Snowflake> {
        self.ready.read().as_ref().map(|r| r.application.id)
    }

    pub fn presence(&self) -> Presence {
        self.presence.read().clone()
    }

    /// Move forward unless a shutdown already began
    fn advance(&self, next: SessionState) {
        let mut state = self.state.write();
        if !state.is_shutting_down() {
            debug!(from = %*state, to = %next, "Session state changed");
            *state = next;
        }
    }

    fn transport(&self) -> Option<Arc<dyn Transport>> {
        self.transport.read().clone()
    }

    /// Receiver for [`stopped`]; take one per loop, not per iteration
    fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    // === Lifecycle ===

    /// Connect, identify and process frames until the connection ends
    ///
    /// Returns `Ok(())` when stopped through [`disconnect`](Self::disconnect).
    pub async fn run(&self) -> Result<(), GatewayError> {
        {
            let mut state = self.state.write();
            if *state != SessionState::Idle {
                return Err(GatewayError::AlreadyStarted);
            }
            *state = SessionState::Connecting;
            self.running.store(true, Ordering::SeqCst);
        }

        let result = self.run_connected().await;

        if let Err(e) = &result {
            self.incidents.report(
                Incident::new(incident_kind(e), e.to_string()).with_subject(self.options.url.clone()),
            );
        }
        self.finish().await;
        result
    }

    async fn run_connected(&self) -> Result<(), GatewayError> {
        info!(url = %self.options.url, "Connecting to gateway");
        let mut shutdown = self.shutdown_signal();
        let transport: Arc<dyn Transport> = Arc::from(self.connector.connect(&self.options.url).await?);
        *self.transport.write() = Some(transport);

        // disconnect() raced the connect; finish() closes what was just stored
        if !self.is_running() {
            return Ok(());
        }

        self.advance(SessionState::AwaitingHello);
        let hello = tokio::select! {
            hello = self.await_hello() => hello?,
            () = stopped(&mut shutdown) => return Ok(()),
        };
        if hello.heartbeat_interval == 0 {
            return Err(GatewayError::Protocol("heartbeat interval of zero".to_string()));
        }
        let interval = Duration::from_millis(hello.heartbeat_interval);
        debug!(interval_ms = hello.heartbeat_interval, "Hello received");

        self.advance(SessionState::Identifying);
        self.identify().await?;
        self.advance(SessionState::Active);

        tokio::select! {
            result = self.heartbeat_loop(interval) => result,
            result = self.receive_loop() => result,
            () = stopped(&mut shutdown) => Ok(()),
        }
    }

    async fn await_hello(&self) -> Result<HelloPayload, GatewayError> {
        loop {
            match self.receive().await? {
                Some(message) if message.op == OpCode::Hello => {
                    return message
                        .as_hello()
                        .ok_or_else(|| GatewayError::Protocol("malformed Hello payload".to_string()));
                }
                Some(message) => {
                    warn!(op = %message.op, "Frame before Hello ignored");
                }
                None => {}
            }
        }
    }

    /// Stop both loops and close the connection; safe to call repeatedly
    ///
    /// On a session that never ran this makes it terminal.
    pub async fn disconnect(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.shutdown.send_replace(true);
        self.finish().await;
    }

    /// Close the connection exactly once and mark the session closed
    ///
    /// Also closes a transport stored after an earlier call already marked
    /// the session closed (disconnect during connect).
    async fn finish(&self) {
        {
            let mut state = self.state.write();
            self.running.store(false, Ordering::SeqCst);
            if *state != SessionState::Closed {
                *state = SessionState::Closing;
            }
        }

        // Whoever takes the transport closes it
        let transport = self.transport.write().take();
        if let Some(transport) = transport {
            if let Err(e) = transport.close().await {
                debug!(error = %e, "Close handshake failed");
            }
            info!("Gateway connection closed");
        }

        *self.state.write() = SessionState::Closed;
    }

    // === Frames ===

    /// Send one envelope
    pub async fn send(&self, message: &GatewayMessage) -> Result<(), GatewayError> {
        let transport = self
            .transport()
            .ok_or_else(|| GatewayError::Send("connection is closed".to_string()))?;

        transport.send(message.to_json()?).await?;
        trace!(op = %message.op, "Frame sent");
        Ok(())
    }

    /// Next inbound envelope
    ///
    /// `Ok(None)` for control frames and for frames that are not valid
    /// envelopes; the latter are reported as skipped.
    pub async fn receive(&self) -> Result<Option<GatewayMessage>, GatewayError> {
        let transport = self
            .transport()
            .ok_or_else(|| GatewayError::lost("connection is closed"))?;

        match transport.receive().await? {
            Inbound::Text(text) => match GatewayMessage::from_json(&text) {
                Ok(message) => {
                    trace!(op = %message.op, seq = ?message.s, event = ?message.t, "Frame received");
                    Ok(Some(message))
                }
                Err(e) => {
                    self.incidents
                        .report(Incident::new(IncidentKind::DecodeSkip, e.to_string()));
                    Ok(None)
                }
            },
            Inbound::Control => Ok(None),
        }
    }

    /// Send Identify; only the first call goes out
    pub async fn identify(&self) -> Result<(), GatewayError> {
        if self.identified.swap(true, Ordering::SeqCst) {
            return Err(GatewayError::Protocol("already identified".to_string()));
        }

        let payload = IdentifyPayload {
            token: self.options.token.expose().to_string(),
            intents: self.options.intents,
            properties: self.options.properties.clone(),
            presence: PresenceUpdatePayload::from(self.presence()),
        };
        self.send(&GatewayMessage::identify(&payload)?).await?;

        info!(intents = %self.options.intents, "Identify sent");
        Ok(())
    }

    /// Announce a new presence (op 3)
    pub async fn update_presence(&self, presence: Presence) -> Result<(), GatewayError> {
        let payload = PresenceUpdatePayload::from(presence.clone());
        self.send(&GatewayMessage::presence_update(&payload)?).await?;
        *self.presence.write() = presence;
        Ok(())
    }

    async fn send_heartbeat(&self) -> Result<(), GatewayError> {
        let seq = self.sequence();
        self.send(&GatewayMessage::heartbeat(seq)).await?;
        self.awaiting_ack.store(true, Ordering::SeqCst);
        self.heartbeats_sent.fetch_add(1, Ordering::SeqCst);
        trace!(seq = ?seq, "Heartbeat sent");
        Ok(())
    }

    /// Count a heartbeat interval that passed without an ack
    fn check_ack(&self) -> Result<(), GatewayError> {
        let Some(limit) = self.options.max_missed_acks else {
            return Ok(());
        };
        if !self.awaiting_ack.load(Ordering::SeqCst) {
            return Ok(());
        }

        let missed = self.missed_acks.fetch_add(1, Ordering::SeqCst) + 1;
        warn!(missed, limit, "Heartbeat not acknowledged");
        if missed >= limit {
            return Err(GatewayError::lost(format!(
                "no heartbeat acknowledgement after {missed} heartbeats"
            )));
        }
        Ok(())
    }

    // === Loops ===

    /// Send a heartbeat, then sleep `interval`, while running
    pub async fn heartbeat_loop(&self, interval: Duration) -> Result<(), GatewayError> {
        let mut shutdown = self.shutdown_signal();
        while self.is_running() {
            self.check_ack()?;
            self.send_heartbeat().await?;

            tokio::select! {
                () = tokio::time::sleep(interval) => {}
                () = stopped(&mut shutdown) => break,
            }
        }
        Ok(())
    }

    /// Receive and handle frames in arrival order while running
    ///
    /// Dispatches are queued to a single worker task that runs the listener
    /// in arrival order, so handlers never hold up acks or heartbeat
    /// requests. The worker drains what was queued and exits once this
    /// loop returns.
    pub async fn receive_loop(&self) -> Result<(), GatewayError> {
        let mut shutdown = self.shutdown_signal();
        let dispatches = spawn_dispatcher(self.listener.clone());

        while self.is_running() {
            let received = tokio::select! {
                received = self.receive() => received,
                () = stopped(&mut shutdown) => break,
            };

            let result = match received {
                Ok(Some(message)) => self.handle_message(message, &dispatches).await,
                Ok(None) => Ok(()),
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                self.running.store(false, Ordering::SeqCst);
                return Err(e);
            }
        }
        Ok(())
    }

    async fn handle_message(
        &self,
        message: GatewayMessage,
        dispatches: &mpsc::UnboundedSender<Arc<GatewayMessage>>,
    ) -> Result<(), GatewayError> {
        if let Some(seq) = message.s {
            *self.sequence.lock() = Some(seq);
        }

        match message.op {
            OpCode::Dispatch => {
                if let Some(ready) = message.as_ready() {
                    info!(
                        session_id = %ready.session_id,
                        user = %ready.user.username,
                        application_id = %ready.application.id,
                        "Session ready"
                    );
                    *self.ready.write() = Some(ready);
                }
                if dispatches.send(Arc::new(message)).is_err() {
                    warn!("Dispatch worker gone; event dropped");
                }
            }
            OpCode::Heartbeat => {
                debug!("Heartbeat requested by remote");
                self.send_heartbeat().await?;
            }
            OpCode::HeartbeatAck => {
                self.awaiting_ack.store(false, Ordering::SeqCst);
                self.missed_acks.store(0, Ordering::SeqCst);
                trace!("Heartbeat acknowledged");
            }
            OpCode::Reconnect => {
                return Err(GatewayError::lost("remote requested a reconnect"));
            }
            OpCode::InvalidSession => {
                let resumable = message.d.as_bool().unwrap_or(false);
                return Err(GatewayError::lost(format!(
                    "session invalidated (resumable: {resumable})"
                )));
            }
            other => {
                debug!(op = %other, "Unexpected op ignored");
            }
        }
        Ok(())
    }
}

/// Resolves once `disconnect` has been called
async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    // Err only if the sender is dropped, which cannot outlive the session
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Single consumer running the listener over queued dispatches in order
fn spawn_dispatcher(listener: Arc<EventListener>) -> mpsc::UnboundedSender<Arc<GatewayMessage>> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Arc<GatewayMessage>>();
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            listener.dispatch(event).await;
        }
        trace!("Dispatch worker finished");
    });
    tx
}

fn incident_kind(error: &GatewayError) -> IncidentKind {
    match error {
        GatewayError::Connection(_) => IncidentKind::Connection,
        GatewayError::Send(_) => IncidentKind::Send,
        _ => IncidentKind::ConnectionLost,
    }
}
