//! Fake remote side
//!
//! Serves the websocket gateway on `/gateway` and the REST routes under
//! `/api`. The gateway sends Hello on connect and READY after a valid
//! Identify; everything else is driven by the test.

use std::borrow::Cow;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::fixtures::{ready_payload, remote_command};

/// How the fake behaves
#[derive(Debug, Clone)]
pub struct FakeConfig {
    /// Token accepted on Identify and in the REST Authorization header
    pub token: String,
    pub application_id: u64,
    pub heartbeat_interval_ms: u64,
    /// Answer heartbeats with op 11
    pub ack_heartbeats: bool,
    /// Chat-input commands already registered remotely
    pub remote_commands: Vec<String>,
}

impl Default for FakeConfig {
    fn default() -> Self {
        Self {
            token: "test-token".to_string(),
            application_id: 5,
            heartbeat_interval_ms: 45_000,
            ack_heartbeats: true,
            remote_commands: Vec::new(),
        }
    }
}

#[derive(Default)]
struct FakeState {
    config: FakeConfig,
    outbound: Mutex<Option<mpsc::UnboundedSender<Message>>>,
    sequence: AtomicU64,
    next_id: AtomicU64,
    /// Frames received from the client, decoded
    received: Mutex<Vec<Value>>,
    client_closes: AtomicUsize,
    connections: AtomicUsize,
    commands: Mutex<Vec<Value>>,
    rest_calls: Mutex<Vec<String>>,
    callbacks: Mutex<Vec<(String, String, Value)>>,
}

impl FakeState {
    fn send(&self, message: Message) -> Result<()> {
        self.outbound
            .lock()
            .as_ref()
            .ok_or_else(|| anyhow!("no client connected"))?
            .send(message)
            .map_err(|_| anyhow!("client connection gone"))
    }

    fn send_json(&self, frame: &Value) -> Result<()> {
        self.send(Message::Text(frame.to_string()))
    }

    fn dispatch(&self, event: &str, data: Value) -> Result<u64> {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.send_json(&json!({"op": 0, "d": data, "s": seq, "t": event}))?;
        Ok(seq)
    }

    fn authorized(&self, headers: &HeaderMap) -> Result<(), StatusCode> {
        let expected = format!("Bot {}", self.config.token);
        match headers.get("authorization").and_then(|v| v.to_str().ok()) {
            Some(value) if value == expected => Ok(()),
            _ => Err(StatusCode::UNAUTHORIZED),
        }
    }

    fn record(&self, call: String) {
        self.rest_calls.lock().push(call);
    }
}

/// A running fake
pub struct FakeDiscord {
    addr: SocketAddr,
    state: Arc<FakeState>,
    _handle: JoinHandle<()>,
}

impl FakeDiscord {
    pub async fn start() -> Result<Self> {
        Self::start_with_config(FakeConfig::default()).await
    }

    pub async fn start_with_config(config: FakeConfig) -> Result<Self> {
        let next_id = AtomicU64::new(1000);
        let commands = config
            .remote_commands
            .iter()
            .map(|name| {
                let id = next_id.fetch_add(1, Ordering::SeqCst);
                remote_command(id, config.application_id, name, 1)
            })
            .collect();
        let state = Arc::new(FakeState {
            config,
            commands: Mutex::new(commands),
            next_id,
            ..FakeState::default()
        });

        let app = Router::new()
            .route("/gateway", get(gateway))
            .route(
                "/api/applications/:application_id/commands",
                get(list_commands).post(create_command),
            )
            .route(
                "/api/applications/:application_id/commands/:command_id",
                delete(delete_command),
            )
            .route(
                "/api/interactions/:interaction_id/:token/callback",
                post(interaction_callback),
            )
            .layer(TraceLayer::new_for_http())
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self {
            addr,
            state,
            _handle: handle,
        })
    }

    pub fn token(&self) -> &str {
        &self.state.config.token
    }

    /// Gateway URL with the query string the client normally appends
    pub fn gateway_url(&self) -> String {
        format!("ws://{}/gateway?v=10&encoding=json", self.addr)
    }

    pub fn rest_base(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn is_connected(&self) -> bool {
        self.state.outbound.lock().is_some()
    }

    pub fn connections(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }

    /// Send a dispatch; returns its sequence number
    pub fn dispatch(&self, event: &str, data: Value) -> Result<u64> {
        self.state.dispatch(event, data)
    }

    pub fn send_json(&self, frame: &Value) -> Result<()> {
        self.state.send_json(frame)
    }

    pub fn send_raw(&self, text: &str) -> Result<()> {
        self.state.send(Message::Text(text.to_string()))
    }

    pub fn close(&self, code: u16, reason: &'static str) -> Result<()> {
        self.state.send(Message::Close(Some(CloseFrame {
            code,
            reason: Cow::Borrowed(reason),
        })))
    }

    pub fn received(&self) -> Vec<Value> {
        self.state.received.lock().clone()
    }

    /// Client frames with the given op
    pub fn received_op(&self, op: u64) -> Vec<Value> {
        self.state
            .received
            .lock()
            .iter()
            .filter(|frame| frame["op"].as_u64() == Some(op))
            .cloned()
            .collect()
    }

    pub fn client_closes(&self) -> usize {
        self.state.client_closes.load(Ordering::SeqCst)
    }

    pub fn commands(&self) -> Vec<Value> {
        self.state.commands.lock().clone()
    }

    pub fn command_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .state
            .commands
            .lock()
            .iter()
            .filter_map(|c| c["name"].as_str().map(str::to_string))
            .collect();
        names.sort();
        names
    }

    /// `"<METHOD> <path>"` for every REST request, in arrival order
    pub fn rest_calls(&self) -> Vec<String> {
        self.state.rest_calls.lock().clone()
    }

    /// `(interaction id, token, body)` of every callback
    pub fn callbacks(&self) -> Vec<(String, String, Value)> {
        self.state.callbacks.lock().clone()
    }
}

// ============================================================================
// Gateway
// ============================================================================

async fn gateway(ws: WebSocketUpgrade, State(state): State<Arc<FakeState>>) -> Response {
    ws.on_upgrade(move |socket| serve_gateway(socket, state))
}

async fn serve_gateway(socket: WebSocket, state: Arc<FakeState>) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let closing = matches!(message, Message::Close(_));
            if sink.send(message).await.is_err() || closing {
                break;
            }
        }
    });

    state.connections.fetch_add(1, Ordering::SeqCst);
    let _ = tx.send(Message::Text(
        json!({"op": 10, "d": {"heartbeat_interval": state.config.heartbeat_interval_ms}, "s": null, "t": null})
            .to_string(),
    ));
    *state.outbound.lock() = Some(tx);

    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => {
                let Ok(frame) = serde_json::from_str::<Value>(&text) else {
                    continue;
                };
                state.received.lock().push(frame.clone());
                handle_client_frame(&state, &frame);
            }
            Message::Close(_) => {
                state.client_closes.fetch_add(1, Ordering::SeqCst);
                break;
            }
            _ => {}
        }
    }

    *state.outbound.lock() = None;
    writer.abort();
}

fn handle_client_frame(state: &FakeState, frame: &Value) {
    match frame["op"].as_u64() {
        Some(2) => {
            if frame["d"]["token"].as_str() == Some(state.config.token.as_str()) {
                let _ = state.dispatch("READY", ready_payload(state.config.application_id));
            } else {
                let _ = state.send(Message::Close(Some(CloseFrame {
                    code: 4004,
                    reason: Cow::Borrowed("Authentication failed."),
                })));
            }
        }
        Some(1) if state.config.ack_heartbeats => {
            let _ = state.send_json(&json!({"op": 11, "d": null, "s": null, "t": null}));
        }
        _ => {}
    }
}

// ============================================================================
// REST
// ============================================================================

async fn list_commands(
    State(state): State<Arc<FakeState>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    state.authorized(&headers)?;
    state.record(format!("GET /applications/{application_id}/commands"));
    Ok(Json(Value::Array(state.commands.lock().clone())))
}

async fn create_command(
    State(state): State<Arc<FakeState>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    state.authorized(&headers)?;
    let name = body["name"].as_str().ok_or(StatusCode::BAD_REQUEST)?;
    state.record(format!("POST /applications/{application_id}/commands {name}"));

    let mut created = body.clone();
    created["id"] = json!(state.next_id.fetch_add(1, Ordering::SeqCst).to_string());
    created["application_id"] = json!(application_id);
    created["version"] = json!("1");
    state.commands.lock().push(created.clone());

    Ok((StatusCode::CREATED, Json(created)))
}

async fn delete_command(
    State(state): State<Arc<FakeState>>,
    Path((application_id, command_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<StatusCode, StatusCode> {
    state.authorized(&headers)?;
    state.record(format!("DELETE /applications/{application_id}/commands/{command_id}"));

    let mut commands = state.commands.lock();
    let before = commands.len();
    commands.retain(|c| c["id"].as_str() != Some(command_id.as_str()));
    if commands.len() == before {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn interaction_callback(
    State(state): State<Arc<FakeState>>,
    Path((interaction_id, token)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<StatusCode, StatusCode> {
    state.authorized(&headers)?;
    state.record(format!("POST /interactions/{interaction_id}/callback"));
    state.callbacks.lock().push((interaction_id, token, body));
    Ok(StatusCode::NO_CONTENT)
}
