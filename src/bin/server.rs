use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use hexmaze_pursuit::config::GameConfig;
use hexmaze_pursuit::constants::TICK_MS;
use hexmaze_pursuit::engine::GameEngine;
use hexmaze_pursuit::server_protocol::{parse_client_message, ParsedClientMessage};
use hexmaze_pursuit::server_utils::{
    load_config, load_policy, parse_port, parse_seed, resolve_seed,
};
use hexmaze_pursuit::telemetry::{emit_log, LogContext};
use hexmaze_pursuit::types::Direction;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tower_http::services::{ServeDir, ServeFile};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

type SharedState = Arc<Mutex<ServerState>>;

#[derive(Clone)]
struct ClientContext {
    tx: mpsc::Sender<String>,
}

struct ServerState {
    clients: HashMap<String, ClientContext>,
    game: GameEngine,
    /// Latest input since the previous tick; consumed by the next step.
    pending_input: Option<Direction>,
    game_over_sent: bool,
}

impl ServerState {
    fn new(game: GameEngine) -> Self {
        Self {
            clients: HashMap::new(),
            game,
            pending_input: None,
            game_over_sent: false,
        }
    }

    fn reset(&mut self, seed: Option<u32>) -> anyhow::Result<()> {
        let seed = resolve_seed(seed);
        self.game.reset(seed).context("reset failed")?;
        self.pending_input = None;
        self.game_over_sent = false;
        emit_log(
            "info",
            "game_reset",
            LogContext::default().scenario("server", seed),
            json!({ "gridSize": self.game.config.grid_size }),
        );
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ResetQuery {
    seed: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let port = parse_port(std::env::var("PORT").ok().as_deref());

    let config = match std::env::var("HEXMAZE_CONFIG") {
        Ok(path) => load_config(&PathBuf::from(path))?,
        Err(_) => GameConfig::default(),
    };
    let weights = std::env::var("HEXMAZE_POLICY_WEIGHTS").ok().map(PathBuf::from);
    let policy = load_policy(config.policy, weights.as_deref())?;
    println!("[server] pursuer policy: {}", policy.name());

    let game = GameEngine::with_policy(config, resolve_seed(None), policy)
        .context("failed to build initial game")?;
    let state = Arc::new(Mutex::new(ServerState::new(game)));
    start_tick_loop(state.clone());

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/snapshot", get(snapshot_handler))
        .route("/api/config", get(config_handler))
        .route("/api/reset", post(reset_handler))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir() {
        let index_file = static_dir.join("index.html");
        println!(
            "[server] static file root: {}",
            static_dir.to_string_lossy()
        );
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        println!("[server] no static file root; serving the API only");
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    println!("[server] listening on :{port}");
    axum::serve(listener, app)
        .await
        .context("server runtime failed")
}

fn resolve_static_dir() -> Option<PathBuf> {
    let path = PathBuf::from(std::env::var("STATIC_DIR").ok()?);
    path.join("index.html").is_file().then_some(path)
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn snapshot_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let mut guard = state.lock().await;
    Json(guard.game.build_snapshot(false))
}

async fn config_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let guard = state.lock().await;
    Json(json!({
        "config": guard.game.config,
        "policy": guard.game.policy_name(),
        "tickMs": TICK_MS,
    }))
}

async fn reset_handler(
    State(state): State<SharedState>,
    Query(query): Query<ResetQuery>,
) -> impl IntoResponse {
    let seed = match query.seed.as_deref() {
        None => None,
        Some(raw) => match parse_seed(Some(raw)) {
            Some(seed) => Some(seed),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "invalid seed" })),
                );
            }
        },
    };

    let mut guard = state.lock().await;
    if let Err(error) = guard.reset(seed) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": format!("{error:#}") })),
        );
    }
    let snapshot = guard.game.build_snapshot(false);
    let message = json!({ "type": "state", "snapshot": snapshot });
    broadcast(&mut guard, &message);
    (StatusCode::OK, Json(json!(snapshot)))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client_id = make_id("client");
    let (tx, mut rx) = mpsc::channel::<String>(256);

    {
        let mut guard = state.lock().await;
        guard
            .clients
            .insert(client_id.clone(), ClientContext { tx: tx.clone() });
        send_welcome_and_initial_state(&mut guard, &client_id);
    }
    println!("[server] client connected: {client_id}");

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if ws_sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        match message {
            Message::Text(raw) => {
                handle_client_message(&state, &client_id, raw.as_str()).await;
            }
            Message::Binary(raw) => {
                if let Ok(text) = std::str::from_utf8(&raw) {
                    handle_client_message(&state, &client_id, text).await;
                } else {
                    send_error_to_client(&state, &client_id, "invalid utf8 message").await;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.lock().await.clients.remove(&client_id);
    println!("[server] client disconnected: {client_id}");
    drop(tx);
    let _ = writer.await;
}

async fn handle_client_message(state: &SharedState, client_id: &str, raw: &str) {
    let Some(message) = parse_client_message(raw) else {
        send_error_to_client(state, client_id, "invalid message").await;
        return;
    };

    let mut guard = state.lock().await;
    match message {
        ParsedClientMessage::Input { dir } => {
            guard.pending_input = Some(dir);
        }
        ParsedClientMessage::Reset { seed } => {
            if let Err(error) = guard.reset(seed) {
                let message = json!({ "type": "error", "message": format!("{error:#}") });
                send_to_client(&mut guard, client_id, &message);
                return;
            }
            let snapshot = guard.game.build_snapshot(false);
            let message = json!({ "type": "state", "snapshot": snapshot });
            broadcast(&mut guard, &message);
        }
        ParsedClientMessage::Ping { t } => {
            let message = json!({
                "type": "pong",
                "t": t,
                "serverTimeMs": hexmaze_pursuit::telemetry::now_ms(),
            });
            send_to_client(&mut guard, client_id, &message);
        }
    }
}

fn send_welcome_and_initial_state(state: &mut ServerState, client_id: &str) {
    let welcome = json!({
        "type": "welcome",
        "clientId": client_id,
        "seed": state.game.seed(),
        "tickMs": TICK_MS,
        "policy": state.game.policy_name(),
        "config": state.game.config,
    });
    send_to_client(state, client_id, &welcome);

    let snapshot = state.game.build_snapshot(false);
    send_to_client(
        state,
        client_id,
        &json!({ "type": "state", "snapshot": snapshot }),
    );
}

fn start_tick_loop(state: SharedState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
        loop {
            interval.tick().await;
            let mut guard = state.lock().await;
            tick_game(&mut guard);
        }
    });
}

fn tick_game(state: &mut ServerState) {
    if state.game.is_ended() {
        return;
    }
    let input = state.pending_input.take().unwrap_or_default();
    state.game.step(input);
    let snapshot = state.game.build_snapshot(true);
    broadcast(state, &json!({ "type": "state", "snapshot": snapshot }));

    if state.game.is_ended() && !state.game_over_sent {
        state.game_over_sent = true;
        let summary = state.game.build_summary();
        emit_log(
            "info",
            "game_over",
            LogContext::default()
                .scenario("server", summary.seed)
                .at_tick(summary.ticks),
            json!({
                "reason": summary.reason,
                "score": summary.score,
                "rotations": summary.rotations,
            }),
        );
        broadcast(state, &json!({ "type": "game_over", "summary": summary }));
    }
}

fn send_to_client(state: &mut ServerState, client_id: &str, message: &Value) {
    let send_failed = state
        .clients
        .get(client_id)
        .map(|client| client.tx.try_send(message.to_string()).is_err())
        .unwrap_or(false);
    if send_failed {
        state.clients.remove(client_id);
    }
}

/// Clients whose queue is full are dropped; their socket task ends when the
/// sender goes away.
fn broadcast(state: &mut ServerState, message: &Value) {
    let payload = message.to_string();
    let failed: Vec<String> = state
        .clients
        .iter()
        .filter(|(_, client)| client.tx.try_send(payload.clone()).is_err())
        .map(|(client_id, _)| client_id.clone())
        .collect();
    for client_id in failed {
        state.clients.remove(&client_id);
    }
}

async fn send_error_to_client(state: &SharedState, client_id: &str, message: &str) {
    let mut guard = state.lock().await;
    send_to_client(
        &mut guard,
        client_id,
        &json!({
            "type": "error",
            "message": message,
        }),
    );
}

fn make_id(prefix: &str) -> String {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{id}")
}
