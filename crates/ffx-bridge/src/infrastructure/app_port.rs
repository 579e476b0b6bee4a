//! App-facing WebSocket port: accept loop and per-session task management.
//!
//! The app core connects here over a local WebSocket.  Each session carries
//! traffic in both directions:
//!
//! - **App → bridge**: text frames holding one tagged command each
//!   (`{"tag":"openExternalLink","data":{...}}`).  Decoded commands go onto
//!   the dispatcher's channel, in frame order.
//! - **Bridge → app**: every decoded inbound event, serialised as JSON text,
//!   fanned out to all sessions through a broadcast bus.
//!
//! A frame that does not decode to a known command is a contract violation
//! by the app core: the session logs it at `error` and closes.
//!
//! Shutdown follows the same `AtomicBool` flag as the dispatcher; the accept
//! loop polls it every 200 ms.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use ffx_core::{decode_command, DecodedEvent, OutboundCommand};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error as WsError, Message as WsMessage},
};
use tracing::{debug, error, info, warn};

use crate::application::ports::AppSink;

/// Capacity of the command channel between sessions and the dispatcher.
pub const COMMAND_QUEUE_CAPACITY: usize = 128;

/// Capacity of the event bus; a session lagging further behind loses events.
pub const EVENT_BUS_CAPACITY: usize = 256;

const ACCEPT_POLL: Duration = Duration::from_millis(200);

// ── Event bus ─────────────────────────────────────────────────────────────────

/// Fan-out of decoded events to every connected app session.
///
/// Cloning shares the same bus.
#[derive(Clone)]
pub struct AppEvents {
    tx: broadcast::Sender<DecodedEvent>,
}

impl AppEvents {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// A receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<DecodedEvent> {
        self.tx.subscribe()
    }

    /// Number of sessions currently listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl AppSink for AppEvents {
    fn send(&self, event: DecodedEvent) {
        if self.tx.send(event).is_err() {
            debug!("no app session connected; event dropped");
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds `bind_addr` and serves app sessions until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound.
pub async fn run_server(
    bind_addr: SocketAddr,
    commands: mpsc::Sender<OutboundCommand>,
    events: AppEvents,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind app listener on {bind_addr}"))?;

    info!("app port listening on {bind_addr}");

    serve(listener, commands, events, running).await;
    Ok(())
}

/// Runs the accept loop on an already bound listener.
pub async fn serve(
    listener: TcpListener,
    commands: mpsc::Sender<OutboundCommand>,
    events: AppEvents,
    running: Arc<AtomicBool>,
) {
    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        match timeout(ACCEPT_POLL, listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                info!("app connection from {peer_addr}");
                let commands = commands.clone();
                // Subscribe before spawning so no event published after the
                // accept is missed.
                let event_rx = events.subscribe();

                tokio::spawn(async move {
                    handle_app_session(stream, peer_addr, commands, event_rx).await;
                });
            }
            Ok(Err(e)) => {
                error!("accept error: {e}");
            }
            Err(_) => {
                // No connection in the last poll interval.
            }
        }
    }
}

// ── Per-session handler ───────────────────────────────────────────────────────

/// How a session's inbound side ended.
#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    /// The app closed the socket or the stream ended.
    Closed,
    /// The app sent a frame that is not a valid command.
    ContractViolation,
    /// The dispatcher is gone.
    DispatcherGone,
}

async fn handle_app_session(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    commands: mpsc::Sender<OutboundCommand>,
    events: broadcast::Receiver<DecodedEvent>,
) {
    match run_session(raw_stream, peer_addr, commands, events).await {
        Ok(SessionEnd::ContractViolation) => {
            warn!("session {peer_addr} closed after an invalid command")
        }
        Ok(end) => info!("session {peer_addr} closed ({end:?})"),
        Err(e) => warn!("session {peer_addr} closed with error: {e:#}"),
    }
}

async fn run_session(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    commands: mpsc::Sender<OutboundCommand>,
    mut events: broadcast::Receiver<DecodedEvent>,
) -> anyhow::Result<SessionEnd> {
    let ws_stream = accept_async(raw_stream)
        .await
        .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;

    debug!("WebSocket session established: {peer_addr}");

    let (mut ws_tx, mut ws_rx) = ws_stream.split();
    let session_id = peer_addr.to_string();

    // ── Task A: bridge → app ──────────────────────────────────────────────────
    let session_id_out = session_id.clone();
    let mut outbound_task = tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("session {session_id_out}: lagged, {skipped} events dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    error!("session {session_id_out}: JSON serialization error: {e}");
                    continue;
                }
            };

            if ws_tx.send(WsMessage::Text(text)).await.is_err() {
                debug!("session {session_id_out}: WebSocket send failed (app disconnected)");
                break;
            }
        }
    });

    // ── Task B: app → bridge ──────────────────────────────────────────────────
    let session_id_in = session_id.clone();
    let mut inbound_task = tokio::spawn(async move {
        loop {
            let frame = match ws_rx.next().await {
                Some(Ok(frame)) => frame,
                Some(Err(WsError::ConnectionClosed | WsError::Protocol(_))) => {
                    return SessionEnd::Closed;
                }
                Some(Err(e)) => {
                    warn!("session {session_id_in}: WebSocket error: {e}");
                    return SessionEnd::Closed;
                }
                None => return SessionEnd::Closed,
            };

            match frame {
                WsMessage::Text(text) => {
                    let command = match decode_command(&text) {
                        Ok(command) => command,
                        Err(e) => {
                            error!("session {session_id_in}: {e}");
                            return SessionEnd::ContractViolation;
                        }
                    };

                    debug!("session {session_id_in}: app → bridge: {}", command.tag());

                    if commands.send(command).await.is_err() {
                        return SessionEnd::DispatcherGone;
                    }
                }
                WsMessage::Binary(_) => {
                    error!("session {session_id_in}: binary frame where a command was expected");
                    return SessionEnd::ContractViolation;
                }
                WsMessage::Close(_) => return SessionEnd::Closed,
                WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => {}
            }
        }
    });

    let end = tokio::select! {
        result = &mut inbound_task => {
            outbound_task.abort();
            result.unwrap_or(SessionEnd::Closed)
        }
        _ = &mut outbound_task => {
            inbound_task.abort();
            SessionEnd::Closed
        }
    };

    Ok(end)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
