//! Recording test doubles for every port.
//!
//! These fakes stand in for the messaging network, the telemetry service,
//! the host environment and the app core.  Instead of doing anything they
//! write down each call, in order, so tests can assert on exact call
//! sequences (for example that a connection is stopped before its
//! replacement subscribes).
//!
//! All fakes are `Clone`; clones share the same record, so a test can keep
//! one handle while the bridge owns another.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ffx_core::{ChannelName, DecodedEvent};

use crate::application::ports::{
    AppSink, Connection, HostEnvironment, HostError, MessageHandler, MessagingClient, Telemetry,
    TelemetryScope,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Messaging ─────────────────────────────────────────────────────────────────

/// One call made on a recorded connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionCall {
    Construct {
        subscribe_key: String,
        user_id: String,
    },
    AddListener,
    SetToken(String),
    Subscribe(Vec<String>),
    Stop,
}

#[derive(Default)]
struct MessagingRecord {
    /// Every call on every connection, tagged with the connection index.
    log: Vec<(usize, ConnectionCall)>,
    /// Per connection: registered handlers and whether it is still live.
    connections: Vec<RecordedConnectionState>,
}

#[derive(Default)]
struct RecordedConnectionState {
    listeners: Vec<Arc<dyn MessageHandler>>,
    live: bool,
}

/// A [`MessagingClient`] that records every connection operation.
///
/// Connections are numbered 0, 1, 2, ... in construction order.
#[derive(Clone, Default)]
pub struct RecordingMessagingClient {
    record: Arc<Mutex<MessagingRecord>>,
}

impl RecordingMessagingClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full call log across all connections.
    pub fn log(&self) -> Vec<(usize, ConnectionCall)> {
        lock(&self.record).log.clone()
    }

    /// Calls made on one connection, in order.
    pub fn calls_for(&self, connection: usize) -> Vec<ConnectionCall> {
        lock(&self.record)
            .log
            .iter()
            .filter(|(id, _)| *id == connection)
            .map(|(_, call)| call.clone())
            .collect()
    }

    /// Every channel subscribed to, in call order, across all connections.
    pub fn subscribed_channels(&self) -> Vec<String> {
        lock(&self.record)
            .log
            .iter()
            .filter_map(|(_, call)| match call {
                ConnectionCall::Subscribe(channels) => Some(channels.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Number of `stop` calls across all connections.
    pub fn stop_count(&self) -> usize {
        lock(&self.record)
            .log
            .iter()
            .filter(|(_, call)| *call == ConnectionCall::Stop)
            .count()
    }

    /// Number of connections constructed so far.
    pub fn connection_count(&self) -> usize {
        lock(&self.record).connections.len()
    }

    /// Number of connections constructed and not yet stopped.
    pub fn live_connections(&self) -> usize {
        lock(&self.record)
            .connections
            .iter()
            .filter(|c| c.live)
            .count()
    }

    /// Simulates the network delivering `payload` on `connection`.
    ///
    /// Returns `false` (and delivers nothing) if that connection has been
    /// stopped or does not exist.
    pub fn deliver(&self, connection: usize, payload: &str) -> bool {
        let listeners = {
            let record = lock(&self.record);
            match record.connections.get(connection) {
                Some(state) if state.live => state.listeners.clone(),
                _ => return false,
            }
        };

        for listener in listeners {
            listener.on_message(payload);
        }
        true
    }
}

impl MessagingClient for RecordingMessagingClient {
    fn connect(&self, subscribe_key: &str, user_id: &str) -> Box<dyn Connection> {
        let mut record = lock(&self.record);
        let id = record.connections.len();
        record.connections.push(RecordedConnectionState {
            listeners: Vec::new(),
            live: true,
        });
        record.log.push((
            id,
            ConnectionCall::Construct {
                subscribe_key: subscribe_key.to_string(),
                user_id: user_id.to_string(),
            },
        ));

        Box::new(RecordingConnection {
            id,
            record: Arc::clone(&self.record),
        })
    }
}

struct RecordingConnection {
    id: usize,
    record: Arc<Mutex<MessagingRecord>>,
}

impl RecordingConnection {
    fn push(&self, call: ConnectionCall) {
        lock(&self.record).log.push((self.id, call));
    }
}

impl Connection for RecordingConnection {
    fn add_listener(&mut self, handler: Arc<dyn MessageHandler>) {
        let mut record = lock(&self.record);
        record.connections[self.id].listeners.push(handler);
        record.log.push((self.id, ConnectionCall::AddListener));
    }

    fn set_token(&mut self, token: &str) {
        self.push(ConnectionCall::SetToken(token.to_string()));
    }

    fn subscribe(&mut self, channels: &[ChannelName]) {
        self.push(ConnectionCall::Subscribe(
            channels.iter().map(|c| c.as_str().to_string()).collect(),
        ));
    }

    fn stop(&mut self) {
        let mut record = lock(&self.record);
        record.connections[self.id].live = false;
        record.log.push((self.id, ConnectionCall::Stop));
    }
}

// ── Telemetry ─────────────────────────────────────────────────────────────────

/// One captured telemetry message.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedReport {
    pub scope: TelemetryScope,
    pub message: String,
}

/// A [`Telemetry`] that keeps every captured message.
#[derive(Clone, Default)]
pub struct RecordingTelemetry {
    reports: Arc<Mutex<Vec<CapturedReport>>>,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<CapturedReport> {
        lock(&self.reports).clone()
    }
}

impl Telemetry for RecordingTelemetry {
    fn capture_message(&self, scope: &TelemetryScope, message: &str) {
        lock(&self.reports).push(CapturedReport {
            scope: scope.clone(),
            message: message.to_string(),
        });
    }
}

// ── Host environment ──────────────────────────────────────────────────────────

/// A [`HostEnvironment`] that records requested URLs.
///
/// Built with [`RecordingHost::refusing`], every request fails the way a
/// host with a popup blocker would.
#[derive(Clone, Default)]
pub struct RecordingHost {
    opened: Arc<Mutex<Vec<String>>>,
    refuse: bool,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    /// URLs the bridge asked to open, including refused ones.
    pub fn requested(&self) -> Vec<String> {
        lock(&self.opened).clone()
    }
}

impl HostEnvironment for RecordingHost {
    fn open_in_new_context(&self, url: &str) -> Result<(), HostError> {
        lock(&self.opened).push(url.to_string());
        if self.refuse {
            Err(HostError::Unsupported)
        } else {
            Ok(())
        }
    }
}

// ── App core ──────────────────────────────────────────────────────────────────

/// An [`AppSink`] that collects every event sent to the app.
#[derive(Clone, Default)]
pub struct CollectingAppSink {
    events: Arc<Mutex<Vec<DecodedEvent>>>,
}

impl CollectingAppSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DecodedEvent> {
        lock(&self.events).clone()
    }
}

impl AppSink for CollectingAppSink {
    fn send(&self, event: DecodedEvent) {
        lock(&self.events).push(event);
    }
}
