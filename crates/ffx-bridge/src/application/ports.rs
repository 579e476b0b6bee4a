//! Narrow interfaces to the collaborators the bridge drives.
//!
//! The messaging SDK, the telemetry SDK, the host environment and the app
//! core are all opaque to the application layer.  Each is reached through one
//! of the traits below, so the core logic runs unchanged against the real
//! adapters in `infrastructure` or against test doubles.
//!
//! # Testability
//!
//! `Telemetry`, `HostEnvironment` and `AppSink` get `mockall` mocks in unit
//! tests.  The messaging traits are exercised through the recording fakes in
//! [`crate::infrastructure::recording`], which log the exact call order.

use std::collections::BTreeMap;
use std::sync::Arc;

use ffx_core::{ChannelName, DecodedEvent};
use serde_json::Value;
use thiserror::Error;

// ── Messaging network ─────────────────────────────────────────────────────────

/// Receives raw payloads delivered on a connection.
pub trait MessageHandler: Send + Sync {
    /// Called once per message, in delivery order.
    fn on_message(&self, payload: &str);
}

/// One connection to the messaging network.
///
/// Operation order at creation is always: `add_listener` → `set_token` →
/// `subscribe`.
pub trait Connection: Send {
    /// Registers a handler for message events.
    fn add_listener(&mut self, handler: Arc<dyn MessageHandler>);
    /// Sets the bearer token used to authorise the subscription.
    fn set_token(&mut self, token: &str);
    /// Starts delivering messages published on `channels`.
    fn subscribe(&mut self, channels: &[ChannelName]);
    /// Stops message delivery.  Safe to call on a connection that never
    /// subscribed or was already stopped.
    fn stop(&mut self);
}

/// Factory for messaging connections.
pub trait MessagingClient: Send + Sync {
    /// Creates a connection identified by a subscribe key and a user id.
    fn connect(&self, subscribe_key: &str, user_id: &str) -> Box<dyn Connection>;
}

// ── Telemetry ─────────────────────────────────────────────────────────────────

/// Tags and structured contexts attached to one captured message.
///
/// Mirrors a telemetry SDK's scoped context: everything set on the scope
/// applies to the single event captured with it and nothing else.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryScope {
    tags: BTreeMap<String, String>,
    contexts: BTreeMap<String, Value>,
}

impl TelemetryScope {
    /// An empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets (or replaces) a searchable tag.
    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }

    /// Sets (or replaces) a named structured context.
    pub fn set_context(&mut self, name: impl Into<String>, context: Value) {
        self.contexts.insert(name.into(), context);
    }

    /// Looks up a tag value.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// All tags, ordered by key.
    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// All contexts, ordered by name.
    pub fn contexts(&self) -> &BTreeMap<String, Value> {
        &self.contexts
    }
}

/// The error-telemetry collaborator.
///
/// Implementations must return promptly and never panic: capturing is a
/// best-effort side channel and delivery is the collaborator's problem.
#[cfg_attr(test, mockall::automock)]
pub trait Telemetry: Send + Sync {
    /// Submits one diagnostic message with the given scope attached.
    fn capture_message(&self, scope: &TelemetryScope, message: &str);
}

// ── Host environment ──────────────────────────────────────────────────────────

/// Failure to hand a URL to the host environment.
#[derive(Debug, Error)]
pub enum HostError {
    /// The platform has no known way to open a URL.
    #[error("no URL opener is available on this platform")]
    Unsupported,

    /// The opener program could not be started.
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// The host environment's "open this URL somewhere new" primitive.
#[cfg_attr(test, mockall::automock)]
pub trait HostEnvironment: Send + Sync {
    /// Opens `url` in a new, independent viewing context and brings it to the
    /// foreground where the host allows it.
    fn open_in_new_context(&self, url: &str) -> Result<(), HostError>;
}

// ── App core ──────────────────────────────────────────────────────────────────

/// The app core's inbound channel.
#[cfg_attr(test, mockall::automock)]
pub trait AppSink: Send + Sync {
    /// Delivers one decoded event to the app.  Never blocks.
    fn send(&self, event: DecodedEvent);
}
