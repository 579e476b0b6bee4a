//! PubNub messaging adapter.
//!
//! A thin [`MessagingClient`] over PubNub's subscribe REST endpoint.  Each
//! connection runs one long-poll loop on a Tokio task:
//!
//! ```text
//! GET {origin}/v2/subscribe/{subscribeKey}/{channels}/0?uuid=..&tt=0          → cursor
//! GET {origin}/v2/subscribe/{subscribeKey}/{channels}/0?uuid=..&tt=..&tr=..  → messages + next cursor
//! ...
//! ```
//!
//! Every message in a response is handed to the registered listeners, in
//! order, before the next request goes out.  `stop` aborts the task
//! outright: a request in flight is dropped, a listener call already running
//! finishes on its own.
//!
//! Transport concerns (TLS, connection reuse) belong to `reqwest`.  On a
//! failed request the loop pauses for [`RETRY_PAUSE`] and tries again with
//! the same cursor.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use ffx_core::ChannelName;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use crate::application::ports::{Connection, MessageHandler, MessagingClient};
use crate::domain::MessagingConfig;

/// Pause between a failed subscribe request and the next attempt.
pub const RETRY_PAUSE: Duration = Duration::from_secs(1);

/// Bytes escaped inside one path component.  `,` separates channels, so a
/// comma inside a channel name must not survive unescaped.
const PATH_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Errors raised while setting up the messaging adapter.
#[derive(Debug, Error)]
pub enum MessagingError {
    /// The configured origin is not a URL.
    #[error("invalid messaging origin '{origin}': {source}")]
    InvalidOrigin {
        origin: String,
        #[source]
        source: url::ParseError,
    },

    /// The configured origin has no path to extend (e.g. `mailto:`).
    #[error("messaging origin '{0}' cannot carry a request path")]
    OriginNotBase(String),

    /// The HTTP client could not be built.
    #[error("failed to build messaging HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

// ── Client ────────────────────────────────────────────────────────────────────

/// Creates PubNub connections sharing one HTTP client.
#[derive(Clone)]
pub struct PubNubClient {
    http: reqwest::Client,
    origin: Url,
}

impl PubNubClient {
    /// Validates the origin and builds the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`MessagingError`] if the origin is not a usable base URL or
    /// the HTTP client cannot be constructed.
    pub fn new(config: &MessagingConfig) -> Result<Self, MessagingError> {
        let origin = Url::parse(&config.origin).map_err(|source| MessagingError::InvalidOrigin {
            origin: config.origin.clone(),
            source,
        })?;
        if origin.cannot_be_a_base() {
            return Err(MessagingError::OriginNotBase(config.origin.clone()));
        }

        let http = reqwest::Client::builder()
            .timeout(config.subscribe_timeout)
            .user_agent(concat!("ffx-bridge/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, origin })
    }
}

impl MessagingClient for PubNubClient {
    fn connect(&self, subscribe_key: &str, user_id: &str) -> Box<dyn Connection> {
        Box::new(self.connection(subscribe_key, user_id))
    }
}

impl PubNubClient {
    fn connection(&self, subscribe_key: &str, user_id: &str) -> PubNubConnection {
        PubNubConnection {
            http: self.http.clone(),
            origin: self.origin.clone(),
            subscribe_key: subscribe_key.to_string(),
            user_id: user_id.to_string(),
            token: None,
            listeners: Vec::new(),
            poll: None,
        }
    }
}

// ── Connection ────────────────────────────────────────────────────────────────

/// One PubNub identity plus, once subscribed, its poll task.
pub struct PubNubConnection {
    http: reqwest::Client,
    origin: Url,
    subscribe_key: String,
    user_id: String,
    token: Option<String>,
    listeners: Vec<Arc<dyn MessageHandler>>,
    poll: Option<JoinHandle<()>>,
}

impl PubNubConnection {
    fn abort_poll(&mut self) {
        if let Some(task) = self.poll.take() {
            task.abort();
        }
    }
}

impl Connection for PubNubConnection {
    fn add_listener(&mut self, handler: Arc<dyn MessageHandler>) {
        self.listeners.push(handler);
    }

    fn set_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    /// Starts the poll loop.  Listeners and token are captured now; anything
    /// registered later applies only to a later `subscribe`.
    fn subscribe(&mut self, channels: &[ChannelName]) {
        self.abort_poll();

        let request = SubscribeRequest {
            http: self.http.clone(),
            origin: self.origin.clone(),
            subscribe_key: self.subscribe_key.clone(),
            channels: channel_list(channels),
            user_id: self.user_id.clone(),
            token: self.token.clone(),
        };
        let listeners = self.listeners.clone();

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(channels = %request.channels, "no async runtime available; subscription not started");
            return;
        };
        self.poll = Some(runtime.spawn(poll_loop(request, listeners)));
    }

    fn stop(&mut self) {
        self.abort_poll();
    }
}

impl Drop for PubNubConnection {
    fn drop(&mut self) {
        self.abort_poll();
    }
}

// ── Subscribe loop ────────────────────────────────────────────────────────────

/// Position in the channel's message stream.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Cursor {
    timetoken: String,
    region: Option<u32>,
}

impl Cursor {
    /// The handshake cursor: `tt=0`, no region.
    fn initial() -> Self {
        Self {
            timetoken: "0".to_string(),
            region: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubscribeResponse {
    t: TimetokenField,
    #[serde(default)]
    m: Vec<Envelope>,
}

#[derive(Debug, Deserialize)]
struct TimetokenField {
    t: String,
    r: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    /// Published payload.
    d: Value,
}

/// Channel list as it appears in the subscribe path: each name escaped,
/// then joined with `,`.
fn channel_list(channels: &[ChannelName]) -> String {
    channels
        .iter()
        .map(|channel| utf8_percent_encode(channel.as_str(), PATH_COMPONENT).to_string())
        .collect::<Vec<_>>()
        .join(",")
}

struct SubscribeRequest {
    http: reqwest::Client,
    origin: Url,
    subscribe_key: String,
    /// Already escaped; see [`channel_list`].
    channels: String,
    user_id: String,
    token: Option<String>,
}

impl SubscribeRequest {
    fn url(&self, cursor: &Cursor) -> Result<Url, MessagingError> {
        if self.origin.cannot_be_a_base() {
            return Err(MessagingError::OriginNotBase(self.origin.to_string()));
        }

        // Components are escaped here; `set_path` keeps existing `%XX`
        // sequences as they are.
        let mut path = self.origin.path().trim_end_matches('/').to_string();
        path.push_str("/v2/subscribe/");
        path.push_str(&utf8_percent_encode(&self.subscribe_key, PATH_COMPONENT).to_string());
        path.push('/');
        path.push_str(&self.channels);
        path.push_str("/0");

        let mut url = self.origin.clone();
        url.set_path(&path);

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("uuid", &self.user_id);
            query.append_pair("tt", &cursor.timetoken);
            if let Some(region) = cursor.region {
                query.append_pair("tr", &region.to_string());
            }
            if let Some(token) = &self.token {
                query.append_pair("auth", token);
            }
        }

        Ok(url)
    }

    async fn fetch(&self, cursor: &Cursor) -> anyhow::Result<SubscribeResponse> {
        // The URL carries the token; it is never logged.
        let url = self.url(cursor)?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .context("subscribe request failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("subscribe returned status {}", status.as_u16());
        }

        response
            .json::<SubscribeResponse>()
            .await
            .context("failed to decode subscribe response")
    }
}

/// Text handed to listeners for one published payload.
///
/// Publishers send the JSON document as a string, so a string payload is
/// delivered as its content.  Anything else is delivered as JSON text.
fn payload_text(payload: Value) -> String {
    match payload {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

async fn poll_loop(request: SubscribeRequest, listeners: Vec<Arc<dyn MessageHandler>>) {
    let mut cursor = Cursor::initial();
    debug!(channels = %request.channels, "subscribe loop started");

    loop {
        match request.fetch(&cursor).await {
            Ok(response) => {
                for envelope in response.m {
                    let text = payload_text(envelope.d);
                    for listener in &listeners {
                        listener.on_message(&text);
                    }
                }
                cursor = Cursor {
                    timetoken: response.t.t,
                    region: response.t.r,
                };
            }
            Err(e) => {
                warn!(channels = %request.channels, "{e:#}");
                tokio::time::sleep(RETRY_PAUSE).await;
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
