//! Sentry telemetry adapter.
//!
//! Submits captured messages to a Sentry-compatible store endpoint over
//! HTTPS.  The adapter is fire-and-forget: [`Telemetry::capture_message`]
//! builds the event, spawns the POST on the current Tokio runtime and
//! returns.  Delivery failures are logged and dropped; there is no retry
//! queue.
//!
//! # DSN format
//!
//! ```text
//! {scheme}://{public_key}@{host}[:{port}]/[{path_prefix}/]{project_id}
//!                       ↓
//! POST {scheme}://{host}[:{port}]/[{path_prefix}/]api/{project_id}/store/
//! X-Sentry-Auth: Sentry sentry_version=7, sentry_client=ffx-bridge/x.y.z, sentry_key={public_key}
//! ```

use std::str::FromStr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::application::ports::{Telemetry, TelemetryScope};
use crate::domain::TelemetryConfig;

const CLIENT_NAME: &str = concat!("ffx-bridge/", env!("CARGO_PKG_VERSION"));
const PROTOCOL_VERSION: u8 = 7;

// ── DSN ───────────────────────────────────────────────────────────────────────

/// Reasons a DSN string is rejected.
#[derive(Debug, Error, PartialEq)]
pub enum DsnError {
    #[error("DSN is not a valid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("DSN has no public key")]
    MissingPublicKey,

    #[error("DSN has no host")]
    MissingHost,

    #[error("DSN has no project id")]
    MissingProjectId,
}

/// A parsed telemetry destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dsn {
    public_key: String,
    project_id: String,
    store_url: Url,
}

impl Dsn {
    /// Parses a DSN of the form `scheme://key@host[:port]/[prefix/]project`.
    ///
    /// # Errors
    ///
    /// Returns [`DsnError`] if any required part is missing.
    pub fn parse(raw: &str) -> Result<Self, DsnError> {
        let url = Url::parse(raw)?;

        let public_key = url.username();
        if public_key.is_empty() {
            return Err(DsnError::MissingPublicKey);
        }
        let host = url.host_str().ok_or(DsnError::MissingHost)?;

        let mut segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        let project_id = segments.pop().ok_or(DsnError::MissingProjectId)?;

        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let mut store_url = Url::parse(&format!("{}://{}", url.scheme(), authority))?;
        let mut path = String::new();
        for prefix in &segments {
            path.push('/');
            path.push_str(prefix);
        }
        path.push_str(&format!("/api/{project_id}/store/"));
        store_url.set_path(&path);

        Ok(Self {
            public_key: public_key.to_string(),
            project_id: project_id.to_string(),
            store_url,
        })
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// The endpoint events are POSTed to.
    pub fn store_url(&self) -> &Url {
        &self.store_url
    }

    /// Value of the `X-Sentry-Auth` header.
    pub fn auth_header(&self) -> String {
        format!(
            "Sentry sentry_version={PROTOCOL_VERSION}, sentry_client={CLIENT_NAME}, sentry_key={}",
            self.public_key
        )
    }
}

impl FromStr for Dsn {
    type Err = DsnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ── Adapters ──────────────────────────────────────────────────────────────────

/// Submits events to a Sentry store endpoint.
pub struct SentryTelemetry {
    http: reqwest::Client,
    dsn: Dsn,
    environment: String,
    debug: bool,
}

impl SentryTelemetry {
    /// Builds the adapter for `dsn` using the fixed settings in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &TelemetryConfig, dsn: Dsn) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().user_agent(CLIENT_NAME).build()?;
        Ok(Self {
            http,
            dsn,
            environment: config.environment.clone(),
            debug: config.debug,
        })
    }

    /// The JSON event body for one captured message.
    pub fn event_body(&self, scope: &TelemetryScope, message: &str) -> Value {
        json!({
            "event_id": Uuid::new_v4().simple().to_string(),
            "timestamp": unix_timestamp(),
            "platform": "other",
            "level": "info",
            "logger": "ffx-bridge",
            "environment": self.environment,
            "message": { "formatted": message },
            "tags": scope.tags(),
            "contexts": scope.contexts(),
            "sdk": {
                "name": "ffx-bridge",
                "version": env!("CARGO_PKG_VERSION"),
            },
        })
    }
}

impl Telemetry for SentryTelemetry {
    fn capture_message(&self, scope: &TelemetryScope, message: &str) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime available; telemetry event dropped");
            return;
        };

        let request = self
            .http
            .post(self.dsn.store_url().clone())
            .header("X-Sentry-Auth", self.dsn.auth_header())
            .json(&self.event_body(scope, message));
        let verbose = self.debug;

        runtime.spawn(async move {
            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    if verbose {
                        info!("telemetry event accepted");
                    }
                }
                Ok(response) => {
                    debug!(status = response.status().as_u16(), "telemetry event rejected");
                }
                Err(e) => {
                    debug!("telemetry submission failed: {e}");
                }
            }
        });
    }
}

/// Telemetry sink used when no DSN is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl Telemetry for NoopTelemetry {
    fn capture_message(&self, _scope: &TelemetryScope, message: &str) {
        debug!(dropped = message, "telemetry disabled; event not submitted");
    }
}

/// Builds the telemetry collaborator for `config`.
///
/// Without a DSN this is [`NoopTelemetry`].
///
/// # Errors
///
/// Returns an error if the DSN is malformed or the HTTP client cannot be built.
pub fn init(config: &TelemetryConfig) -> anyhow::Result<Arc<dyn Telemetry>> {
    let Some(raw) = config.dsn.as_deref() else {
        info!(environment = %config.environment, "telemetry disabled (no DSN configured)");
        return Ok(Arc::new(NoopTelemetry));
    };

    let dsn = Dsn::parse(raw).context("invalid telemetry DSN")?;
    info!(
        environment = %config.environment,
        project = dsn.project_id(),
        debug = config.debug,
        traces_sample_rate = config.traces_sample_rate,
        replays_session_sample_rate = config.replays_session_sample_rate,
        replays_on_error_sample_rate = config.replays_on_error_sample_rate,
        targets = ?config.trace_propagation_targets,
        "telemetry enabled"
    );

    let telemetry = SentryTelemetry::new(config, dsn).context("failed to build telemetry client")?;
    Ok(Arc::new(telemetry))
}

fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
