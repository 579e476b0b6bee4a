//! Bridge configuration types.
//!
//! [`BridgeConfig`] is the single source of truth for all runtime settings.
//! It is built once at startup from CLI arguments (see `main.rs`) or from
//! defaults in tests, and handed to the components that need it.  Nothing in
//! here reads the environment or the file system.

use std::net::SocketAddr;
use std::time::Duration;

/// Whether the bridge runs in a production deployment.
///
/// Production mode enables telemetry submission and silences the developer
/// traces of inbound payloads and link-open attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentMode {
    /// Live deployment: report issues, keep the console quiet.
    Production,
    /// Local development: no telemetry, verbose console diagnostics.
    #[default]
    Development,
}

impl DeploymentMode {
    /// `true` for [`DeploymentMode::Production`].
    pub fn is_production(self) -> bool {
        matches!(self, DeploymentMode::Production)
    }

    /// Environment name attached to telemetry events.
    pub fn environment(self) -> &'static str {
        match self {
            DeploymentMode::Production => "production",
            DeploymentMode::Development => "development",
        }
    }
}

/// Settings for the messaging network adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct MessagingConfig {
    /// Base URL of the messaging network's REST origin.
    pub origin: String,

    /// Request timeout for one long-poll subscribe call.
    ///
    /// The network holds a subscribe request open for up to 280 seconds when
    /// no message arrives, so this must comfortably exceed that.
    pub subscribe_timeout: Duration,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            origin: "https://ps.pndsn.com".to_string(),
            subscribe_timeout: Duration::from_secs(310),
        }
    }
}

/// Settings for the telemetry collaborator.
///
/// | Field                          | Default                                     |
/// |--------------------------------|---------------------------------------------|
/// | dsn                            | none (telemetry disabled)                   |
/// | debug                          | `true` (inverse of production)              |
/// | environment                    | `"development"`                             |
/// | traces_sample_rate             | 1.0                                         |
/// | replays_session_sample_rate    | 0.1                                         |
/// | replays_on_error_sample_rate   | 1.0                                         |
/// | trace_propagation_targets      | localhost + the production deployment       |
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryConfig {
    /// Destination identifier.  `None` disables submission entirely.
    pub dsn: Option<String>,
    /// Verbose adapter logging; always the inverse of production mode.
    pub debug: bool,
    /// Environment name attached to every event.
    pub environment: String,
    /// Fraction of performance traces captured.
    pub traces_sample_rate: f32,
    /// Fraction of sessions recorded for replay.
    pub replays_session_sample_rate: f32,
    /// Fraction of sessions with an error recorded for replay.
    pub replays_on_error_sample_rate: f32,
    /// Request targets for which trace headers are propagated.
    pub trace_propagation_targets: Vec<String>,
}

impl TelemetryConfig {
    /// Builds the fixed telemetry configuration for a deployment mode.
    pub fn for_deployment(deployment: DeploymentMode, dsn: Option<String>) -> Self {
        Self {
            dsn,
            debug: !deployment.is_production(),
            environment: deployment.environment().to_string(),
            traces_sample_rate: 1.0,
            replays_session_sample_rate: 0.1,
            replays_on_error_sample_rate: 1.0,
            trace_propagation_targets: vec![
                "localhost".to_string(),
                "https://venerable-fenglisu-8c0f2c.netlify.app".to_string(),
            ],
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self::for_deployment(DeploymentMode::default(), None)
    }
}

/// All runtime configuration for the bridge.
///
/// # Example
///
/// ```rust
/// use ffx_bridge::domain::BridgeConfig;
///
/// let cfg = BridgeConfig::default();
/// assert_eq!(cfg.app_bind_addr.port(), 7341);
/// assert!(!cfg.deployment.is_production());
/// ```
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Address the app-facing WebSocket port binds to.
    ///
    /// Defaults to loopback: the app core runs on the same host.
    pub app_bind_addr: SocketAddr,

    /// Deployment mode flag, read by the issue reporter, the link opener and
    /// the inbound pipeline.
    pub deployment: DeploymentMode,

    /// Messaging network adapter settings.
    pub messaging: MessagingConfig,

    /// Telemetry collaborator settings.
    pub telemetry: TelemetryConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            app_bind_addr: SocketAddr::from(([127, 0, 0, 1], 7341)),
            deployment: DeploymentMode::Development,
            messaging: MessagingConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
