//! FFX interop bridge, entry point.
//!
//! This binary sits between the FFX app core and the outside world.  The app
//! connects over a local WebSocket and sends tagged commands; the bridge
//! opens links, reports issues to Sentry, and keeps exactly one PubNub
//! subscription alive, pushing every decoded message back to the app.
//!
//! # Usage
//!
//! ```text
//! ffx-bridge [OPTIONS]
//!
//! Options:
//!   --app-bind <ADDR>            App port bind address [default: 127.0.0.1]
//!   --app-port <PORT>            App port [default: 7341]
//!   --deployment <MODE>          production | development [default: development]
//!   --sentry-dsn <DSN>           Telemetry destination (disabled when absent)
//!   --pubnub-origin <URL>        Messaging REST origin [default: https://ps.pndsn.com]
//!   --subscribe-timeout <SECS>   Long-poll request timeout [default: 310]
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present.
//!
//! | Variable                 | Default                 |
//! |--------------------------|-------------------------|
//! | `FFX_APP_BIND`           | `127.0.0.1`             |
//! | `FFX_APP_PORT`           | `7341`                  |
//! | `FFX_DEPLOYMENT`         | `development`           |
//! | `SENTRY_DSN`             | unset                   |
//! | `FFX_PUBNUB_ORIGIN`      | `https://ps.pndsn.com`  |
//! | `FFX_SUBSCRIBE_TIMEOUT`  | `310`                   |

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

use ffx_bridge::application::{Collaborators, Dispatcher};
use ffx_bridge::domain::{BridgeConfig, DeploymentMode, MessagingConfig, TelemetryConfig};
use ffx_bridge::infrastructure::{
    run_server, sentry, AppEvents, PubNubClient, SystemBrowser, COMMAND_QUEUE_CAPACITY,
    EVENT_BUS_CAPACITY,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Deployment mode as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DeploymentArg {
    Production,
    Development,
}

impl From<DeploymentArg> for DeploymentMode {
    fn from(arg: DeploymentArg) -> Self {
        match arg {
            DeploymentArg::Production => DeploymentMode::Production,
            DeploymentArg::Development => DeploymentMode::Development,
        }
    }
}

/// FFX interop bridge.
///
/// Connects the FFX app core to PubNub and Sentry.
#[derive(Debug, Parser)]
#[command(
    name = "ffx-bridge",
    about = "Interop bridge between the FFX app core, PubNub and Sentry",
    version
)]
struct Cli {
    /// IP address the app port binds to.
    #[arg(long, default_value = "127.0.0.1", env = "FFX_APP_BIND")]
    app_bind: String,

    /// TCP port the app core connects to (ws://ADDR:PORT).
    #[arg(long, default_value_t = 7341, env = "FFX_APP_PORT")]
    app_port: u16,

    /// Deployment mode.  Production enables issue reporting and silences
    /// developer console traces.
    #[arg(long, value_enum, default_value_t = DeploymentArg::Development, env = "FFX_DEPLOYMENT")]
    deployment: DeploymentArg,

    /// Sentry DSN.  Telemetry is disabled when absent.
    #[arg(long, env = "SENTRY_DSN")]
    sentry_dsn: Option<String>,

    /// Base URL of the PubNub REST origin.
    #[arg(long, default_value = "https://ps.pndsn.com", env = "FFX_PUBNUB_ORIGIN")]
    pubnub_origin: String,

    /// Timeout in seconds for one subscribe long-poll request.
    #[arg(long, default_value_t = 310, env = "FFX_SUBSCRIBE_TIMEOUT")]
    subscribe_timeout: u64,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`BridgeConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--app-bind` is not an IP address or
    /// `--pubnub-origin` is not a URL.
    fn into_bridge_config(self) -> anyhow::Result<BridgeConfig> {
        let app_bind_addr: SocketAddr = format!("{}:{}", self.app_bind, self.app_port)
            .parse()
            .with_context(|| {
                format!(
                    "invalid app bind address: '{}:{}'",
                    self.app_bind, self.app_port
                )
            })?;

        Url::parse(&self.pubnub_origin)
            .with_context(|| format!("invalid PubNub origin: '{}'", self.pubnub_origin))?;

        let deployment = DeploymentMode::from(self.deployment);

        Ok(BridgeConfig {
            app_bind_addr,
            deployment,
            messaging: MessagingConfig {
                origin: self.pubnub_origin,
                subscribe_timeout: Duration::from_secs(self.subscribe_timeout),
            },
            telemetry: TelemetryConfig::for_deployment(deployment, self.sentry_dsn),
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// The bridge is single-threaded cooperative: one current-thread runtime
/// drives the app port, the dispatcher, the subscribe loop and telemetry
/// submissions.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.into_bridge_config()?;

    info!(
        "FFX bridge starting: app={}, deployment={}, pubnub={}",
        config.app_bind_addr,
        config.deployment.environment(),
        config.messaging.origin
    );

    // ── Collaborators ─────────────────────────────────────────────────────────
    let telemetry = sentry::init(&config.telemetry)?;
    let messaging =
        PubNubClient::new(&config.messaging).context("failed to set up PubNub client")?;
    let events = AppEvents::new(EVENT_BUS_CAPACITY);

    let dispatcher = Dispatcher::new(
        config.deployment,
        Collaborators {
            messaging: Arc::new(messaging),
            telemetry,
            host: Arc::new(SystemBrowser),
            app: Arc::new(events.clone()),
        },
    );

    // ── Graceful shutdown flag ─────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    // ── Dispatcher and app port ───────────────────────────────────────────────
    let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
    let dispatcher_task = tokio::spawn(dispatcher.run(command_rx, Arc::clone(&running)));

    run_server(config.app_bind_addr, command_tx, events, running).await?;

    dispatcher_task.await.context("dispatcher task failed")?;

    info!("FFX bridge stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn cli() -> Cli {
        Cli {
            app_bind: "127.0.0.1".to_string(),
            app_port: 7341,
            deployment: DeploymentArg::Development,
            sentry_dsn: None,
            pubnub_origin: "https://ps.pndsn.com".to_string(),
            subscribe_timeout: 310,
        }
    }

    #[test]
    fn test_cli_defaults_produce_correct_app_port() {
        // Arrange: parse with no arguments (all defaults apply)
        let cli = Cli::parse_from(["ffx-bridge"]);

        // Assert
        assert_eq!(cli.app_port, 7341);
    }

    #[test]
    fn test_cli_defaults_produce_loopback_bind() {
        let cli = Cli::parse_from(["ffx-bridge"]);
        assert_eq!(cli.app_bind, "127.0.0.1");
    }

    #[test]
    fn test_cli_defaults_to_development() {
        let cli = Cli::parse_from(["ffx-bridge"]);
        assert_eq!(cli.deployment, DeploymentArg::Development);
    }

    #[test]
    fn test_cli_defaults_produce_subscribe_timeout() {
        let cli = Cli::parse_from(["ffx-bridge"]);
        assert_eq!(cli.subscribe_timeout, 310);
    }

    #[test]
    fn test_cli_deployment_override() {
        let cli = Cli::parse_from(["ffx-bridge", "--deployment", "production"]);
        assert_eq!(cli.deployment, DeploymentArg::Production);
    }

    #[test]
    fn test_cli_rejects_unknown_deployment() {
        let result = Cli::try_parse_from(["ffx-bridge", "--deployment", "staging"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_app_port_override() {
        let cli = Cli::parse_from(["ffx-bridge", "--app-port", "9999"]);
        assert_eq!(cli.app_port, 9999);
    }

    #[test]
    fn test_cli_sentry_dsn_override() {
        let cli = Cli::parse_from(["ffx-bridge", "--sentry-dsn", "https://k@example.com/1"]);
        assert_eq!(cli.sentry_dsn.as_deref(), Some("https://k@example.com/1"));
    }

    #[test]
    fn test_into_bridge_config_defaults() {
        // Act
        let config = cli().into_bridge_config().unwrap();

        // Assert
        assert_eq!(config.app_bind_addr.to_string(), "127.0.0.1:7341");
        assert_eq!(config.deployment, DeploymentMode::Development);
        assert_eq!(config.messaging.subscribe_timeout, Duration::from_secs(310));
        assert!(config.telemetry.debug);
    }

    #[test]
    fn test_into_bridge_config_production_disables_telemetry_debug() {
        let mut cli = cli();
        cli.deployment = DeploymentArg::Production;

        let config = cli.into_bridge_config().unwrap();

        assert!(config.deployment.is_production());
        assert!(!config.telemetry.debug);
        assert_eq!(config.telemetry.environment, "production");
    }

    #[test]
    fn test_into_bridge_config_carries_dsn() {
        let mut cli = cli();
        cli.sentry_dsn = Some("https://k@example.com/1".to_string());

        let config = cli.into_bridge_config().unwrap();

        assert_eq!(
            config.telemetry.dsn.as_deref(),
            Some("https://k@example.com/1")
        );
    }

    #[test]
    fn test_into_bridge_config_invalid_app_bind_returns_error() {
        // Arrange: provide an invalid IP address string
        let mut cli = cli();
        cli.app_bind = "not.an.ip".to_string();

        // Act
        let result = cli.into_bridge_config();

        // Assert: must return an error, not panic
        assert!(result.is_err());
    }

    #[test]
    fn test_into_bridge_config_invalid_origin_returns_error() {
        let mut cli = cli();
        cli.pubnub_origin = "ps.pndsn.com without scheme".to_string();

        assert!(cli.into_bridge_config().is_err());
    }
}
