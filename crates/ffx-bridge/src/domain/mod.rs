//! Domain layer for ffx-bridge.
//!
//! Plain configuration types with no I/O.  The command and event types the
//! bridge moves around live in `ffx-core`, shared with the app side.

pub mod config;

pub use config::{BridgeConfig, DeploymentMode, MessagingConfig, TelemetryConfig};
