//! ffx-bridge library crate.
//!
//! The interop bridge between the FFX app core and the two external services
//! it depends on: the PubNub real-time messaging network and the Sentry
//! error-telemetry service.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! App core (tagged JSON commands / decoded events over WebSocket)
//!         ↕
//! [ffx-bridge]
//!   ├── domain/           BridgeConfig, DeploymentMode
//!   ├── application/      Dispatcher, LinkOpener, IssueReporter,
//!   │                     SubscriptionManager, InboundPipeline, ports
//!   └── infrastructure/
//!         ├── app_port/   WebSocket accept loop (tokio-tungstenite)
//!         ├── pubnub/     Subscribe long-poll client (reqwest)
//!         ├── sentry/     Event submission (reqwest)
//!         ├── host/       Desktop URL opener
//!         └── recording/  Call-recording doubles for every port
//!         ↕
//! PubNub  ·  Sentry  ·  the desktop
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O.
//! - `application` depends on `domain`, `ffx-core` and the port traits only.
//! - `infrastructure` implements the ports with `tokio`, `reqwest` and
//!   `tokio-tungstenite`.

/// Domain layer: configuration types.
pub mod domain;

/// Application layer: command routing, subscription lifecycle, inbound pipeline.
pub mod application;

/// Infrastructure layer: adapters for the app port and the external services.
pub mod infrastructure;
