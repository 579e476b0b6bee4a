//! Infrastructure layer for ffx-bridge.
//!
//! Everything that touches the outside world lives here: the WebSocket port
//! the app core connects to, the PubNub long-poll client, the Sentry event
//! submitter and the desktop URL opener.  Each adapter implements one of the
//! traits in [`crate::application::ports`].
//!
//! # What does NOT belong here?
//!
//! - Deciding which handler a command goes to (that is the dispatcher)
//! - Deployment-mode gating of reports and console traces
//! - Configuration parsing (that is done in `main.rs`)

pub mod app_port;
pub mod host;
pub mod pubnub;
pub mod recording;
pub mod sentry;

// Re-export the primary entry points so `main.rs` can call them concisely.
pub use app_port::{run_server, AppEvents, COMMAND_QUEUE_CAPACITY, EVENT_BUS_CAPACITY};
pub use host::SystemBrowser;
pub use pubnub::PubNubClient;
