//! Application layer for ffx-bridge.
//!
//! The interop core: command dispatch, the subscription lifecycle and the
//! inbound decode/report pipeline.  It knows *what* to do with each command
//! and payload, and reaches the outside world only through the traits in
//! [`ports`].
//!
//! # What does NOT belong here?
//!
//! - Sockets, HTTP requests, child processes (that is infrastructure)
//! - Task spawning other than the dispatcher's own run loop
//! - Parsing CLI arguments (that happens in `main.rs`)

pub mod console;
pub mod dispatcher;
pub mod inbound;
pub mod issue_reporter;
pub mod link_opener;
pub mod ports;
pub mod subscription;

pub use dispatcher::{Collaborators, Dispatcher, Route};
pub use inbound::{InboundOutcome, InboundPipeline};
pub use issue_reporter::IssueReporter;
pub use link_opener::LinkOpener;
pub use subscription::{SubscriptionManager, SubscriptionState};
