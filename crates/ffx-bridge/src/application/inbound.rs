//! Inbound message pipeline: messaging network → app core.
//!
//! Every payload delivered on the active connection goes through
//! [`InboundPipeline::handle`]:
//!
//! ```text
//! raw text ──► (dev only) console trace
//!          ──► decode_payload
//!                ├─ Ok(event)    ──► AppSink::send(event)
//!                └─ Err(failure) ──► console warning
//!                                ──► IssueReporter::report(.., Producer::FromJs)
//! ```
//!
//! Exactly one of the two branches runs per payload.  A malformed payload is
//! never forwarded to the app and has no effect on the connection.

use std::sync::Arc;

use ffx_core::{decode_payload, Producer};
use tracing::debug;

use crate::application::console::{pretty_print, ConsoleLevel};
use crate::application::issue_reporter::IssueReporter;
use crate::application::ports::{AppSink, MessageHandler};
use crate::domain::DeploymentMode;

/// What happened to one inbound payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundOutcome {
    /// Parsed and handed to the app.
    Forwarded,
    /// Not JSON; reported as an issue and dropped.
    Rejected,
}

/// Decodes payloads from the messaging network and forwards them to the app.
pub struct InboundPipeline {
    deployment: DeploymentMode,
    reporter: IssueReporter,
    app: Arc<dyn AppSink>,
}

impl InboundPipeline {
    pub fn new(deployment: DeploymentMode, reporter: IssueReporter, app: Arc<dyn AppSink>) -> Self {
        Self {
            deployment,
            reporter,
            app,
        }
    }

    /// Runs one payload through the pipeline.
    pub fn handle(&self, payload: &str) -> InboundOutcome {
        if !self.deployment.is_production() {
            pretty_print(ConsoleLevel::Info, "PubNub Event", &[payload]);
        }

        match decode_payload(payload) {
            Ok(event) => {
                self.app.send(event);
                InboundOutcome::Forwarded
            }
            Err(failure) => {
                debug!("inbound payload rejected: {}", failure.reason());
                pretty_print(ConsoleLevel::Warn, "JSON parse", &[failure.raw()]);
                self.reporter
                    .report(&failure.issue_message(), Producer::FromJs);
                InboundOutcome::Rejected
            }
        }
    }
}

impl MessageHandler for InboundPipeline {
    fn on_message(&self, payload: &str) {
        self.handle(payload);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
