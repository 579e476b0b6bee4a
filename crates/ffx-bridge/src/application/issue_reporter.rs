//! Issue reporting to the telemetry collaborator.
//!
//! Both the app core (`reportIssue` commands) and the bridge itself (payload
//! decode failures) report issues through [`IssueReporter`].  Each report is
//! tagged with its [`Producer`] so the two sources can be told apart.

use std::sync::Arc;

use ffx_core::Producer;
use serde_json::json;
use tracing::debug;

use crate::application::ports::{Telemetry, TelemetryScope};
use crate::domain::DeploymentMode;

/// Tag key carrying the producer on every report.
pub const PRODUCER_TAG: &str = "producer";

/// Forwards diagnostic messages to telemetry, in production only.
///
/// Cheap to clone: the telemetry handle is shared.
#[derive(Clone)]
pub struct IssueReporter {
    deployment: DeploymentMode,
    telemetry: Arc<dyn Telemetry>,
}

impl IssueReporter {
    pub fn new(deployment: DeploymentMode, telemetry: Arc<dyn Telemetry>) -> Self {
        Self {
            deployment,
            telemetry,
        }
    }

    /// Reports `message` on behalf of `producer`.
    ///
    /// In production this opens a scope, tags it with the producer, attaches
    /// `{ "message": message }` as a context named after the producer and
    /// captures a single message.  Outside production it does nothing.
    ///
    /// Never fails and never blocks the caller.
    pub fn report(&self, message: &str, producer: Producer) {
        if !self.deployment.is_production() {
            debug!(producer = %producer, "issue not submitted outside production");
            return;
        }

        let mut scope = TelemetryScope::new();
        scope.set_tag(PRODUCER_TAG, producer.as_str());
        scope.set_context(producer.as_str(), json!({ "message": message }));

        self.telemetry.capture_message(&scope, message);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
