//! The dispatcher: single entry point for every command from the app core.
//!
//! ```text
//! app ──► OutboundCommand ──► Dispatcher ─┬─► LinkOpener           (openExternalLink)
//!                                         ├─► IssueReporter        (reportIssue, fromElm)
//!                                         └─► SubscriptionManager  (subscriptionCreds)
//!                                                   │
//!                                                   └─ wires InboundPipeline as the
//!                                                      message handler of each connection
//! ```
//!
//! The match in [`Dispatcher::dispatch`] is exhaustive over
//! [`OutboundCommand`]; a new variant without a handler does not compile.
//!
//! Commands are handled one at a time, to completion, in the order they come
//! off the channel.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use ffx_core::{OutboundCommand, Producer};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::application::inbound::InboundPipeline;
use crate::application::issue_reporter::IssueReporter;
use crate::application::link_opener::LinkOpener;
use crate::application::ports::{AppSink, HostEnvironment, MessagingClient, Telemetry};
use crate::application::subscription::SubscriptionManager;
use crate::domain::DeploymentMode;

/// How often the run loop wakes up to check the shutdown flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(200);

/// The external collaborators the bridge is wired to.
pub struct Collaborators {
    pub messaging: Arc<dyn MessagingClient>,
    pub telemetry: Arc<dyn Telemetry>,
    pub host: Arc<dyn HostEnvironment>,
    pub app: Arc<dyn AppSink>,
}

/// Which handler a command was routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    LinkOpener,
    IssueReporter,
    SubscriptionManager,
}

/// Routes each [`OutboundCommand`] to exactly one handler.
pub struct Dispatcher {
    link_opener: LinkOpener,
    reporter: IssueReporter,
    subscriptions: SubscriptionManager,
}

impl Dispatcher {
    /// Wires the handlers together.
    ///
    /// The inbound pipeline shares the issue reporter with the dispatcher and
    /// is handed to the subscription manager as the handler for every
    /// connection it opens.
    pub fn new(deployment: DeploymentMode, collaborators: Collaborators) -> Self {
        let reporter = IssueReporter::new(deployment, collaborators.telemetry);
        let pipeline = Arc::new(InboundPipeline::new(
            deployment,
            reporter.clone(),
            collaborators.app,
        ));

        Self {
            link_opener: LinkOpener::new(deployment, collaborators.host),
            reporter,
            subscriptions: SubscriptionManager::new(collaborators.messaging, pipeline),
        }
    }

    /// Handles one command and returns where it went.
    pub fn dispatch(&mut self, command: OutboundCommand) -> Route {
        debug!("dispatching {}", command.tag());

        match command {
            OutboundCommand::OpenExternalLink { url } => {
                self.link_opener.open(&url);
                Route::LinkOpener
            }
            OutboundCommand::ReportIssue { message } => {
                self.reporter.report(&message, Producer::FromElm);
                Route::IssueReporter
            }
            OutboundCommand::SubscriptionCreds(creds) => {
                self.subscriptions.replace(&creds);
                Route::SubscriptionManager
            }
        }
    }

    /// The subscription manager, for state inspection.
    pub fn subscriptions(&self) -> &SubscriptionManager {
        &self.subscriptions
    }

    /// Consumes commands until the channel closes or `running` is cleared.
    ///
    /// On exit the active messaging connection, if any, is stopped.  The
    /// dispatcher is handed back so callers can inspect its final state.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<OutboundCommand>,
        running: Arc<AtomicBool>,
    ) -> Self {
        loop {
            if !running.load(Ordering::Relaxed) {
                info!("shutdown flag set; stopping dispatcher");
                break;
            }

            match timeout(SHUTDOWN_POLL, commands.recv()).await {
                Ok(Some(command)) => {
                    self.dispatch(command);
                }
                Ok(None) => {
                    debug!("command channel closed; stopping dispatcher");
                    break;
                }
                Err(_) => {
                    // No command in the last poll interval.
                }
            }
        }

        self.subscriptions.stop_current();
        self
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
