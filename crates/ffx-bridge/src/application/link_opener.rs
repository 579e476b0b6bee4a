//! Opening external links on behalf of the app core.

use std::sync::Arc;

use tracing::debug;

use crate::application::console::{pretty_print, ConsoleLevel};
use crate::application::ports::HostEnvironment;
use crate::domain::DeploymentMode;

/// Asks the host environment to open URLs in a new viewing context.
pub struct LinkOpener {
    deployment: DeploymentMode,
    host: Arc<dyn HostEnvironment>,
}

impl LinkOpener {
    pub fn new(deployment: DeploymentMode, host: Arc<dyn HostEnvironment>) -> Self {
        Self { deployment, host }
    }

    /// Opens `url`, fire-and-forget.
    ///
    /// The URL is passed through unvalidated.  A failure to open (blocked by
    /// host policy, no opener installed) is logged at debug level and
    /// otherwise ignored: there is nothing the app could do about it.
    pub fn open(&self, url: &str) {
        if !self.deployment.is_production() {
            pretty_print(ConsoleLevel::Info, "Open external link", &[url]);
        }

        if let Err(e) = self.host.open_in_new_context(url) {
            debug!("external link not opened: {e}");
        }
    }
}
