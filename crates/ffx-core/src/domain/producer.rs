//! Origin tag attached to every reported issue.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Who raised an issue report.
///
/// The tag is telemetry metadata only: it tells whoever reads the report
/// whether the app core asked for it or the bridge produced it on its own
/// (for example after failing to decode an inbound payload).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Producer {
    /// Raised by the app core through a `reportIssue` command.
    FromElm,
    /// Raised by the bridge itself.
    FromJs,
}

impl Producer {
    /// Wire name of the tag, as it appears in telemetry reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Producer::FromElm => "fromElm",
            Producer::FromJs => "fromJs",
        }
    }
}

impl fmt::Display for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
