//! Developer console diagnostics.
//!
//! Grouped, human-oriented traces for whoever is watching the bridge while
//! developing the app: raw inbound payloads, JSON parse failures, link-open
//! attempts.  Everything goes through `tracing` under a dedicated target, so
//! `RUST_LOG=ffx_event_listener=off` silences it without touching the rest.
//!
//! A group is one title line followed by one line per message, all at the
//! group's level:
//!
//! ```text
//! WARN ffx_event_listener: [ffx-event-listener] JSON parse ⥤
//! WARN ffx_event_listener: [ffx-event-listener] JSON parse ⥤ not json
//! ```

use tracing::{error, info, warn};

/// Name prefixed to every console group title.
const CONSOLE_GROUP: &str = "ffx-event-listener";

/// Severity of a console group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Info,
    Warn,
    Error,
}

/// Emits one console group: the title, then each message, at `level`.
///
/// The title is emitted even when `messages` is empty.
pub fn pretty_print(level: ConsoleLevel, title: &str, messages: &[&str]) {
    emit(level, &format!("[{CONSOLE_GROUP}] {title} ⥤"));
    for message in messages {
        emit(level, &format!("[{CONSOLE_GROUP}] {title} ⥤ {message}"));
    }
}

fn emit(level: ConsoleLevel, line: &str) {
    match level {
        ConsoleLevel::Info => info!(target: "ffx_event_listener", "{line}"),
        ConsoleLevel::Warn => warn!(target: "ffx_event_listener", "{line}"),
        ConsoleLevel::Error => error!(target: "ffx_event_listener", "{line}"),
    }
}
