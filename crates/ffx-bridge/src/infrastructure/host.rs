//! Host environment adapter: hands URLs to the desktop's default opener.
//!
//! | Platform        | Program                                       |
//! |-----------------|-----------------------------------------------|
//! | Linux / BSD     | `xdg-open <url>`                              |
//! | macOS           | `open <url>`                                  |
//! | Windows         | `rundll32 url.dll,FileProtocolHandler <url>`  |
//!
//! The opener is spawned and not waited on.  Whether a window actually
//! appears, and whether it takes focus, is up to the desktop.

use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::application::ports::{HostEnvironment, HostError};

/// Opens URLs with the platform's default browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl HostEnvironment for SystemBrowser {
    fn open_in_new_context(&self, url: &str) -> Result<(), HostError> {
        let (program, args) = opener_command(url).ok_or(HostError::Unsupported)?;

        Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| HostError::Launch {
                program: program.to_string(),
                source,
            })?;

        debug!(program, "URL handed to opener");
        Ok(())
    }
}

#[cfg(target_os = "macos")]
fn opener_command(url: &str) -> Option<(&'static str, Vec<String>)> {
    Some(("open", vec![url.to_string()]))
}

#[cfg(target_os = "windows")]
fn opener_command(url: &str) -> Option<(&'static str, Vec<String>)> {
    Some((
        "rundll32",
        vec!["url.dll,FileProtocolHandler".to_string(), url.to_string()],
    ))
}

#[cfg(all(unix, not(target_os = "macos")))]
fn opener_command(url: &str) -> Option<(&'static str, Vec<String>)> {
    Some(("xdg-open", vec![url.to_string()]))
}

#[cfg(not(any(unix, windows)))]
fn opener_command(_url: &str) -> Option<(&'static str, Vec<String>)> {
    None
}
