//! Outbound commands: everything the app core can ask the bridge to do.
//!
//! # JSON discriminant
//!
//! Every command is a JSON object with a `"tag"` field naming the variant and
//! a `"data"` field carrying its payload:
//!
//! ```json
//! {"tag":"openExternalLink","data":{"url":"https://example.com"}}
//! {"tag":"reportIssue","data":{"message":"decoder failed on /spaces"}}
//! {"tag":"subscriptionCreds","data":{"subscribeKey":"sub-c-1","accountId":"acct-9","token":"t","spaceId":"abc123"}}
//! ```
//!
//! Serde's adjacently tagged representation (`tag` + `content`) handles this
//! directly.  The variant set is closed: a frame with any other tag fails to
//! decode, and every consumer matches on the enum exhaustively, so adding a
//! variant without a handler is a compile error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::credentials::SubscriptionCreds;

/// Errors produced while decoding a command frame.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The frame is not valid JSON, has an unknown tag, or is missing fields.
    #[error("malformed command frame: {0}")]
    MalformedCommand(String),
}

/// A single command from the app core.
///
/// Commands are transient: each one lives for exactly one dispatch cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tag", content = "data", rename_all = "camelCase")]
pub enum OutboundCommand {
    /// Open a URL in a new, independent viewing context.
    OpenExternalLink {
        /// Target URL.  Not validated; that is the app's responsibility.
        url: String,
    },

    /// Forward a diagnostic message raised by the app core to telemetry.
    ReportIssue {
        /// Free-text description of the issue.
        message: String,
    },

    /// Replace the active messaging connection using fresh credentials.
    SubscriptionCreds(SubscriptionCreds),
}

impl OutboundCommand {
    /// Returns the wire tag of this command.
    ///
    /// Used in log lines instead of `Debug` so that URLs, messages and
    /// credentials never end up in the logs.
    pub fn tag(&self) -> &'static str {
        match self {
            OutboundCommand::OpenExternalLink { .. } => "openExternalLink",
            OutboundCommand::ReportIssue { .. } => "reportIssue",
            OutboundCommand::SubscriptionCreds(_) => "subscriptionCreds",
        }
    }
}

/// Decodes one command frame sent by the app core.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedCommand`] if `text` is not JSON, names a
/// tag outside the closed variant set, or lacks a required field.
///
/// # Example
///
/// ```rust
/// use ffx_core::{decode_command, OutboundCommand};
///
/// let cmd = decode_command(r#"{"tag":"reportIssue","data":{"message":"boom"}}"#).unwrap();
/// assert_eq!(cmd, OutboundCommand::ReportIssue { message: "boom".to_string() });
/// ```
pub fn decode_command(text: &str) -> Result<OutboundCommand, ProtocolError> {
    serde_json::from_str(text).map_err(|e| ProtocolError::MalformedCommand(e.to_string()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_open_external_link() {
        // Arrange: what the app core sends for a link click
        let json = r#"{"tag":"openExternalLink","data":{"url":"https://example.com/a?b=c"}}"#;

        // Act
        let cmd = decode_command(json).unwrap();

        // Assert
        assert_eq!(
            cmd,
            OutboundCommand::OpenExternalLink {
                url: "https://example.com/a?b=c".to_string()
            }
        );
    }

    #[test]
    fn test_decode_subscription_creds() {
        let json = r#"{
            "tag": "subscriptionCreds",
            "data": {
                "subscribeKey": "sub-c-1",
                "accountId": "acct-9",
                "token": "tok",
                "spaceId": "abc123"
            }
        }"#;

        let cmd = decode_command(json).unwrap();

        match cmd {
            OutboundCommand::SubscriptionCreds(creds) => {
                assert_eq!(creds.subscribe_key, "sub-c-1");
                assert_eq!(creds.account_id, "acct-9");
                assert_eq!(creds.channel().as_str(), "space.abc123");
            }
            other => panic!("expected SubscriptionCreds, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        // Arrange: a tag outside the closed variant set
        let json = r#"{"tag":"unsubscribe","data":{}}"#;

        // Act
        let result = decode_command(json);

        // Assert
        assert!(matches!(result, Err(ProtocolError::MalformedCommand(_))));
    }

    #[test]
    fn test_missing_data_is_rejected() {
        let result = decode_command(r#"{"tag":"reportIssue"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_not_json_is_rejected() {
        let result = decode_command("openExternalLink https://example.com");
        assert!(result.is_err());
    }

    #[test]
    fn test_tag_matches_wire_tag() {
        // Each variant's `tag()` must equal the tag serde writes.
        let commands = [
            OutboundCommand::OpenExternalLink { url: "u".into() },
            OutboundCommand::ReportIssue { message: "m".into() },
            OutboundCommand::SubscriptionCreds(SubscriptionCreds {
                subscribe_key: "k".into(),
                account_id: "a".into(),
                token: "t".into(),
                space_id: "s".into(),
            }),
        ];

        for cmd in commands {
            let value = serde_json::to_value(&cmd).unwrap();
            assert_eq!(value["tag"], cmd.tag());
        }
    }

    #[test]
    fn test_tag_does_not_expose_field_values() {
        let cmd = OutboundCommand::ReportIssue {
            message: "secret detail".to_string(),
        };
        assert_eq!(cmd.tag(), "reportIssue");
    }
}
