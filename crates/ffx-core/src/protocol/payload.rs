//! Decoding of raw payloads received on the messaging connection.
//!
//! The bridge does not interpret the shape of inbound messages.  A payload is
//! either valid JSON, in which case it is forwarded to the app untouched, or
//! it is not, in which case it becomes a [`DecodeFailure`] that is reported
//! and dropped.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fixed prefix of the issue text reported for an undecodable payload.
pub const DECODE_FAILURE_PREFIX: &str = "Unable to parse PubNub JSON";

/// A successfully decoded inbound payload.
///
/// Serializes transparently: on the wire it is exactly the JSON value that
/// was received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecodedEvent(Value);

impl DecodedEvent {
    /// Wraps an already-parsed value.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Borrows the decoded value.
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Consumes the event and returns the decoded value.
    pub fn into_value(self) -> Value {
        self.0
    }
}

/// A payload that could not be parsed as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeFailure {
    raw: String,
    reason: String,
}

impl DecodeFailure {
    /// The payload text exactly as received.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The parser's explanation, for logs.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Issue text submitted to telemetry: the fixed prefix, a blank line, then
    /// the raw payload.
    pub fn issue_message(&self) -> String {
        format!("{DECODE_FAILURE_PREFIX}\n\n{}", self.raw)
    }
}

/// Parses a raw payload as a generic JSON value.
///
/// # Errors
///
/// Returns a [`DecodeFailure`] carrying the raw text when `raw` is not a
/// complete JSON document.
///
/// # Example
///
/// ```rust
/// use ffx_core::decode_payload;
///
/// let event = decode_payload(r#"{"a":1}"#).unwrap();
/// assert_eq!(event.value()["a"], 1);
///
/// let failure = decode_payload("not json").unwrap_err();
/// assert!(failure.issue_message().starts_with("Unable to parse PubNub JSON"));
/// ```
pub fn decode_payload(raw: &str) -> Result<DecodedEvent, DecodeFailure> {
    serde_json::from_str::<Value>(raw)
        .map(DecodedEvent)
        .map_err(|e| DecodeFailure {
            raw: raw.to_string(),
            reason: e.to_string(),
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
